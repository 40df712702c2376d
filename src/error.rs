//! Error types for lecnav.

use thiserror::Error;

/// Library-level error type for lecnav operations.
#[derive(Error, Debug)]
pub enum LecnavError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Caption parse error at line {line}: {message}")]
    CaptionParse { line: usize, message: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl LecnavError {
    /// Whether this error was caused by bad caller input rather than a failing collaborator.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LecnavError::InvalidInput(_) | LecnavError::CaptionParse { .. }
        )
    }
}

/// Result type alias for lecnav operations.
pub type Result<T> = std::result::Result<T, LecnavError>;
