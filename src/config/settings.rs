//! Configuration settings for lecnav.

use crate::error::{LecnavError, Result};
use crate::retrieval::RetrievalConfig;
use crate::segment::{SegmentConfig, SegmentPreset, TextCleaner, DEFAULT_FILLER_WORDS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub segmentation: SegmentationSettings,
    pub retrieval: RetrievalSettings,
    pub vector_store: VectorStoreSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no `-v` flag or `RUST_LOG` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.lecnav".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Window size and overlap for one segmentation preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    /// Window duration in seconds.
    pub window_seconds: f64,
    /// Overlap between consecutive windows in seconds.
    pub overlap_seconds: f64,
}

/// Transcript segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Windows used when ingesting a source.
    pub ingest: WindowSettings,
    /// Windows used for raw chunking.
    pub raw: WindowSettings,
    /// Filler tokens removed from caption text.
    pub filler_words: Vec<String>,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            ingest: WindowSettings {
                window_seconds: 30.0,
                overlap_seconds: 15.0,
            },
            raw: WindowSettings {
                window_seconds: 45.0,
                overlap_seconds: 15.0,
            },
            filler_words: DEFAULT_FILLER_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl SegmentationSettings {
    /// Window settings for a preset.
    pub fn preset(&self, preset: SegmentPreset) -> WindowSettings {
        match preset {
            SegmentPreset::Ingest => self.ingest,
            SegmentPreset::Raw => self.raw,
        }
    }

    /// Text cleaner using the configured filler words.
    pub fn cleaner(&self) -> TextCleaner {
        TextCleaner::new(&self.filler_words)
    }

    /// Build a validated segment config for a preset, with optional per-call overrides.
    pub fn segment_config(
        &self,
        preset: SegmentPreset,
        window: Option<f64>,
        overlap: Option<f64>,
    ) -> Result<SegmentConfig> {
        let defaults = self.preset(preset);
        let config = SegmentConfig::new(
            window.unwrap_or(defaults.window_seconds),
            overlap.unwrap_or(defaults.overlap_seconds),
        )?;
        Ok(config.with_cleaner(self.cleaner()))
    }
}

/// Hybrid retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of results returned when a request does not specify `k`.
    pub default_k: usize,
    /// Top similarity score below which the lexical fallback runs.
    pub confidence_threshold: f32,
    /// Vector candidates requested per wanted result.
    pub overfetch_factor: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            default_k: 3,
            confidence_threshold: defaults.confidence_threshold,
            overfetch_factor: defaults.overfetch_factor,
        }
    }
}

impl RetrievalSettings {
    /// Convert to the retriever's runtime config.
    pub fn to_config(&self) -> Result<RetrievalConfig> {
        if self.overfetch_factor == 0 {
            return Err(LecnavError::Config(
                "retrieval.overfetch_factor must be at least 1".to_string(),
            ));
        }
        if !self.confidence_threshold.is_finite() {
            return Err(LecnavError::Config(
                "retrieval.confidence_threshold must be a finite number".to_string(),
            ));
        }
        Ok(RetrievalConfig {
            confidence_threshold: self.confidence_threshold,
            overfetch_factor: self.overfetch_factor,
        })
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.lecnav/chunks.db".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allow_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LecnavError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lecnav")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets() {
        let settings = Settings::default();
        let ingest = settings.segmentation.preset(SegmentPreset::Ingest);
        let raw = settings.segmentation.preset(SegmentPreset::Raw);

        assert_eq!((ingest.window_seconds, ingest.overlap_seconds), (30.0, 15.0));
        assert_eq!((raw.window_seconds, raw.overlap_seconds), (45.0, 15.0));
        assert_eq!(settings.retrieval.confidence_threshold, 0.2);
        assert_eq!(settings.retrieval.overfetch_factor, 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [segmentation.raw]
            window_seconds = 60.0
            overlap_seconds = 20.0

            [retrieval]
            confidence_threshold = 0.35
            "#,
        )
        .unwrap();

        assert_eq!(settings.segmentation.raw.window_seconds, 60.0);
        assert_eq!(settings.segmentation.ingest.window_seconds, 30.0);
        assert_eq!(settings.retrieval.confidence_threshold, 0.35);
        assert_eq!(settings.retrieval.overfetch_factor, 4);
        assert_eq!(settings.retrieval.default_k, 3);
        assert_eq!(settings.vector_store.provider, "sqlite");
    }

    #[test]
    fn test_segment_config_overrides_and_validation() {
        let seg = SegmentationSettings::default();

        let config = seg.segment_config(SegmentPreset::Raw, None, Some(5.0)).unwrap();
        assert_eq!(config.window(), 45.0);
        assert_eq!(config.overlap(), 5.0);

        assert!(seg.segment_config(SegmentPreset::Ingest, Some(10.0), None).is_err());
    }

    #[test]
    fn test_retrieval_config_validation() {
        let mut retrieval = RetrievalSettings::default();
        assert!(retrieval.to_config().is_ok());

        retrieval.overfetch_factor = 0;
        assert!(retrieval.to_config().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.retrieval.default_k = 7;
        settings.segmentation.filler_words = vec!["like".to_string()];
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.default_k, 7);
        assert_eq!(loaded.segmentation.filler_words, vec!["like"]);
    }
}
