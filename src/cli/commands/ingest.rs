//! Ingest command implementation.

use crate::cli::{Output, WindowArgs};
use crate::config::Settings;
use crate::ingest::{IngestOptions, Ingestor};
use crate::openai::require_api_key;
use anyhow::Result;
use std::path::Path;

impl From<WindowArgs> for IngestOptions {
    fn from(args: WindowArgs) -> Self {
        Self {
            preset: args.preset,
            window: args.window,
            overlap: args.overlap,
        }
    }
}

/// Run the ingest command.
pub async fn run_ingest(
    file: &str,
    source_id: Option<&str>,
    title: Option<&str>,
    window: WindowArgs,
    settings: Settings,
) -> Result<()> {
    require_api_key()?;
    let ingestor = Ingestor::new(settings)?;
    let options = IngestOptions::from(window);

    let spinner = Output::spinner(&format!("Ingesting {}...", file));
    let result = ingestor
        .ingest_file(Path::new(file), source_id, title, &options)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(result) if result.chunks_indexed == 0 => {
            Output::warning(&format!(
                "No chunks produced from {}; the index for '{}' was left unchanged.",
                file, result.source_id
            ));
        }
        Ok(result) => {
            Output::success(&format!(
                "Indexed {} chunks for '{}' ({})",
                result.chunks_indexed, result.title, result.source_id
            ));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
