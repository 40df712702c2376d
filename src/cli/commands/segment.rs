//! Segment command: print chunks without embedding or indexing.

use crate::captions::load_captions;
use crate::cli::WindowArgs;
use crate::config::Settings;
use crate::segment::segment;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the segment command.
pub fn run_segment(file: &str, window: WindowArgs, settings: &Settings) -> Result<()> {
    let config = settings
        .segmentation
        .segment_config(window.preset, window.window, window.overlap)?;

    let units = load_captions(Path::new(file), config.cleaner())
        .with_context(|| format!("Failed to load captions from {}", file))?;
    let chunks = segment(&units, &config);

    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}
