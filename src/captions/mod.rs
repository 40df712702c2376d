//! Caption loading: turns subtitle files into ordered timed units.
//!
//! Supports SRT, WebVTT and a JSON array of `{start, end, text}` objects.

mod cue;
mod source_id;

pub use cue::{parse_cues, parse_timestamp};
pub use source_id::source_id_from_input;

use crate::error::{LecnavError, Result};
use crate::segment::{TextCleaner, TimedUnit};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Supported caption formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    Srt,
    Vtt,
    Json,
}

impl std::str::FromStr for CaptionFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(CaptionFormat::Srt),
            "vtt" | "webvtt" => Ok(CaptionFormat::Vtt),
            "json" => Ok(CaptionFormat::Json),
            _ => Err(format!("Unknown caption format: {}. Use srt, vtt, or json.", s)),
        }
    }
}

impl CaptionFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Guess the format from the document itself.
    pub fn sniff(content: &str) -> Self {
        let head = content.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            CaptionFormat::Vtt
        } else if head.starts_with('[') {
            CaptionFormat::Json
        } else {
            CaptionFormat::Srt
        }
    }
}

/// Parse caption content into timed units ordered by start time.
///
/// Text is cleaned with `cleaner`; units left empty are skipped.
pub fn parse_captions(
    content: &str,
    format: CaptionFormat,
    cleaner: &TextCleaner,
) -> Result<Vec<TimedUnit>> {
    let mut units = match format {
        CaptionFormat::Srt | CaptionFormat::Vtt => parse_cues(content, cleaner)?,
        CaptionFormat::Json => parse_json(content, cleaner)?,
    };

    // Caption files are nearly always ordered already; the sort is stable.
    units.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(units)
}

/// Read and parse a caption file, detecting the format from its extension or content.
#[instrument(skip(cleaner), fields(path = %path.display()))]
pub fn load_captions(path: &Path, cleaner: &TextCleaner) -> Result<Vec<TimedUnit>> {
    let content = std::fs::read_to_string(path)?;
    let format = CaptionFormat::from_path(path).unwrap_or_else(|| CaptionFormat::sniff(&content));

    let units = parse_captions(&content, format, cleaner)?;
    debug!("Loaded {} caption units ({:?})", units.len(), format);
    Ok(units)
}

fn parse_json(content: &str, cleaner: &TextCleaner) -> Result<Vec<TimedUnit>> {
    let raw: Vec<TimedUnit> = serde_json::from_str(content)?;
    let mut units = Vec::with_capacity(raw.len());

    for (idx, unit) in raw.into_iter().enumerate() {
        if !(unit.start >= 0.0 && unit.end >= unit.start) {
            return Err(LecnavError::InvalidInput(format!(
                "caption unit {} has invalid times ({}, {})",
                idx, unit.start, unit.end
            )));
        }
        let text = cleaner.clean(&unit.text);
        if !text.is_empty() {
            units.push(TimedUnit::new(unit.start, unit.end, text));
        }
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_format() {
        assert_eq!("srt".parse::<CaptionFormat>().unwrap(), CaptionFormat::Srt);
        assert_eq!("WebVTT".parse::<CaptionFormat>().unwrap(), CaptionFormat::Vtt);
        assert_eq!("json".parse::<CaptionFormat>().unwrap(), CaptionFormat::Json);
        assert!("txt".parse::<CaptionFormat>().is_err());
    }

    #[test]
    fn test_sniff() {
        assert_eq!(CaptionFormat::sniff("WEBVTT\n\n"), CaptionFormat::Vtt);
        assert_eq!(CaptionFormat::sniff("  [{\"start\":0}]"), CaptionFormat::Json);
        assert_eq!(CaptionFormat::sniff("1\n00:00:00,000 --> 00:00:01,000"), CaptionFormat::Srt);
    }

    #[test]
    fn test_parse_json_units() {
        let json = r#"[
            {"start": 5.0, "end": 8.0, "text": "second  um part"},
            {"start": 0.0, "end": 5.0, "text": "first part"},
            {"start": 8.0, "end": 9.0, "text": "uh"}
        ]"#;
        let units = parse_captions(json, CaptionFormat::Json, &TextCleaner::default()).unwrap();

        assert_eq!(
            units,
            vec![
                TimedUnit::new(0.0, 5.0, "first part"),
                TimedUnit::new(5.0, 8.0, "second part"),
            ]
        );
    }

    #[test]
    fn test_parse_json_rejects_inverted_times() {
        let json = r#"[{"start": 5.0, "end": 1.0, "text": "bad"}]"#;
        let err = parse_captions(json, CaptionFormat::Json, &TextCleaner::default()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_load_captions_detects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.vtt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "WEBVTT\n\n00:00:00.000 --> 00:00:05.000\nHello world\n").unwrap();

        let units = load_captions(&path, &TextCleaner::default()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].start, 0.0);
    }

    #[test]
    fn test_load_captions_sniffs_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.txt");
        std::fs::write(&path, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();

        let units = load_captions(&path, &TextCleaner::default()).unwrap();
        assert_eq!(units, vec![TimedUnit::new(1.0, 2.0, "Hi")]);
    }
}
