//! Derive stable source identifiers from URLs and file paths.

use crate::error::{LecnavError, Result};
use std::path::Path;
use url::Url;

/// Derive the source identifier for an input.
///
/// URLs use their `v` query parameter (YouTube style) or else their last non-empty
/// path segment. File paths use the file stem. Anything else is used as-is.
pub fn source_id_from_input(input: &str) -> Result<String> {
    let input = input.trim();

    let id = match Url::parse(input) {
        Ok(url) if url.has_host() => id_from_url(&url).unwrap_or_else(|| input.to_string()),
        _ => Path::new(input)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| input.to_string()),
    };

    if id.is_empty() {
        return Err(LecnavError::InvalidInput(
            "Could not derive a source id from empty input".to_string(),
        ));
    }

    Ok(id)
}

fn id_from_url(url: &Url) -> Option<String> {
    if let Some((_, v)) = url.query_pairs().find(|(key, _)| key == "v") {
        if !v.is_empty() {
            return Some(v.into_owned());
        }
    }

    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}
