//! Windowed transcript segmentation.
//!
//! Turns an ordered stream of time-stamped caption units into overlapping,
//! fixed-duration chunks that serve as the atomic retrieval unit.

mod clean;

pub use clean::{TextCleaner, DEFAULT_FILLER_WORDS};

use crate::error::{LecnavError, Result};
use serde::{Deserialize, Serialize};

/// Smallest distance, in seconds, between the starts of two consecutive windows.
pub const MIN_STEP_SECONDS: f64 = 1.0;

/// A single time-stamped piece of caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedUnit {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Caption text.
    pub text: String,
}

impl TimedUnit {
    /// Create a new timed unit.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration of this unit in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A contiguous, time-bounded span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Start of the first contributing unit, in seconds.
    pub start: f64,
    /// End of the last contributing unit, in seconds.
    pub end: f64,
    /// Cleaned, space-joined text of all contributing units.
    pub text: String,
    /// Free-form annotations attached at ingestion time.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Chunk {
    /// Create a chunk with empty metadata.
    pub fn new(start: f64, end: f64, text: String) -> Self {
        Self {
            start,
            end,
            text,
            metadata: serde_json::Map::new(),
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Format the start time for display (MM:SS or HH:MM:SS).
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start)
    }
}

/// Named window presets used by the two call sites of the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SegmentPreset {
    /// Preset used when ingesting a source (30s windows, 15s overlap).
    #[default]
    Ingest,
    /// Preset used for raw chunking (45s windows, 15s overlap).
    Raw,
}

impl std::str::FromStr for SegmentPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingest" => Ok(SegmentPreset::Ingest),
            "raw" => Ok(SegmentPreset::Raw),
            _ => Err(format!("Unknown segment preset: {}", s)),
        }
    }
}

impl std::fmt::Display for SegmentPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentPreset::Ingest => write!(f, "ingest"),
            SegmentPreset::Raw => write!(f, "raw"),
        }
    }
}

/// Validated segmentation parameters.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    window: f64,
    overlap: f64,
    cleaner: TextCleaner,
}

impl SegmentConfig {
    /// Create a config, rejecting a non-positive window or an overlap outside `[0, window)`.
    pub fn new(window: f64, overlap: f64) -> Result<Self> {
        if !window.is_finite() || window <= 0.0 {
            return Err(LecnavError::InvalidInput(format!(
                "window must be a positive number of seconds, got {}",
                window
            )));
        }
        if !overlap.is_finite() || overlap < 0.0 || overlap >= window {
            return Err(LecnavError::InvalidInput(format!(
                "overlap must satisfy 0 <= overlap < window ({}), got {}",
                window, overlap
            )));
        }

        Ok(Self {
            window,
            overlap,
            cleaner: TextCleaner::default(),
        })
    }

    /// Replace the text cleaner (e.g. to use a custom filler stoplist).
    pub fn with_cleaner(mut self, cleaner: TextCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Window duration in seconds.
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Overlap between consecutive windows in seconds.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Distance between the starts of consecutive windows.
    pub fn step(&self) -> f64 {
        (self.window - self.overlap).max(MIN_STEP_SECONDS)
    }

    /// The cleaner applied to chunk text.
    pub fn cleaner(&self) -> &TextCleaner {
        &self.cleaner
    }
}

/// Split an ordered sequence of units into overlapping windows.
///
/// Each window starts at the cursor unit and admits following units while they end
/// within `window` seconds of that start; the first unit is always admitted. Windows
/// whose cleaned text is empty are dropped.
///
/// The cursor then moves to the first unit starting at least `step` seconds after
/// the window start, but never beyond the first unit the window could not admit and
/// never by less than one unit, so it strictly increases and every unit is covered.
pub fn segment(units: &[TimedUnit], config: &SegmentConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let n = units.len();
    let step = config.step();

    let mut i = 0;
    while i < n {
        let start = units[i].start;
        let mut end = units[i].end;

        let mut j = i + 1;
        while j < n && units[j].end - start <= config.window {
            end = units[j].end;
            j += 1;
        }

        let joined = units[i..j]
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = config.cleaner.clean(&joined);
        if !text.is_empty() {
            chunks.push(Chunk::new(start, end, text));
        }

        let advance_to = start + step;
        let mut k = i;
        while k < n && units[k].start < advance_to {
            k += 1;
        }
        i = k.min(j).max(i + 1);
    }

    chunks
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window: f64, overlap: f64) -> SegmentConfig {
        SegmentConfig::new(window, overlap).unwrap()
    }

    /// Deterministic pseudo-random unit stream (no external RNG needed).
    fn synthetic_units(seed: u64, count: usize) -> Vec<TimedUnit> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as f64 / (1u64 << 31) as f64
        };

        let mut start = 0.0;
        (0..count)
            .map(|idx| {
                start += (next() * 12.0).floor();
                let end = start + (next() * 70.0).floor();
                TimedUnit::new(start, end, format!("w{}", idx))
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(segment(&[], &config(30.0, 15.0)).is_empty());
    }

    #[test]
    fn test_reference_example() {
        let units = vec![
            TimedUnit::new(0.0, 20.0, "a"),
            TimedUnit::new(15.0, 40.0, "b"),
            TimedUnit::new(40.0, 60.0, "c"),
        ];

        let chunks = segment(&units, &config(30.0, 15.0));

        // Unit "b" ends 40s after the window start, so the first window holds only "a".
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 20.0);
        assert_eq!(chunks[0].text, "a");

        // The cursor moves to unit 1 (first start >= 15s).
        assert_eq!(chunks[1].start, 15.0);
        assert_eq!(chunks[1].end, 40.0);
        assert_eq!(chunks[1].text, "b");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text, "c");
    }

    #[test]
    fn test_overlapping_windows() {
        let units: Vec<TimedUnit> = (0..6)
            .map(|i| TimedUnit::new(i as f64 * 10.0, (i + 1) as f64 * 10.0, format!("s{}", i)))
            .collect();

        let chunks = segment(&units, &config(30.0, 15.0));

        assert_eq!(chunks[0].text, "s0 s1 s2");
        assert_eq!((chunks[0].start, chunks[0].end), (0.0, 30.0));
        // Next window starts at the first unit with start >= 15s.
        assert_eq!(chunks[1].text, "s2 s3 s4");
        assert_eq!((chunks[1].start, chunks[1].end), (20.0, 50.0));
        assert_eq!(chunks[2].text, "s4 s5");
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_single_long_unit_produces_one_chunk() {
        let units = vec![TimedUnit::new(5.0, 500.0, "a very long caption")];
        let chunks = segment(&units, &config(30.0, 15.0));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 5.0);
        assert_eq!(chunks[0].end, 500.0);
    }

    #[test]
    fn test_unit_outside_window_starts_next_chunk() {
        let units = vec![
            TimedUnit::new(0.0, 5.0, "a"),
            TimedUnit::new(2.0, 8.0, "b"),
            TimedUnit::new(4.0, 100.0, "c"),
        ];
        let chunks = segment(&units, &config(30.0, 15.0));

        let spans: Vec<(f64, f64, &str)> = chunks
            .iter()
            .map(|c| (c.start, c.end, c.text.as_str()))
            .collect();
        assert_eq!(spans, vec![(0.0, 8.0, "a b"), (4.0, 100.0, "c")]);
    }

    #[test]
    fn test_filler_only_windows_are_dropped() {
        let units = vec![
            TimedUnit::new(0.0, 40.0, "um uh"),
            TimedUnit::new(40.0, 80.0, "  "),
            TimedUnit::new(80.0, 90.0, "real  content um here"),
        ];
        let chunks = segment(&units, &config(30.0, 15.0));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "real content here");
        assert_eq!(chunks[0].start, 80.0);
    }

    #[test]
    fn test_custom_cleaner_applies() {
        let units = vec![TimedUnit::new(0.0, 5.0, "so like yeah")];
        let cfg = config(30.0, 15.0).with_cleaner(TextCleaner::new(&["like"]));
        assert_eq!(segment(&units, &cfg)[0].text, "so yeah");
    }

    #[test]
    fn test_identical_timestamps_terminate() {
        let units: Vec<TimedUnit> = (0..1000).map(|_| TimedUnit::new(7.0, 7.0, "x")).collect();
        let chunks = segment(&units, &config(30.0, 15.0));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.split(' ').count(), 1000);
    }

    #[test]
    fn test_overlap_close_to_window_terminates() {
        let units = synthetic_units(7, 300);
        let cfg = config(30.0, 29.999);
        assert_eq!(cfg.step(), MIN_STEP_SECONDS);

        let chunks = segment(&units, &cfg);
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= units.len());
    }

    #[test]
    fn test_every_unit_is_covered() {
        for seed in 1..20 {
            let units = synthetic_units(seed, 200);
            for (window, overlap) in [(30.0, 15.0), (45.0, 15.0), (10.0, 0.0), (5.0, 4.5)] {
                let chunks = segment(&units, &config(window, overlap));
                for unit in &units {
                    let covered = chunks.iter().any(|c| {
                        c.start <= unit.start && c.text.split(' ').any(|w| w == unit.text)
                    });
                    assert!(covered, "unit {:?} not covered (seed {})", unit, seed);
                }
            }
        }
    }

    #[test]
    fn test_chunk_starts_are_monotonic() {
        for seed in 1..20 {
            let units = synthetic_units(seed, 150);
            let chunks = segment(&units, &config(30.0, 15.0));
            assert!(chunks.windows(2).all(|w| w[0].start <= w[1].start));
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SegmentConfig::new(0.0, 0.0).is_err());
        assert!(SegmentConfig::new(-5.0, 0.0).is_err());
        assert!(SegmentConfig::new(30.0, 30.0).is_err());
        assert!(SegmentConfig::new(30.0, -1.0).is_err());
        assert!(SegmentConfig::new(f64::NAN, 1.0).is_err());
        assert!(SegmentConfig::new(30.0, 0.0).is_ok());
        assert_eq!(config(45.0, 15.0).step(), 30.0);
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!("ingest".parse::<SegmentPreset>().unwrap(), SegmentPreset::Ingest);
        assert_eq!("RAW".parse::<SegmentPreset>().unwrap(), SegmentPreset::Raw);
        assert!("other".parse::<SegmentPreset>().is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(125.0), "02:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }
}
