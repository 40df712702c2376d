//! SRT and WebVTT cue parsing.

use crate::error::{LecnavError, Result};
use crate::segment::{TextCleaner, TimedUnit};
use regex::Regex;
use std::sync::OnceLock;

fn timing_regex() -> &'static Regex {
    static TIMING: OnceLock<Regex> = OnceLock::new();
    TIMING.get_or_init(|| {
        Regex::new(
            r"^\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{1,3})\s*-->\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{1,3})",
        )
        .expect("Invalid cue timing regex")
    })
}

fn markup_regex() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| {
        Regex::new(r"<[^>]*>").expect("Invalid markup regex")
    })
}

/// Parse the cues of an SRT or WebVTT document.
///
/// Blocks are separated by blank lines. A block contributes a unit when it holds a
/// `start --> end` timing line; text lines after it are joined and cleaned. Blocks
/// without a timing line (the `WEBVTT` header, `NOTE`, `STYLE`) are skipped.
pub fn parse_cues(content: &str, cleaner: &TextCleaner) -> Result<Vec<TimedUnit>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut units = Vec::new();

    let mut block: Vec<(usize, &str)> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if let Some(unit) = parse_block(&block, cleaner)? {
                units.push(unit);
            }
            block.clear();
        } else {
            block.push((idx + 1, line));
        }
    }
    if let Some(unit) = parse_block(&block, cleaner)? {
        units.push(unit);
    }

    Ok(units)
}

fn parse_block(block: &[(usize, &str)], cleaner: &TextCleaner) -> Result<Option<TimedUnit>> {
    let Some(pos) = block.iter().position(|(_, line)| line.contains("-->")) else {
        return Ok(None);
    };

    let (line_no, timing_line) = block[pos];
    let caps = timing_regex()
        .captures(timing_line)
        .ok_or_else(|| LecnavError::CaptionParse {
            line: line_no,
            message: format!("malformed cue timing '{}'", timing_line.trim()),
        })?;

    let start = parse_timestamp(&caps[1], line_no)?;
    let end = parse_timestamp(&caps[2], line_no)?;
    if end < start {
        return Err(LecnavError::CaptionParse {
            line: line_no,
            message: format!("cue ends ({}) before it starts ({})", end, start),
        });
    }

    let raw = block[pos + 1..]
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join(" ");
    let text = cleaner.clean(&markup_regex().replace_all(&raw, ""));

    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(TimedUnit::new(start, end, text)))
}

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds.
pub fn parse_timestamp(value: &str, line: usize) -> Result<f64> {
    let invalid = || LecnavError::CaptionParse {
        line,
        message: format!("invalid timestamp '{}'", value),
    };

    let normalized = value.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let hours: u64 = hours.parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .ok_or_else(invalid)?;
    Ok(whole as f64 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srt() {
        let srt = "1\n00:00:00,000 --> 00:00:03,000\nHello world\n\n2\n00:00:02,500 --> 00:00:05,000\nSecond line\n";
        let units = parse_cues(srt, &TextCleaner::default()).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0], TimedUnit::new(0.0, 3.0, "Hello world"));
        assert_eq!(units[1].start, 2.5);
        assert_eq!(units[1].text, "Second line");
    }

    #[test]
    fn test_parse_vtt_with_header_and_settings() {
        let vtt = "WEBVTT\n\nNOTE a comment\n\nintro\n00:00.000 --> 00:05.000 align:start\n<v Speaker>Hello</v> <c>world</c>\n\n00:00:04.000 --> 00:00:09.000\nSecond\nline um\n";
        let units = parse_cues(vtt, &TextCleaner::default()).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0], TimedUnit::new(0.0, 5.0, "Hello world"));
        assert_eq!(units[1], TimedUnit::new(4.0, 9.0, "Second line"));
    }

    #[test]
    fn test_crlf_and_bom() {
        let srt = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n";
        let units = parse_cues(srt, &TextCleaner::default()).unwrap();
        assert_eq!(units, vec![TimedUnit::new(1.0, 2.0, "Hi")]);
    }

    #[test]
    fn test_skips_empty_cues() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nuh\n\n2\n00:00:03,000 --> 00:00:04,000\nkept\n";
        let units = parse_cues(srt, &TextCleaner::default()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "kept");
    }

    #[test]
    fn test_malformed_timing_reports_line() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\nbogus --> 00:00:04,000\nbad\n";
        match parse_cues(srt, &TextCleaner::default()) {
            Err(LecnavError::CaptionParse { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected caption parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let srt = "1\n00:00:05,000 --> 00:00:02,000\nbackwards\n";
        assert!(parse_cues(srt, &TextCleaner::default()).is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:00,000", 1).unwrap(), 0.0);
        assert_eq!(parse_timestamp("00:01:01.500", 1).unwrap(), 61.5);
        assert_eq!(parse_timestamp("01:01:01,250", 1).unwrap(), 3661.25);
        assert_eq!(parse_timestamp("02:05.000", 1).unwrap(), 125.0);
        assert!(parse_timestamp("1:2:3:4", 1).is_err());
        assert!(parse_timestamp("00:75:00.000", 1).is_err());
    }

    #[test]
    fn test_huge_hours_are_rejected() {
        assert!(parse_timestamp("18446744073709551615:00:00,000", 3).is_err());
        assert!(parse_timestamp("99999999999999999999:00:00,000", 3).is_err());

        let srt = "1\n18446744073709551615:00:00,000 --> 18446744073709551615:00:01,000\nhello\n";
        match parse_cues(srt, &TextCleaner::default()) {
            Err(LecnavError::CaptionParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected caption parse error, got {:?}", other),
        }
    }
}
