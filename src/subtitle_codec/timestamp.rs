/*!
 * Timestamp conversion shared by the text formats.
 *
 * All formats store milliseconds internally. Clock strings are
 * `[HH:]MM:SS[.,]fff`, LRC uses `mm:ss.xx` centiseconds.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @const: Clock time with optional hours and fraction
static CLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(\d{1,3}):)?(\d{1,2}):(\d{1,2})(?:[.,](\d{1,3}))?\s*$")
        .expect("clock regex is valid")
});

// @const: LRC minute:second time with optional fraction
static LRC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+):(\d{1,2})(?:[.,](\d{1,3}))?\s*$").expect("lrc regex is valid")
});

/// Pattern fragment matching one clock time, for embedding in format regexes
pub const CLOCK_PATTERN: &str = r"(?:\d{1,3}:)?\d{1,2}:\d{1,2}(?:[.,]\d{1,3})?";

/// Pattern fragment for a clock time with mandatory hours
pub const FULL_CLOCK_PATTERN: &str = r"\d{1,3}:\d{1,2}:\d{1,2}(?:[.,]\d{1,3})?";

fn fraction_to_ms(fraction: Option<&str>) -> u64 {
    match fraction {
        Some(digits) => {
            let value: u64 = digits.parse().unwrap_or(0);
            match digits.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
        None => 0,
    }
}

fn group_number(caps: &regex::Captures<'_>, index: usize) -> u64 {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse `[HH:]MM:SS[.,]fff` into milliseconds
pub fn parse_clock(value: &str) -> Result<u64, SubtitleError> {
    let caps = CLOCK_REGEX
        .captures(value)
        .ok_or_else(|| SubtitleError::InvalidTimestamp(value.to_string()))?;

    let hours = group_number(&caps, 1);
    let minutes = group_number(&caps, 2);
    let seconds = group_number(&caps, 3);
    let fraction = fraction_to_ms(caps.get(4).map(|m| m.as_str()));

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + fraction)
}

/// Format milliseconds as `HH:MM:SS<sep>mmm`
pub fn format_clock(ms: u64, separator: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, seconds, separator, millis
    )
}

/// Parse LRC `mm:ss.xx` into milliseconds
pub fn parse_lrc(value: &str) -> Result<u64, SubtitleError> {
    let caps = LRC_REGEX
        .captures(value)
        .ok_or_else(|| SubtitleError::InvalidTimestamp(value.to_string()))?;

    let minutes = group_number(&caps, 1);
    let seconds = group_number(&caps, 2);
    let fraction = fraction_to_ms(caps.get(3).map(|m| m.as_str()));

    Ok((minutes * 60 + seconds) * 1000 + fraction)
}

/// Format milliseconds as LRC `mm:ss.xx`
///
/// Minutes wrap at 100 and sub-centisecond precision is dropped.
pub fn format_lrc(ms: u64) -> String {
    let minutes = (ms / 60_000) % 100;
    let seconds = (ms / 1000) % 60;
    let centis = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}
