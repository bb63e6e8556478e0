/*!
 * LRC lyrics: one `[mm:ss.xx]text` line per segment.
 *
 * The format carries only start times at centisecond granularity, so a
 * segment ends where the next begins and the last one lasts two seconds.
 * A line with several time tags yields one segment per tag. Lines are
 * ordered by start time, and a segment whose successor starts at the same
 * instant still lasts one millisecond.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::timestamp;
use super::{CodecOptions, FormatHandler, Segment, SubtitleFormat, Timeline};
use crate::errors::SubtitleError;

/// Duration given to the final line, which has no successor
pub const LAST_LINE_DURATION_MS: u64 = 2000;

static DETECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n\[\d+:\d{1,2}(?:[.,]\d{1,3})?\].*\r?\n").expect("lrc detect regex is valid")
});

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:\[\d{1,3}:\d{1,2}(?:[.,]\d{1,3})?\])+)(.*)$").expect("lrc line regex is valid")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,3}:\d{1,2}(?:[.,]\d{1,3})?)\]").expect("lrc tag regex is valid"));

static META_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[A-Za-z]+:[^\]]*\]$").expect("lrc meta regex is valid"));

/// LRC handler
pub struct LrcFormat;

impl FormatHandler for LrcFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Lrc
    }

    fn detect(&self, content: &str) -> bool {
        DETECT_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, _options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let mut lines: Vec<(u64, String)> = Vec::new();

        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if let Some(caps) = LINE_REGEX.captures(line) {
                let text = caps[2].to_string();
                for tag in TAG_REGEX.captures_iter(&caps[1]) {
                    lines.push((timestamp::parse_lrc(&tag[1])?, text.clone()));
                }
            } else if !META_REGEX.is_match(line) {
                log::debug!("Skipping unknown LRC line: {}", line);
            }
        }

        // Stable, so lines sharing a timestamp keep file order
        lines.sort_by_key(|(start_ms, _)| *start_ms);

        let mut segments: Timeline = Vec::with_capacity(lines.len());
        for (index, (start_ms, content)) in lines.iter().enumerate() {
            let end_ms = match lines.get(index + 1) {
                Some((next_start, _)) => (*next_start).max(start_ms + 1),
                None => start_ms + LAST_LINE_DURATION_MS,
            };
            segments.push(Segment {
                id: index.to_string(),
                start_ms: *start_ms,
                end_ms,
                content: content.clone(),
            });
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], _options: &CodecOptions) -> String {
        let mut output = String::from("\n");
        for segment in segments {
            let text = segment
                .content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            output.push_str(&format!("[{}]{}\n", timestamp::format_lrc(segment.start_ms), text));
        }
        output
    }
}
