/*!
 * SubViewer (.sbv): `start,end` on one line, text below.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::timestamp::{self, FULL_CLOCK_PATTERN};
use super::{CodecOptions, FormatHandler, Segment, SubtitleFormat, Timeline, cue_lines, split_blocks};
use crate::errors::SubtitleError;

static DETECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{clock}[ \t]*[,;][ \t]*{clock}",
        clock = FULL_CLOCK_PATTERN
    ))
    .expect("sbv detect regex is valid")
});

static CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({clock})[ \t]*[,;][ \t]*({clock})[ \t]*(?:\n([\s\S]*))?$",
        clock = FULL_CLOCK_PATTERN
    ))
    .expect("sbv cue regex is valid")
});

static BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[br\]").expect("sbv break regex is valid"));

/// SubViewer handler
pub struct SbvFormat;

impl FormatHandler for SbvFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Sbv
    }

    fn detect(&self, content: &str) -> bool {
        DETECT_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, _options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let mut segments = Vec::new();

        for block in split_blocks(content) {
            let Some(caps) = CUE_REGEX.captures(&block) else {
                continue;
            };
            let text = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            segments.push(Segment {
                id: segments.len().to_string(),
                start_ms: timestamp::parse_clock(&caps[1])?,
                end_ms: timestamp::parse_clock(&caps[2])?,
                content: BREAK_REGEX.replace_all(text.trim_end_matches('\n'), "\n").into_owned(),
            });
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], _options: &CodecOptions) -> String {
        let mut output = String::new();
        for segment in segments {
            output.push_str(&format!(
                "{},{}\n",
                timestamp::format_clock(segment.start_ms, '.'),
                timestamp::format_clock(segment.end_ms, '.')
            ));
            for line in cue_lines(&segment.content) {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }
        output
    }
}
