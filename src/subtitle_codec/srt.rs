/*!
 * SubRip (.srt): numbered cues with comma-separated milliseconds.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::timestamp::{self, FULL_CLOCK_PATTERN};
use super::{CodecOptions, FormatHandler, Segment, SubtitleFormat, Timeline, cue_lines, split_blocks};
use crate::errors::SubtitleError;

static DETECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\d+\r?\n{clock}[ \t]*-->[ \t]*{clock}",
        clock = FULL_CLOCK_PATTERN
    ))
    .expect("srt detect regex is valid")
});

static CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(\d+)\n({clock})[ \t]*-->[ \t]*({clock})[^\n]*(?:\n([\s\S]*))?$",
        clock = FULL_CLOCK_PATTERN
    ))
    .expect("srt cue regex is valid")
});

/// SubRip handler
pub struct SrtFormat;

impl FormatHandler for SrtFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Srt
    }

    fn detect(&self, content: &str) -> bool {
        DETECT_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, _options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let mut segments = Vec::new();

        for block in split_blocks(content) {
            let Some(caps) = CUE_REGEX.captures(&block) else {
                if block.contains("-->") {
                    return Err(SubtitleError::FormatDetectionFailure);
                }
                continue;
            };

            segments.push(Segment {
                id: caps[1].to_string(),
                start_ms: timestamp::parse_clock(&caps[2])?,
                end_ms: timestamp::parse_clock(&caps[3])?,
                content: caps
                    .get(4)
                    .map(|m| m.as_str().trim_end_matches('\n').to_string())
                    .unwrap_or_default(),
            });
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], _options: &CodecOptions) -> String {
        let mut output = String::new();
        for (index, segment) in segments.iter().enumerate() {
            output.push_str(&format!(
                "{}\n{} --> {}\n",
                index + 1,
                timestamp::format_clock(segment.start_ms, ','),
                timestamp::format_clock(segment.end_ms, ',')
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
