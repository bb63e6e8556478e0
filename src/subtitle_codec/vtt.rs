/*!
 * WebVTT, the canonical persisted form of every timeline.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::timestamp::{self, CLOCK_PATTERN};
use super::{CodecOptions, FormatHandler, Segment, SubtitleFormat, Timeline, cue_lines, split_blocks};
use crate::errors::SubtitleError;

static HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s\r\n]*WEBVTT[^\r\n]*\r?\n").expect("vtt header regex is valid"));

static CUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:([^\n]+)\n)?({clock})[ \t]*-->[ \t]*({clock})[^\n]*(?:\n([\s\S]*))?$",
        clock = CLOCK_PATTERN
    ))
    .expect("vtt cue regex is valid")
});

/// WebVTT handler
pub struct VttFormat;

impl FormatHandler for VttFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Vtt
    }

    fn detect(&self, content: &str) -> bool {
        HEADER_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, _options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let mut segments = Vec::new();

        for block in split_blocks(content) {
            let Some(caps) = CUE_REGEX.captures(&block) else {
                if block.contains("-->") {
                    return Err(SubtitleError::FormatDetectionFailure);
                }
                // Header, NOTE, STYLE and REGION blocks
                continue;
            };

            let start_ms = timestamp::parse_clock(&caps[2])?;
            let end_ms = timestamp::parse_clock(&caps[3])?;
            let id = caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|id| is_valid_cue_id(id))
                .map(str::to_string)
                .unwrap_or_else(|| segments.len().to_string());
            let content = caps
                .get(4)
                .map(|m| m.as_str().trim_end_matches('\n').to_string())
                .unwrap_or_default();

            segments.push(Segment {
                id,
                start_ms,
                end_ms,
                content,
            });
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], _options: &CodecOptions) -> String {
        let cues: Vec<String> = segments
            .iter()
            .map(|segment| {
                let mut cue = String::new();
                if is_valid_cue_id(&segment.id) {
                    cue.push_str(segment.id.trim());
                    cue.push('\n');
                }
                cue.push_str(&format!(
                    "{} --> {}\n",
                    timestamp::format_clock(segment.start_ms, '.'),
                    timestamp::format_clock(segment.end_ms, '.')
                ));
                for line in cue_lines(&segment.content) {
                    cue.push_str(line);
                    cue.push('\n');
                }
                cue
            })
            .collect();

        format!("WEBVTT\n\n{}", cues.join("\n"))
    }
}

/// Ids that parse back as themselves; anything else is renumbered
fn is_valid_cue_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && !id.starts_with("WEBVTT") && !id.contains('\n') && !id.contains("-->")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\nNOTE generated\n\n1\n00:00:01.000 --> 00:00:04.000\nHello\n\nintro\n00:05.250 --> 00:00:09.000 align:start\nTwo\nlines\n";

    #[test]
    fn test_parse_withIdsAndNotes_shouldSkipNotes() {
        let segments = VttFormat.parse(SAMPLE, &CodecOptions::default()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::new("1", 1000, 4000, "Hello"));
        assert_eq!(segments[1].id, "intro");
        assert_eq!(segments[1].start_ms, 5250);
        assert_eq!(segments[1].content, "Two\nlines");
    }

    #[test]
    fn test_parse_withoutCueIds_shouldUseIndex() {
        let content = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\na\n\n00:00:01.000 --> 00:00:02.000\nb\n";
        let segments = VttFormat.parse(content, &CodecOptions::default()).unwrap();
        assert_eq!(segments[0].id, "0");
        assert_eq!(segments[1].id, "1");
    }

    #[test]
    fn test_parse_withEmptyCue_shouldKeepPlaceholder() {
        let content = "WEBVTT\n\nx\n00:00:00.000 --> 00:00:01.000\n\ny\n00:00:01.000 --> 00:00:02.000\nb\n";
        let segments = VttFormat.parse(content, &CodecOptions::default()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].content, "");
    }

    #[test]
    fn test_parse_withBrokenTiming_shouldFail() {
        let content = "WEBVTT\n\n00:00:xx --> 00:00:01.000\na\n";
        assert_eq!(
            VttFormat.parse(content, &CodecOptions::default()),
            Err(SubtitleError::FormatDetectionFailure)
        );
    }

    #[test]
    fn test_build_thenParse_shouldBeLossless() {
        let segments = vec![
            Segment::new("a1", 1, 1999, "first"),
            Segment::new("b2", 3_600_001, 3_601_500, "second\nline"),
            Segment::new("c3", 3_601_500, 3_602_000, ""),
        ];
        let text = VttFormat.build(&segments, &CodecOptions::default());
        assert!(text.starts_with("WEBVTT\n\na1\n00:00:00.001 --> 00:00:01.999\nfirst\n"));
        let parsed = VttFormat.parse(&text, &CodecOptions::default()).unwrap();
        assert_eq!(parsed, segments);
    }

    #[test]
    fn test_build_withHeaderLikeId_shouldOmitIdAndParseAgree() {
        let segments = vec![
            Segment::new("WEBVTT x", 0, 1000, "a"),
            Segment::new("b", 1000, 2000, "b"),
        ];
        let text = VttFormat.build(&segments, &CodecOptions::default());
        assert!(text.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\na\n"));
        assert!(!text.contains("WEBVTT x"));

        let parsed = VttFormat.parse(&text, &CodecOptions::default()).unwrap();
        let ids: Vec<&str> = parsed.iter().map(|segment| segment.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "b"]);
        assert!(!is_valid_cue_id("WEBVTT x"));
        assert!(!is_valid_cue_id("a --> b"));
    }
}
