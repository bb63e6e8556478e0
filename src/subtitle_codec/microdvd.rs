/*!
 * MicroDVD (.sub): frame-indexed `{start}{end}text|line` cues.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CodecOptions, DEFAULT_FPS, FormatHandler, Segment, SubtitleFormat, Timeline};
use crate::errors::SubtitleError;

static DETECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{\d+\}\{\d+\}").expect("microdvd detect regex is valid"));

static LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{(\d+)\}\{(\d+)\}(.*)$").expect("microdvd line regex is valid"));

// Inline style codes such as {y:i} or {c:$0000ff}
static STYLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("microdvd style regex is valid"));

/// MicroDVD handler
pub struct MicroDvdFormat;

fn effective_fps(options: &CodecOptions) -> f64 {
    if options.fps > 0.0 { options.fps } else { DEFAULT_FPS }
}

/// Convert a frame index to milliseconds
pub fn frame_to_ms(frame: u64, fps: f64) -> u64 {
    (frame as f64 * 1000.0 / fps).round() as u64
}

/// Convert milliseconds to the nearest frame index
pub fn ms_to_frame(ms: u64, fps: f64) -> u64 {
    (ms as f64 * fps / 1000.0).round() as u64
}

impl FormatHandler for MicroDvdFormat {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::MicroDvd
    }

    fn detect(&self, content: &str) -> bool {
        DETECT_REGEX.is_match(content)
    }

    fn parse(&self, content: &str, options: &CodecOptions) -> Result<Timeline, SubtitleError> {
        let fps = effective_fps(options);
        let mut segments = Vec::new();

        for line in content.lines().map(str::trim) {
            let Some(caps) = LINE_REGEX.captures(line) else {
                continue;
            };
            let start_frame: u64 = caps[1]
                .parse()
                .map_err(|_| SubtitleError::InvalidTimestamp(caps[1].to_string()))?;
            let end_frame: u64 = caps[2]
                .parse()
                .map_err(|_| SubtitleError::InvalidTimestamp(caps[2].to_string()))?;
            let text = STYLE_REGEX.replace_all(&caps[3], "");

            segments.push(Segment {
                id: segments.len().to_string(),
                start_ms: frame_to_ms(start_frame, fps),
                end_ms: frame_to_ms(end_frame, fps),
                content: text.split('|').collect::<Vec<_>>().join("\n"),
            });
        }

        Ok(segments)
    }

    fn build(&self, segments: &[Segment], options: &CodecOptions) -> String {
        let fps = effective_fps(options);
        let mut output = String::new();
        for segment in segments {
            let text = segment
                .content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("|");
            output.push_str(&format!(
                "{{{}}}{{{}}}{}\n",
                ms_to_frame(segment.start_ms, fps),
                ms_to_frame(segment.end_ms, fps),
                text
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_withStyleCodes_shouldStripThemAndSplitLines() {
        let content = "{7207}{7262}{y:i}Sister,|perfume?\n{7300}{7350}Yes\n";
        let segments = MicroDvdFormat.parse(content, &CodecOptions::default()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_ms, 288_280);
        assert_eq!(segments[0].end_ms, 290_480);
        assert_eq!(segments[0].content, "Sister,\nperfume?");
    }

    #[test]
    fn test_build_withCustomFps_shouldScaleFrames() {
        let segments = vec![Segment::new("0", 1000, 2000, "a\nb")];
        let options = CodecOptions { fps: 30.0 };
        assert_eq!(MicroDvdFormat.build(&segments, &options), "{30}{60}a|b\n");
    }
}
