/*!
 * Subtitle interchange codec.
 *
 * Converts between textual subtitle formats and a [`Timeline`] of
 * [`Segment`]s. Each format lives in its own stateless module and is
 * registered as a [`FormatHandler`]; callers only see the functions
 * exported here:
 *
 * - [`detect`] tries every handler's structural heuristic in priority order
 * - [`parse`] / [`parse_with_options`] decode text into segments
 * - [`build`] / [`build_with_options`] encode segments into text
 * - [`resync`] shifts and stretches timestamps
 * - [`convert`] chains the above
 */

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

pub mod lrc;
pub mod microdvd;
pub mod sbv;
pub mod smi;
pub mod srt;
pub mod timestamp;
pub mod vtt;

/// Frame rate assumed for frame-indexed formats when none is given
pub const DEFAULT_FPS: f64 = 25.0;

/// Latest timestamp a resync may produce, 999:59:59.999
pub const MAX_TIMESTAMP_MS: u64 = 3_599_999_999;

/// A single timestamped unit of subtitle text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Opaque identifier, unique within one timeline
    pub id: String,
    /// Start time in ms
    pub start_ms: u64,
    /// End time in ms
    pub end_ms: u64,
    /// Text, lines separated by `\n`
    pub content: String,
}

impl Segment {
    pub fn new(id: impl Into<String>, start_ms: u64, end_ms: u64, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_ms,
            end_ms,
            content: content.into(),
        }
    }

    /// Whether two segments cover exactly the same interval
    pub fn same_interval(&self, other: &Segment) -> bool {
        self.start_ms == other.start_ms && self.end_ms == other.end_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Ordered segments of one language track
pub type Timeline = Vec<Segment>;

/// Supported subtitle text formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    Lrc,
    Sbv,
    Smi,
    MicroDvd,
}

impl SubtitleFormat {
    // @returns: Registry name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vtt => "vtt",
            Self::Srt => "srt",
            Self::Lrc => "lrc",
            Self::Sbv => "sbv",
            Self::Smi => "smi",
            Self::MicroDvd => "sub",
        }
    }

    // @returns: Conventional file extension, without the dot
    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// Guess the format from a file path's extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "srt" | "subrip" => Ok(Self::Srt),
            "lrc" => Ok(Self::Lrc),
            "sbv" | "subviewer" => Ok(Self::Sbv),
            "smi" | "sami" => Ok(Self::Smi),
            "sub" | "microdvd" => Ok(Self::MicroDvd),
            other => Err(SubtitleError::UnknownFormat(other.to_string())),
        }
    }
}

/// Options for formats that need more than the text itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecOptions {
    /// Frame rate for frame-indexed formats
    pub fps: f64,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

/// One registered subtitle format
pub trait FormatHandler: Send + Sync {
    /// Format this handler implements
    fn format(&self) -> SubtitleFormat;

    /// Structural heuristic, true when the content looks like this format
    fn detect(&self, content: &str) -> bool;

    /// Decode content into segments
    fn parse(&self, content: &str, options: &CodecOptions) -> Result<Timeline, SubtitleError>;

    /// Encode segments into text
    fn build(&self, segments: &[Segment], options: &CodecOptions) -> String;
}

// Detection priority: specific markers before the generic time-pair pattern
static REGISTRY: [&dyn FormatHandler; 6] = [
    &vtt::VttFormat,
    &lrc::LrcFormat,
    &smi::SmiFormat,
    &microdvd::MicroDvdFormat,
    &srt::SrtFormat,
    &sbv::SbvFormat,
];

/// Registered handlers in detection order
pub fn handlers() -> &'static [&'static dyn FormatHandler] {
    &REGISTRY
}

/// Look up the handler for a format
pub fn handler(format: SubtitleFormat) -> &'static dyn FormatHandler {
    match format {
        SubtitleFormat::Vtt => &vtt::VttFormat,
        SubtitleFormat::Srt => &srt::SrtFormat,
        SubtitleFormat::Lrc => &lrc::LrcFormat,
        SubtitleFormat::Sbv => &sbv::SbvFormat,
        SubtitleFormat::Smi => &smi::SmiFormat,
        SubtitleFormat::MicroDvd => &microdvd::MicroDvdFormat,
    }
}

/// Detect the format of subtitle text
pub fn detect(content: &str) -> Option<SubtitleFormat> {
    let detected = REGISTRY
        .iter()
        .find(|handler| handler.detect(content))
        .map(|handler| handler.format());
    debug!("Detected subtitle format: {:?}", detected);
    detected
}

/// Parse subtitle text, detecting the format when none is given
pub fn parse(content: &str, format: Option<SubtitleFormat>) -> Result<Timeline, SubtitleError> {
    parse_with_options(content, format, &CodecOptions::default())
}

/// Parse subtitle text with explicit codec options
pub fn parse_with_options(
    content: &str,
    format: Option<SubtitleFormat>,
    options: &CodecOptions,
) -> Result<Timeline, SubtitleError> {
    let format = match format {
        Some(format) => format,
        None => detect(content).ok_or(SubtitleError::FormatDetectionFailure)?,
    };
    let segments = handler(format).parse(content, options)?;
    if segments.is_empty() && !content.trim().is_empty() && format != SubtitleFormat::Vtt {
        return Err(SubtitleError::FormatDetectionFailure);
    }
    Ok(segments)
}

/// Build subtitle text in the given format
pub fn build(segments: &[Segment], format: SubtitleFormat) -> String {
    build_with_options(segments, format, &CodecOptions::default())
}

/// Build subtitle text with explicit codec options
pub fn build_with_options(segments: &[Segment], format: SubtitleFormat, options: &CodecOptions) -> String {
    handler(format).build(segments, options)
}

/// Linear time correction applied by [`resync`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resync {
    /// Added after scaling, may be negative
    pub offset_ms: i64,
    /// Multiplier applied to every timestamp
    pub ratio: f64,
}

impl Default for Resync {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            ratio: 1.0,
        }
    }
}

impl Resync {
    pub fn offset(offset_ms: i64) -> Self {
        Self {
            offset_ms,
            ..Self::default()
        }
    }

    fn apply(&self, ms: u64) -> u64 {
        let shifted = (ms as f64 * self.ratio + self.offset_ms as f64).round();
        if shifted.is_nan() || shifted <= 0.0 {
            0
        } else {
            shifted.min(MAX_TIMESTAMP_MS as f64) as u64
        }
    }
}

/// Apply an offset and ratio to every timestamp
///
/// Times are clamped to `0..=MAX_TIMESTAMP_MS`; a segment collapsed by
/// clamping keeps a 1ms span.
pub fn resync(segments: &[Segment], shift: Resync) -> Timeline {
    segments
        .iter()
        .map(|segment| {
            let start_ms = shift.apply(segment.start_ms);
            let end_ms = shift.apply(segment.end_ms).max(start_ms.saturating_add(1));
            Segment {
                start_ms,
                end_ms,
                ..segment.clone()
            }
        })
        .collect()
}

/// Parse, optionally resync, and rebuild in another format
pub fn convert(
    content: &str,
    from: Option<SubtitleFormat>,
    to: SubtitleFormat,
    shift: Option<Resync>,
    options: &CodecOptions,
) -> Result<String, SubtitleError> {
    let mut segments = parse_with_options(content, from, options)?;
    if let Some(shift) = shift {
        segments = resync(&segments, shift);
    }
    Ok(build_with_options(&segments, to, options))
}

/// Merge two timelines into bilingual cues, pairing by index
pub fn merge_bilingual(primary: &[Segment], secondary: &[Segment]) -> Timeline {
    primary
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let other = secondary.get(index).map(|s| s.content.as_str()).unwrap_or("");
            Segment {
                content: format!("{}\n{}", segment.content, other),
                ..segment.clone()
            }
        })
        .collect()
}

/// Split text into normalized blocks separated by blank lines
pub(crate) fn split_blocks(content: &str) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Content lines without blank lines, which would split a cue in block formats
pub(crate) fn cue_lines(content: &str) -> Vec<&str> {
    content.lines().filter(|line| !line.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Timeline {
        vec![
            Segment::new("0", 0, 2000, "hi"),
            Segment::new("1", 2000, 4500, "two\nlines"),
        ]
    }

    #[test]
    fn test_formatFromStr_withExtensions_shouldResolve() {
        assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert_eq!(".sub".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::MicroDvd);
        assert_eq!("sami".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Smi);
        assert!("ass".parse::<SubtitleFormat>().is_err());
    }

    #[test]
    fn test_parse_withUnknownContent_shouldFailDetection() {
        let result = parse("just some prose\nwithout timing", None);
        assert_eq!(result, Err(SubtitleError::FormatDetectionFailure));
    }

    #[test]
    fn test_resync_withOffsetAndRatio_shouldRound() {
        let shifted = resync(&sample(), Resync { offset_ms: 100, ratio: 1.5 });
        assert_eq!(shifted[0].start_ms, 100);
        assert_eq!(shifted[0].end_ms, 3100);
        assert_eq!(shifted[1].end_ms, 6850);
        assert_eq!(shifted[1].content, "two\nlines");
    }

    #[test]
    fn test_resync_withNegativeOffset_shouldClampAtZero() {
        let shifted = resync(&sample(), Resync::offset(-3000));
        assert_eq!(shifted[0].start_ms, 0);
        assert_eq!(shifted[0].end_ms, 1);
        assert_eq!(shifted[1].start_ms, 0);
        assert_eq!(shifted[1].end_ms, 1500);
    }

    #[test]
    fn test_resync_withHugeRatio_shouldClampToCeiling() {
        let segments = vec![Segment::new("0", 1000, 2000, "x")];

        let scaled = resync(&segments, Resync { offset_ms: 0, ratio: 1e30 });
        assert_eq!(scaled[0].start_ms, MAX_TIMESTAMP_MS);
        assert_eq!(scaled[0].end_ms, MAX_TIMESTAMP_MS + 1);

        let shifted = resync(&segments, Resync::offset(i64::MAX));
        assert!(shifted[0].start_ms < shifted[0].end_ms);

        let nan = resync(&segments, Resync { offset_ms: 0, ratio: f64::NAN });
        assert_eq!((nan[0].start_ms, nan[0].end_ms), (0, 1));
    }

    #[test]
    fn test_convert_vttToSrt_shouldChangeSeparator() {
        let vtt = build(&sample(), SubtitleFormat::Vtt);
        let srt = convert(&vtt, None, SubtitleFormat::Srt, None, &CodecOptions::default()).unwrap();
        assert!(srt.contains("00:00:02,000 --> 00:00:04,500"));
        assert_eq!(detect(&srt), Some(SubtitleFormat::Srt));
    }

    #[test]
    fn test_mergeBilingual_withShorterSecondary_shouldLeaveBlankLine() {
        let secondary = vec![Segment::new("0", 0, 2000, "salut")];
        let merged = merge_bilingual(&sample(), &secondary);
        assert_eq!(merged[0].content, "hi\nsalut");
        assert_eq!(merged[1].content, "two\nlines\n");
    }

    #[test]
    fn test_detect_everyBuiltFormat_shouldRoundTrip() {
        for handler in handlers() {
            let text = build(&sample(), handler.format());
            assert_eq!(detect(&text), Some(handler.format()), "format {}", handler.format());
        }
    }
}
