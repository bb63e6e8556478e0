/*!
 * Tests for subtitle format parsing, building and detection
 */

use subweave::subtitle_codec::{
    self, CodecOptions, Resync, Segment, SubtitleFormat, build, detect, merge_bilingual, parse,
};
use crate::common;

const ALL_FORMATS: [SubtitleFormat; 6] = [
    SubtitleFormat::Vtt,
    SubtitleFormat::Srt,
    SubtitleFormat::Lrc,
    SubtitleFormat::Sbv,
    SubtitleFormat::Smi,
    SubtitleFormat::MicroDvd,
];

/// Test that every built format is detected as itself
#[test]
fn test_detect_withBuiltOutput_shouldRecognizeEachFormat() {
    let segments = common::sample_segments();
    for format in ALL_FORMATS {
        let text = build(&segments, format);
        assert_eq!(detect(&text), Some(format), "format {}", format);
    }
}

/// Test that VTT and SRT keep timing and content exactly
#[test]
fn test_build_thenParse_forLosslessFormats_shouldRoundTrip() {
    let segments = common::sample_segments();
    for format in [SubtitleFormat::Vtt, SubtitleFormat::Srt] {
        let text = build(&segments, format);
        let parsed = parse(&text, Some(format)).unwrap();
        assert_eq!(parsed, segments, "format {}", format);
    }
}

/// Test that SBV keeps times and lines but renumbers ids
#[test]
fn test_build_thenParse_forSbv_shouldKeepTiming() {
    let segments = common::sample_segments();
    let parsed = parse(&build(&segments, SubtitleFormat::Sbv), None).unwrap();

    assert_eq!(parsed.len(), segments.len());
    for (parsed, original) in parsed.iter().zip(&segments) {
        assert!(parsed.same_interval(original));
        assert_eq!(parsed.content, original.content);
    }
}

/// Test the documented losses of the LRC format
#[test]
fn test_build_thenParse_forLrc_shouldChainEndTimesAndJoinLines() {
    let segments = common::sample_segments();
    let parsed = parse(&build(&segments, SubtitleFormat::Lrc), None).unwrap();

    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed[0].start_ms, 0);
    assert_eq!(parsed[0].end_ms, 1_500);
    assert_eq!(parsed[1].content, "Two lines");
    assert_eq!(parsed[2].start_ms, 59_990);
    assert_eq!(parsed[3].start_ms, 3_600_000);
    assert_eq!(parsed[3].end_ms, 3_602_000);
}

/// Test parsing the shared SRT fixture without a format hint
#[test]
fn test_parse_withSampleSrt_shouldDetectAndParse() {
    let parsed = parse(common::SAMPLE_SRT, None).unwrap();

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[1], Segment::new("2", 5_000, 9_000, "It contains\nmultiple lines."));
}

/// Test that unrecognizable text is rejected
#[test]
fn test_parse_withPlainProse_shouldFailDetection() {
    assert!(detect("just some words\nwithout any timing").is_none());
    assert!(parse("just some words\nwithout any timing", None).is_err());
}

/// Test offset and ratio correction, clamped at zero
#[test]
fn test_resync_withNegativeOffset_shouldClampAtZero() {
    let segments = vec![
        Segment::new("a", 500, 1_000, "early"),
        Segment::new("b", 10_000, 12_000, "late"),
    ];

    let shifted = subtitle_codec::resync(&segments, Resync::offset(-2_000));
    assert_eq!((shifted[0].start_ms, shifted[0].end_ms), (0, 1));
    assert_eq!((shifted[1].start_ms, shifted[1].end_ms), (8_000, 10_000));

    let scaled = subtitle_codec::resync(&segments, Resync { offset_ms: 100, ratio: 2.0 });
    assert_eq!((scaled[1].start_ms, scaled[1].end_ms), (20_100, 24_100));
}

/// Test SRT to MicroDVD conversion at a custom frame rate
#[test]
fn test_convert_toMicroDvd_shouldUseFrameRate() {
    let options = CodecOptions { fps: 10.0 };
    let text = subtitle_codec::convert(common::SAMPLE_SRT, None, SubtitleFormat::MicroDvd, None, &options).unwrap();

    assert!(text.starts_with("{10}{40}This is a test subtitle."));
    assert!(text.contains("{50}{90}It contains|multiple lines."));
}

/// Test bilingual merging by index
#[test]
fn test_mergeBilingual_withShorterSecondary_shouldLeaveBlankLine() {
    let primary = common::sample_segments();
    let secondary = vec![Segment::new("x", 0, 1, "Bonjour")];

    let merged = merge_bilingual(&primary, &secondary);

    assert_eq!(merged.len(), primary.len());
    assert_eq!(merged[0].content, "Hello\nBonjour");
    assert_eq!(merged[2].content, "Minute boundary\n");
}

/// Test format name aliases and path detection
#[test]
fn test_subtitleFormat_fromStrAndPath_shouldAcceptAliases() {
    assert_eq!("WebVTT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Vtt);
    assert_eq!(".sami".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Smi);
    assert!("ass".parse::<SubtitleFormat>().is_err());
    assert_eq!(
        SubtitleFormat::from_path(std::path::Path::new("movie.en.sub")),
        Some(SubtitleFormat::MicroDvd)
    );
}
