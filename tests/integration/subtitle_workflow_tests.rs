/*!
 * Integration tests for importing, converting and exporting subtitle files
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use subweave::database::MemoryStore;
use subweave::language_utils::Language;
use subweave::subtitle_codec::{self, CodecOptions, Resync, SubtitleFormat};
use subweave::subtitles::SubtitleManager;
use crate::common;

fn manager() -> SubtitleManager {
    SubtitleManager::new(Arc::new(MemoryStore::new()))
}

/// Test converting a file on disk from SRT to WebVTT with a delay
#[test]
fn test_convert_fromSrtFile_shouldWriteShiftedVtt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "movie.srt", common::SAMPLE_SRT)?;
    let output = temp_dir.path().join("movie.vtt");

    let content = fs::read_to_string(&input)?;
    let from = SubtitleFormat::from_path(&input);
    let to = SubtitleFormat::from_path(&output).unwrap();
    let converted = subtitle_codec::convert(&content, from, to, Some(Resync::offset(500)), &CodecOptions::default())?;
    fs::write(&output, &converted)?;

    let written = fs::read_to_string(&output)?;
    assert!(written.starts_with("WEBVTT"));
    assert!(written.contains("00:00:01.500 --> 00:00:04.500"));

    let reparsed = subtitle_codec::parse(&written, None)?;
    assert_eq!(reparsed.len(), 3);
    assert_eq!(reparsed[2].start_ms, 10_500);
    Ok(())
}

/// Test that an imported file exports back with the same cues
#[tokio::test]
async fn test_import_thenExport_shouldPreserveCues() -> Result<()> {
    let manager = manager();

    let imported = manager.import("movie", common::SAMPLE_SRT, Language::En).await?;
    assert_eq!(imported.len(), 3);

    let record = manager.get_record("movie").await?.unwrap();
    assert_eq!(record.default_lang, Some(Language::En));
    assert_eq!(record.languages, vec![Language::En]);

    let exported = manager.export("movie", Language::En, None, SubtitleFormat::Srt).await?;
    assert_eq!(subtitle_codec::parse(&exported, None)?, imported);
    Ok(())
}

/// Test that a second import replaces every stored language
#[tokio::test]
async fn test_import_overExistingRecord_shouldDropOldLanguages() -> Result<()> {
    let manager = manager();
    manager.import("movie", common::SAMPLE_SRT, Language::En).await?;
    let english = manager.get_timeline("movie", Language::En).await?;
    manager.save_timeline("movie", Language::Fr, &english).await?;

    let lrc = subtitle_codec::build(&common::sample_segments(), SubtitleFormat::Lrc);
    manager.import("movie", &lrc, Language::Ja).await?;

    let record = manager.get_record("movie").await?.unwrap();
    assert_eq!(record.default_lang, Some(Language::Ja));
    assert_eq!(record.languages, vec![Language::Ja]);
    assert!(manager.get_timeline("movie", Language::Fr).await?.is_empty());
    assert_eq!(manager.get_timeline("movie", Language::Ja).await?.len(), 4);
    Ok(())
}

/// Test that a file that cannot be parsed leaves the record untouched
#[tokio::test]
async fn test_import_withUnparseableFile_shouldKeepExistingData() -> Result<()> {
    let manager = manager();
    manager.import("movie", common::SAMPLE_SRT, Language::En).await?;

    assert!(manager.import("movie", "no timing here", Language::Fr).await.is_err());

    let record = manager.get_record("movie").await?.unwrap();
    assert_eq!(record.default_lang, Some(Language::En));
    assert_eq!(manager.get_timeline("movie", Language::En).await?.len(), 3);
    Ok(())
}

/// Test bilingual export pairing the default and a translation
#[tokio::test]
async fn test_export_withSecondaryLanguage_shouldStackLines() -> Result<()> {
    let manager = manager();
    let imported = manager.import("movie", common::SAMPLE_SRT, Language::En).await?;

    let mut french = imported.clone();
    for segment in &mut french {
        segment.content = format!("fr {}", segment.id);
    }
    manager.save_timeline("movie", Language::Fr, &french).await?;

    let exported = manager
        .export("movie", Language::En, Some(Language::Fr), SubtitleFormat::Vtt)
        .await?;
    let cues = subtitle_codec::parse(&exported, Some(SubtitleFormat::Vtt))?;

    assert_eq!(cues.len(), 3);
    assert_eq!(cues[0].content, "This is a test subtitle.\nfr 1");
    assert_eq!(cues[1].content, "It contains\nmultiple lines.\nfr 2");
    Ok(())
}

/// Test that exporting an unknown record fails
#[tokio::test]
async fn test_export_withUnknownRecord_shouldFail() {
    let manager = manager();
    assert!(manager.export("nope", Language::En, None, SubtitleFormat::Srt).await.is_err());
}
