/*!
 * Integration tests for incremental translation over mock providers
 */

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use subweave::app_config::TranslationProvider;
use subweave::errors::{ErrorKind, TranslationError};
use subweave::language_utils::Language;
use subweave::providers::mock::MockProvider;
use subweave::subtitle_codec::Segment;
use subweave::translation::{DiffOutcome, DiffRequest};
use crate::common;

fn request(id: &str) -> DiffRequest {
    DiffRequest::new(id, Language::En, Language::Fr, TranslationProvider::Baidu)
}

/// Test an imported file translated to completion in small batches
#[tokio::test(start_paused = true)]
async fn test_catchUp_withImportedFile_shouldTranslateEverySegment() -> Result<()> {
    let mock = MockProvider::working();
    let engine = common::mock_engine(&mock);
    let manager = engine.manager().clone();
    manager.import("movie", common::SAMPLE_SRT, Language::En).await?;

    let mut remaining_after_batch = Vec::new();
    let report = engine
        .translate_until_caught_up_with_progress(
            &request("movie").with_batch_size(2),
            CancellationToken::new(),
            |report| remaining_after_batch.push(report.remaining),
        )
        .await?;

    assert_eq!(report.batches, 2);
    assert_eq!(report.translated, 3);
    assert!(!report.cancelled);
    assert_eq!(remaining_after_batch, vec![1, 0]);
    assert_eq!(mock.request_count(), 2);

    let source = manager.get_timeline("movie", Language::En).await?;
    let target = manager.get_timeline("movie", Language::Fr).await?;
    assert_eq!(target.len(), source.len());
    for (translated, original) in target.iter().zip(&source) {
        assert!(translated.same_interval(original));
        assert_eq!(translated.content, MockProvider::translated(&original.content, Language::Fr));
    }

    let record = manager.get_record("movie").await?.unwrap();
    assert!(record.has_language(Language::Fr));
    Ok(())
}

/// Test that a live transcription is translated as it grows
#[tokio::test(start_paused = true)]
async fn test_catchUp_withGrowingTranscription_shouldOnlyTranslateNewSegments() -> Result<()> {
    let mock = MockProvider::working();
    let engine = common::mock_engine(&mock);
    let manager = engine.manager().clone();

    manager.create_record_with_id("live").await?;
    manager.begin_transcription("live", Language::En).await?;
    manager
        .append_segments(
            "live",
            &[Segment::new("a", 0, 1_000, "one"), Segment::new("b", 1_000, 2_000, "two")],
        )
        .await?;
    engine.translate_until_caught_up(&request("live"), CancellationToken::new()).await?;

    manager.append_segments("live", &[Segment::new("c", 2_000, 3_000, "three")]).await?;
    let outcome = engine.diff_translate(&request("live")).await?;

    assert_eq!(
        outcome,
        DiffOutcome::Translated {
            translated: 1,
            remaining: 0,
            word_count: 5
        }
    );
    assert_eq!(mock.calls().last().unwrap().texts, vec!["three".to_string()]);
    assert_eq!(engine.diff_translate(&request("live")).await?, DiffOutcome::NoDiff);
    assert_eq!(manager.get_timeline("live", Language::Fr).await?.len(), 3);
    Ok(())
}

/// Test that a provider that keeps failing leaves the target untouched
#[tokio::test(start_paused = true)]
async fn test_catchUp_withFailingProvider_shouldSurfaceErrorAndKeepTarget() -> Result<()> {
    let mock = MockProvider::failing(ErrorKind::RateLimited);
    let engine = common::mock_engine(&mock);
    let manager = engine.manager().clone();
    manager.import("movie", common::SAMPLE_SRT, Language::En).await?;

    let err = engine
        .translate_until_caught_up(&request("movie"), CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        TranslationError::Provider(inner) => assert_eq!(inner.kind(), ErrorKind::RateLimited),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(mock.request_count(), 2);
    assert!(manager.get_timeline("movie", Language::Fr).await?.is_empty());
    Ok(())
}

/// Test that a pre-cancelled token stops before any provider call
#[tokio::test(start_paused = true)]
async fn test_catchUp_withCancelledToken_shouldStopImmediately() -> Result<()> {
    let mock = MockProvider::working();
    let engine = common::mock_engine(&mock);
    engine.manager().import("movie", common::SAMPLE_SRT, Language::En).await?;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = engine.translate_until_caught_up(&request("movie"), cancel).await?;

    assert!(report.cancelled);
    assert_eq!(report.batches, 0);
    assert_eq!(mock.request_count(), 0);
    Ok(())
}
