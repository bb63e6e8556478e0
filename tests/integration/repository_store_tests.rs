/*!
 * Integration tests for the SQLite-backed key/value store
 */

use anyhow::Result;
use std::sync::Arc;

use subweave::database::{DatabaseConnection, KeyValueStore, Repository};
use subweave::language_utils::Language;
use subweave::subtitles::SubtitleManager;
use crate::common;

/// Test that values written to a file survive reopening it
#[tokio::test]
async fn test_repository_reopened_shouldKeepValues() -> Result<()> {
    let (_dir, repo) = common::file_repository()?;
    let path = repo.connection().path().to_path_buf();
    assert!(path.exists());

    repo.set("DEEPL_TRANS_SETTINGS", r#"{"authKey":"secret"}"#).await?;
    repo.set_many(vec![
        ("subtitles:a".to_string(), "{}".to_string()),
        ("subtitles:a:en".to_string(), "WEBVTT\n".to_string()),
    ])
    .await?;
    drop(repo);

    let reopened = Repository::new(DatabaseConnection::new(&path)?);
    assert_eq!(
        reopened.get_one("DEEPL_TRANS_SETTINGS").await?.as_deref(),
        Some(r#"{"authKey":"secret"}"#)
    );
    assert_eq!(reopened.connection().entry_count()?, 3);
    Ok(())
}

/// Test that prefix listing treats SQL wildcards literally
#[tokio::test]
async fn test_keysWithPrefix_withWildcardCharacters_shouldMatchLiterally() -> Result<()> {
    let (_dir, repo) = common::file_repository()?;
    repo.set("subtitles:a_b", "1").await?;
    repo.set("subtitles:axb", "2").await?;
    repo.set("subtitles:a%", "3").await?;

    assert_eq!(repo.keys_with_prefix("subtitles:a_").await?, vec!["subtitles:a_b"]);
    assert_eq!(repo.keys_with_prefix("subtitles:a%").await?, vec!["subtitles:a%"]);
    assert_eq!(repo.keys_with_prefix("subtitles:").await?.len(), 3);
    Ok(())
}

/// Test a full subtitle record lifecycle over the SQLite store
#[tokio::test]
async fn test_subtitleManager_overRepository_shouldPersistTimelines() -> Result<()> {
    let (_dir, repo) = common::file_repository()?;
    let manager = SubtitleManager::new(Arc::new(repo.clone()));

    manager.import("movie", common::SAMPLE_SRT, Language::En).await?;
    let english = manager.get_timeline("movie", Language::En).await?;
    manager.save_timeline("movie", Language::ZhCn, &english).await?;
    manager.set_selected_translation_lang("movie", Some(Language::ZhCn)).await?;

    let keys = repo.keys_with_prefix("subtitles:movie").await?;
    assert_eq!(keys, vec!["subtitles:movie", "subtitles:movie:en", "subtitles:movie:zh_CN"]);

    let stored = repo.get_one("subtitles:movie:en").await?.unwrap();
    assert!(stored.starts_with("WEBVTT"));

    let record = manager.get_record("movie").await?.unwrap();
    assert_eq!(record.selected_translation_lang, Some(Language::ZhCn));
    assert_eq!(record.translations().collect::<Vec<_>>(), vec![Language::ZhCn]);

    manager.clear_timeline("movie", Language::ZhCn).await?;
    assert!(repo.get_one("subtitles:movie:zh_CN").await?.is_none());
    Ok(())
}
