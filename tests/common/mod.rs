/*!
 * Common test utilities for the subweave test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use subweave::database::{DatabaseConnection, MemoryStore, Repository};
use subweave::providers::Provider;
use subweave::providers::mock::MockProvider;
use subweave::subtitle_codec::Segment;
use subweave::subtitles::SubtitleManager;
use subweave::translation::{DiffEngine, ProviderProfile, SchedulerRegistry};

/// Routes library logs to the test harness, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Sample SubRip content with three cues
pub const SAMPLE_SRT: &str = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains
multiple lines.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;

/// Segments with millisecond-precise times, spanning past one hour
pub fn sample_segments() -> Vec<Segment> {
    vec![
        Segment::new("1", 0, 1_234, "Hello"),
        Segment::new("2", 1_500, 3_007, "Two\nlines"),
        Segment::new("3", 59_999, 61_001, "Minute boundary"),
        Segment::new("4", 3_600_000, 3_602_345, "After an hour"),
    ]
}

/// Repository backed by a file in a fresh temporary directory
pub fn file_repository() -> Result<(TempDir, Repository)> {
    let dir = create_temp_dir()?;
    let connection = DatabaseConnection::new(dir.path().join("nested").join("subweave.db"))?;
    Ok((dir, Repository::new(connection)))
}

/// Diff engine over an in-memory store and a single mock provider
pub fn mock_engine(mock: &MockProvider) -> DiffEngine {
    init_logging();
    let manager = Arc::new(SubtitleManager::new(Arc::new(MemoryStore::new())));
    let registry = SchedulerRegistry::with_providers(vec![(
        Arc::new(mock.clone()) as Arc<dyn Provider>,
        ProviderProfile::for_provider(mock.kind()),
    )]);
    DiffEngine::new(manager, Arc::new(registry))
}
