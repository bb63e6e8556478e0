/*!
 * Incremental translation.
 *
 * A diff-translate call finds the source segments whose position in the
 * target timeline is still empty, translates up to `batch_size` of them and
 * writes the target back immediately. Callers loop until the target has
 * caught up, so a source that is still being transcribed gets translated as
 * it grows without re-translating the stable prefix.
 *
 * The check is positional: a target with the right length but shifted
 * content after an edit counts as caught up. Placeholders left by alignment
 * count as present.
 *
 * Only one record is diff-translated at a time across the process; every
 * call waits its turn on a single fair lock.
 */

use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::app_config::TranslationProvider;
use crate::errors::TranslationError;
use crate::language_utils::Language;
use crate::subtitle_codec::{Segment, Timeline};
use crate::subtitles::SubtitleManager;

use super::registry::SchedulerRegistry;

// @const: Segments per diff-translate call when the caller gives no size
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// One diff-translate call
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRequest {
    pub subtitles_id: String,
    pub source: Language,
    pub target: Language,
    pub provider: TranslationProvider,
    /// Most segments sent per call, 0 for no bound
    pub batch_size: usize,
}

impl DiffRequest {
    pub fn new(
        subtitles_id: impl Into<String>,
        source: Language,
        target: Language,
        provider: TranslationProvider,
    ) -> Self {
        Self {
            subtitles_id: subtitles_id.into(),
            source,
            target,
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Result of one diff-translate call
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    /// Source and target were already positionally equal
    NoDiff,
    /// A batch was translated and persisted
    Translated {
        /// Segments translated in this call
        translated: usize,
        /// Segments still missing after this call
        remaining: usize,
        /// Billable characters reported by the provider
        word_count: u64,
    },
}

/// Totals of a catch-up loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatchUpReport {
    pub batches: usize,
    pub translated: usize,
    pub word_count: u64,
    pub remaining: usize,
    /// The loop stopped because the token was cancelled
    pub cancelled: bool,
}

/// Source segments whose target position is empty, at most `batch_size`
pub fn diff_segments<'a>(source: &'a [Segment], target: &[Segment], batch_size: usize) -> Vec<&'a Segment> {
    let limit = if batch_size == 0 { usize::MAX } else { batch_size };
    source
        .iter()
        .enumerate()
        .filter(|(index, _)| target.get(*index).is_none())
        .map(|(_, segment)| segment)
        .take(limit)
        .collect()
}

/// Place translations into `target` at the source position with identical timestamps
///
/// Matching is by `start`/`end`, scanning the source forward once, so a
/// translated segment whose interval has disappeared is dropped.
pub fn splice(source: &[Segment], target: &mut Timeline, translated: &[&Segment], texts: Vec<String>) {
    let mut cursor = 0;
    for (segment, text) in translated.iter().zip(texts) {
        while let Some(candidate) = source.get(cursor) {
            cursor += 1;
            if candidate.same_interval(segment) {
                let spliced = Segment {
                    content: text,
                    ..(*segment).clone()
                };
                let slot = cursor - 1;
                if slot < target.len() {
                    target[slot] = spliced;
                } else {
                    target.push(spliced);
                }
                break;
            }
        }
    }
}

/// Drives incremental translation through the scheduler registry
#[derive(Debug)]
pub struct DiffEngine {
    manager: Arc<SubtitleManager>,
    registry: Arc<SchedulerRegistry>,
    waiting_list: Mutex<()>,
}

impl DiffEngine {
    pub fn new(manager: Arc<SubtitleManager>, registry: Arc<SchedulerRegistry>) -> Self {
        Self {
            manager,
            registry,
            waiting_list: Mutex::new(()),
        }
    }

    pub fn manager(&self) -> &Arc<SubtitleManager> {
        &self.manager
    }

    /// Translate the next missing batch of a record
    pub async fn diff_translate(&self, request: &DiffRequest) -> Result<DiffOutcome, TranslationError> {
        debug!("Diff translation queued for {}", request.subtitles_id);
        let _turn = self.waiting_list.lock().await;
        info!(
            "Diff translation started for {} ({} -> {})",
            request.subtitles_id, request.source, request.target
        );
        let outcome = self.run(request).await;
        info!("Diff translation finished for {}", request.subtitles_id);
        outcome
    }

    async fn run(&self, request: &DiffRequest) -> Result<DiffOutcome, TranslationError> {
        let id = request.subtitles_id.as_str();
        if self.manager.get_record(id).await?.is_none() {
            return Err(TranslationError::SubtitlesNotFound(id.to_string()));
        }

        let source = self.manager.get_timeline(id, request.source).await?;
        let mut target = self.manager.get_timeline(id, request.target).await?;

        let missing = diff_segments(&source, &target, request.batch_size);
        if missing.is_empty() {
            info!("No diff for {} ({} segments)", id, source.len());
            return Ok(DiffOutcome::NoDiff);
        }

        let texts: Vec<String> = missing.iter().map(|segment| segment.content.clone()).collect();
        let output = self
            .registry
            .translate(request.provider, &texts, request.source, request.target)
            .await
            .map_err(|e| {
                error!("Diff translation of {} failed: {}", id, e);
                e
            })?;

        splice(&source, &mut target, &missing, output.translations);
        self.manager.save_timeline(id, request.target, &target).await?;

        let saved = self.manager.get_timeline(id, request.target).await?;
        let remaining = diff_segments(&source, &saved, 0).len();
        debug!(
            "Translated {} segments of {}, {} remaining",
            missing.len(),
            id,
            remaining
        );

        Ok(DiffOutcome::Translated {
            translated: missing.len(),
            remaining,
            word_count: output.word_count,
        })
    }

    /// Loop diff-translate until no diff remains, an error occurs, or `cancel` fires
    pub async fn translate_until_caught_up(
        &self,
        request: &DiffRequest,
        cancel: CancellationToken,
    ) -> Result<CatchUpReport, TranslationError> {
        self.translate_until_caught_up_with_progress(request, cancel, |_| {}).await
    }

    /// Same as [`Self::translate_until_caught_up`], reporting after every batch
    pub async fn translate_until_caught_up_with_progress<F>(
        &self,
        request: &DiffRequest,
        cancel: CancellationToken,
        mut on_batch: F,
    ) -> Result<CatchUpReport, TranslationError>
    where
        F: FnMut(&CatchUpReport) + Send,
    {
        let mut report = CatchUpReport::default();

        loop {
            if cancel.is_cancelled() {
                info!(
                    "Catch-up for {} cancelled after {} batches",
                    request.subtitles_id, report.batches
                );
                report.cancelled = true;
                return Ok(report);
            }

            match self.diff_translate(request).await? {
                DiffOutcome::NoDiff => {
                    report.remaining = 0;
                    return Ok(report);
                }
                DiffOutcome::Translated {
                    translated,
                    remaining,
                    word_count,
                } => {
                    report.batches += 1;
                    report.translated += translated;
                    report.word_count += word_count;
                    report.remaining = remaining;
                    on_batch(&report);
                }
            }
        }
    }
}
