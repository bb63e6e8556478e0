/*!
 * Per-provider rate-limited batch scheduler.
 *
 * One [`RateLimitedScheduler`] exists per back-end. It owns a FIFO queue of
 * batch jobs and a sliding window of recent dispatch instants. A single
 * drain task per scheduler admits jobs while the window has room, sleeps
 * until the oldest stamp ages out when it does not, and keeps a minimum
 * spacing between dispatches. Submissions made while the drain task runs
 * only enqueue.
 *
 * Calls are split into sub-batches by the provider's payload limit. A
 * failed sub-batch is re-queued after a linear backoff; once its retries
 * are spent the whole call fails and partial results are discarded.
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::errors::ProviderError;
use crate::language_utils::Language;
use crate::providers::{Provider, TranslationOutput};

use super::batch::TranslationBatchJob;
use super::concurrency::ProviderProfile;

type JobResult = Result<TranslationOutput, ProviderError>;

/// Sliding window of dispatch instants
#[derive(Debug, Clone)]
pub struct RateWindow {
    stamps: VecDeque<Instant>,
    limit: usize,
    period: Duration,
    padding: Duration,
}

impl RateWindow {
    pub fn new(limit: u32, period: Duration, padding: Duration) -> Self {
        Self {
            stamps: VecDeque::new(),
            limit: limit.max(1) as usize,
            period,
            padding,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.stamps.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Wait required before the next dispatch, `None` when one may go now
    pub fn admission_delay(&mut self, now: Instant) -> Option<Duration> {
        self.prune(now);
        if self.stamps.len() < self.limit {
            return None;
        }
        let oldest = self.stamps[self.stamps.len() - self.limit];
        let ages_out = oldest + self.period;
        Some(ages_out.saturating_duration_since(now) + self.padding)
    }

    /// Record a dispatch
    pub fn record(&mut self, now: Instant) {
        self.stamps.push_back(now);
    }

    /// Dispatches inside the trailing period
    pub fn in_window(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.stamps.len()
    }
}

#[derive(Debug)]
struct QueuedJob {
    job: TranslationBatchJob,
    attempt: u32,
    reply: oneshot::Sender<JobResult>,
}

#[derive(Debug)]
struct SchedulerState {
    queue: VecDeque<QueuedJob>,
    window: RateWindow,
    running: bool,
}

enum Step {
    Wait(Duration),
    Dispatch(QueuedJob),
}

#[derive(Debug)]
struct SchedulerInner {
    provider: Arc<dyn Provider>,
    profile: ProviderProfile,
    state: Mutex<SchedulerState>,
}

impl SchedulerInner {
    fn enqueue(self: &Arc<Self>, queued: QueuedJob) {
        let start = {
            let mut state = self.state.lock();
            state.queue.push_back(queued);
            !std::mem::replace(&mut state.running, true)
        };

        if start {
            tokio::spawn(Self::drain(Arc::clone(self)));
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let step = {
                let mut state = self.state.lock();
                if state.queue.is_empty() {
                    state.running = false;
                    return;
                }
                let now = Instant::now();
                match state.window.admission_delay(now) {
                    Some(delay) => Step::Wait(delay),
                    None => {
                        state.window.record(now);
                        match state.queue.pop_front() {
                            Some(queued) => Step::Dispatch(queued),
                            None => continue,
                        }
                    }
                }
            };

            match step {
                Step::Wait(delay) => {
                    debug!(
                        "{} window full, waiting {:?}",
                        self.provider.kind().display_name(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Step::Dispatch(queued) => {
                    debug!(
                        "{} dispatching {} texts (offset {:?}, attempt {})",
                        self.provider.kind().display_name(),
                        queued.job.texts.len(),
                        queued.job.offset,
                        queued.attempt + 1
                    );
                    tokio::spawn(Self::dispatch(Arc::clone(&self), queued));
                    tokio::time::sleep(self.profile.min_spacing).await;
                }
            }
        }
    }

    async fn dispatch(self: Arc<Self>, queued: QueuedJob) {
        let expected = queued.job.texts.len();
        let result = self
            .provider
            .translate(&queued.job.to_request())
            .await
            .and_then(|output| {
                if output.translations.len() == expected {
                    Ok(output)
                } else {
                    Err(ProviderError::RequestFailed(format!(
                        "expected {} translations, received {}",
                        expected,
                        output.translations.len()
                    )))
                }
            });

        match result {
            Err(e) if e.is_retryable() && queued.attempt < self.profile.retry_count => {
                let attempt = queued.attempt + 1;
                let backoff = self.profile.retry_backoff * attempt;
                warn!(
                    "{} batch at offset {:?} failed ({}), retry {} in {:?}",
                    self.provider.kind().display_name(),
                    queued.job.offset,
                    e,
                    attempt,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                self.enqueue(QueuedJob { attempt, ..queued });
            }
            result => {
                // Receiver gone means the caller stopped waiting
                let _ = queued.reply.send(result);
            }
        }
    }
}

/// Rate-limited scheduler for one provider
#[derive(Debug, Clone)]
pub struct RateLimitedScheduler {
    inner: Arc<SchedulerInner>,
}

impl RateLimitedScheduler {
    pub fn new(provider: Arc<dyn Provider>, profile: ProviderProfile) -> Self {
        let window = RateWindow::new(profile.qps, profile.window, profile.admission_padding);
        Self {
            inner: Arc::new(SchedulerInner {
                provider,
                profile,
                state: Mutex::new(SchedulerState {
                    queue: VecDeque::new(),
                    window,
                    running: false,
                }),
            }),
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.inner.provider
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.inner.profile
    }

    /// Jobs waiting for admission
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Enqueue one job; the receiver resolves once it succeeds or runs out of retries
    pub fn submit(&self, job: TranslationBatchJob) -> oneshot::Receiver<JobResult> {
        let (reply, receiver) = oneshot::channel();
        self.inner.enqueue(QueuedJob {
            job,
            attempt: 0,
            reply,
        });
        receiver
    }

    /// Translate a full text list, splitting by the provider's limit
    ///
    /// Resolves once every sub-batch has finished. Any terminal sub-batch
    /// failure fails the whole call.
    pub async fn translate(
        &self,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<TranslationOutput, ProviderError> {
        if texts.is_empty() {
            return Ok(TranslationOutput::default());
        }

        let provider = &self.inner.provider;
        provider.require_code(source)?;
        provider.require_code(target)?;

        let jobs = TranslationBatchJob::split(
            provider.kind(),
            texts,
            source,
            target,
            self.inner.profile.batch_limit,
        );
        debug!(
            "{} translating {} texts in {} batches",
            provider.kind().display_name(),
            texts.len(),
            jobs.len()
        );

        let pending: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let offset = job.offset.clone();
                let receiver = self.submit(job);
                async move { (offset, receiver.await) }
            })
            .collect();

        let mut translations = vec![String::new(); texts.len()];
        let mut word_count = 0;
        let mut failure = None;

        for (offset, result) in join_all(pending).await {
            match result {
                Ok(Ok(output)) => {
                    for (slot, text) in translations[offset].iter_mut().zip(output.translations) {
                        *slot = text;
                    }
                    word_count += output.word_count;
                }
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(_) => {
                    failure.get_or_insert(ProviderError::RequestFailed(
                        "scheduler dropped the batch".to_string(),
                    ));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(TranslationOutput {
                translations,
                word_count,
            }),
        }
    }
}
