/*!
 * Translation orchestration.
 *
 * This module drives the provider adapters. It is split into several
 * submodules:
 *
 * - `batch`: Splitting a text list into provider-sized sub-batches
 * - `concurrency`: Per-provider rate and payload tuning
 * - `scheduler`: The rate-limited queue in front of each provider
 * - `registry`: One scheduler per provider, shared process-wide
 * - `diff`: Incremental translation of a growing timeline
 * - `alignment`: Carrying translations onto a revised source timeline
 */

// Re-export main types for easier usage
pub use self::batch::{BatchLimit, TranslationBatchJob, split_into_batches};
pub use self::concurrency::ProviderProfile;
pub use self::diff::{CatchUpReport, DiffEngine, DiffOutcome, DiffRequest};
pub use self::registry::SchedulerRegistry;
pub use self::scheduler::{RateLimitedScheduler, RateWindow};

// Submodules
pub mod alignment;
pub mod batch;
pub mod concurrency;
pub mod diff;
pub mod registry;
pub mod scheduler;
