/*!
 * # subweave - Incremental subtitle translation
 *
 * A Rust library for keeping translated subtitle tracks in step with a
 * source track that is still being transcribed or edited.
 *
 * ## Features
 *
 * - Read and write WebVTT, SubRip, LRC, SubViewer, SAMI and MicroDVD
 * - Translate through machine-translation back-ends:
 *   - Baidu, Youdao, Azure, DeepL, Volcengine (Huoshan), Alibaba Cloud
 * - Per-provider rate limiting with batching and retry
 * - Incremental translation that only sends what is missing
 * - Re-alignment of translations after the source is edited
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_codec`: Subtitle format detection, parsing and building
 * - `providers`: Client implementations for the translation back-ends
 * - `translation`: Scheduling and incremental translation:
 *   - `translation::scheduler`: Rate-limited batch queue per provider
 *   - `translation::diff`: Diff-translate engine
 *   - `translation::alignment`: Timeline re-alignment
 * - `subtitles`: Record and timeline persistence
 * - `database`: Key-value store implementations
 * - `language_utils`: Language identifiers
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod subtitle_codec;
pub mod subtitles;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, TranslationProvider};
pub use database::{KeyValueStore, MemoryStore, Repository};
pub use errors::{ErrorKind, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{Language, get_language_name};
pub use subtitle_codec::{Segment, SubtitleFormat, Timeline};
pub use subtitles::{SubtitleManager, SubtitleRecord};
pub use translation::{DiffEngine, DiffOutcome, DiffRequest, SchedulerRegistry};
