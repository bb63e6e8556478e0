/*!
 * Subtitle record storage.
 *
 * This module provides:
 * - One record per transcription task
 * - One timeline per language, persisted as WebVTT
 * - Re-alignment of translations when the source timeline changes
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::SubtitleManager;
pub use models::SubtitleRecord;
