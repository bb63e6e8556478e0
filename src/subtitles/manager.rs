/*!
 * Subtitle manager for record and timeline persistence.
 *
 * This module handles:
 * - Creating and loading subtitle records
 * - Storing each language's timeline as built WebVTT
 * - Re-aligning translations when the default timeline is replaced
 * - Importing and exporting subtitle files
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::KeyValueStore;
use crate::language_utils::Language;
use crate::subtitle_codec::{self, Segment, SubtitleFormat, Timeline};
use crate::translation::alignment;

use super::models::{SubtitleRecord, record_key, timeline_key};

/// Subtitle manager over a key-value store
#[derive(Debug, Clone)]
pub struct SubtitleManager {
    /// Persistence collaborator
    store: Arc<dyn KeyValueStore>,
}

impl SubtitleManager {
    /// Create a new subtitle manager with the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Create an empty record with a fresh ID
    pub async fn create_record(&self) -> Result<SubtitleRecord> {
        self.create_record_with_id(&Uuid::new_v4().to_string()).await
    }

    /// Create an empty record under a caller-chosen ID
    pub async fn create_record_with_id(&self, id: &str) -> Result<SubtitleRecord> {
        let record = SubtitleRecord::new(id);
        self.save_record(&record).await?;
        info!("Created subtitle record {}", id);
        Ok(record)
    }

    /// Load a record
    pub async fn get_record(&self, id: &str) -> Result<Option<SubtitleRecord>> {
        let Some(raw) = self.store.get_one(&record_key(id)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw).with_context(|| format!("Corrupt subtitle record {}", id))?;
        Ok(Some(record))
    }

    async fn require_record(&self, id: &str) -> Result<SubtitleRecord> {
        self.get_record(id)
            .await?
            .ok_or_else(|| anyhow!("Subtitles not found: {}", id))
    }

    async fn save_record(&self, record: &SubtitleRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&record_key(&record.id), &raw).await
    }

    /// Remember the user's translation language choice
    pub async fn set_selected_translation_lang(&self, id: &str, language: Option<Language>) -> Result<()> {
        let mut record = self.require_record(id).await?;
        record.selected_translation_lang = language;
        self.save_record(&record).await
    }

    // =========================================================================
    // Timelines
    // =========================================================================

    /// Load a language's timeline, empty when none is stored
    pub async fn get_timeline(&self, id: &str, language: Language) -> Result<Timeline> {
        match self.store.get_one(&timeline_key(id, language)).await? {
            Some(vtt) => subtitle_codec::parse(&vtt, Some(SubtitleFormat::Vtt))
                .with_context(|| format!("Corrupt {} timeline for {}", language, id)),
            None => Ok(Vec::new()),
        }
    }

    fn timeline_entry(id: &str, language: Language, timeline: &[Segment]) -> (String, String) {
        (
            timeline_key(id, language),
            subtitle_codec::build(timeline, SubtitleFormat::Vtt),
        )
    }

    /// Reset a record for a new transcription in `language`
    ///
    /// Drops every stored timeline and the translation preference.
    pub async fn begin_transcription(&self, id: &str, language: Language) -> Result<SubtitleRecord> {
        let mut record = self.require_record(id).await?;
        for stored in std::mem::take(&mut record.languages) {
            self.store.delete(&timeline_key(id, stored)).await?;
        }
        record.selected_translation_lang = None;
        record.default_lang = Some(language);
        self.save_record(&record).await?;

        info!("Subtitles {} cleared for transcription in {}", id, language);
        Ok(record)
    }

    /// Append streamed segments to the default timeline
    pub async fn append_segments(&self, id: &str, segments: &[Segment]) -> Result<Timeline> {
        let mut record = self.require_record(id).await?;
        let language = record
            .default_lang
            .ok_or_else(|| anyhow!("Subtitles {} have no transcription language", id))?;

        let mut timeline = self.get_timeline(id, language).await?;
        timeline.extend_from_slice(segments);

        let mut entries = vec![Self::timeline_entry(id, language, &timeline)];
        if record.add_language(language) {
            entries.push((record_key(id), serde_json::to_string(&record)?));
        }
        self.store.set_many(entries).await?;

        debug!("Appended {} segments to {} ({} total)", segments.len(), id, timeline.len());
        Ok(timeline)
    }

    /// Store a language's timeline
    ///
    /// Saving the default language re-aligns every stored translation onto
    /// it. Saving a translation aligns it onto the default timeline.
    pub async fn save_timeline(&self, id: &str, language: Language, timeline: &[Segment]) -> Result<()> {
        let mut record = self.require_record(id).await?;
        let mut entries = Vec::new();

        match record.default_lang {
            Some(default) if default == language => {
                entries.push(Self::timeline_entry(id, language, timeline));
                for other in record.translations().collect::<Vec<_>>() {
                    let previous = self.get_timeline(id, other).await?;
                    let aligned = alignment::transform(&previous, timeline);
                    debug!(
                        "Re-aligned {} translation of {}: {} -> {} segments",
                        other,
                        id,
                        previous.len(),
                        aligned.len()
                    );
                    entries.push(Self::timeline_entry(id, other, &aligned));
                }
            }
            Some(default) => {
                let reference = self.get_timeline(id, default).await?;
                if reference.is_empty() {
                    entries.push(Self::timeline_entry(id, language, timeline));
                } else {
                    let aligned = alignment::transform(timeline, &reference);
                    entries.push(Self::timeline_entry(id, language, &aligned));
                }
            }
            None => entries.push(Self::timeline_entry(id, language, timeline)),
        }

        if record.add_language(language) {
            entries.push((record_key(id), serde_json::to_string(&record)?));
        }
        self.store.set_many(entries).await?;

        debug!("Saved {} timeline for {} ({} segments)", language, id, timeline.len());
        Ok(())
    }

    /// Drop one language's timeline
    pub async fn clear_timeline(&self, id: &str, language: Language) -> Result<()> {
        let mut record = self.require_record(id).await?;
        self.store.delete(&timeline_key(id, language)).await?;
        if record.remove_language(language) {
            self.save_record(&record).await?;
        }
        info!("Cleared {} timeline for {}", language, id);
        Ok(())
    }

    // =========================================================================
    // Import / Export
    // =========================================================================

    /// Replace a record's content with an imported subtitle file
    ///
    /// Every stored language is dropped and `language` becomes the default.
    pub async fn import(&self, id: &str, content: &str, language: Language) -> Result<Timeline> {
        let timeline = subtitle_codec::parse(content, None)?;

        let mut record = match self.get_record(id).await? {
            Some(record) => record,
            None => SubtitleRecord::new(id),
        };
        for stored in std::mem::take(&mut record.languages) {
            self.store.delete(&timeline_key(id, stored)).await?;
        }
        record.selected_translation_lang = None;
        record.default_lang = Some(language);
        record.add_language(language);

        self.store
            .set_many(vec![
                Self::timeline_entry(id, language, &timeline),
                (record_key(id), serde_json::to_string(&record)?),
            ])
            .await?;

        info!("Imported {} segments into {} as {}", timeline.len(), id, language);
        Ok(timeline)
    }

    /// Build a stored timeline in any format, bilingual when `secondary` is given
    pub async fn export(
        &self,
        id: &str,
        language: Language,
        secondary: Option<Language>,
        format: SubtitleFormat,
    ) -> Result<String> {
        self.require_record(id).await?;
        let primary = self.get_timeline(id, language).await?;
        let timeline = match secondary {
            Some(other) => subtitle_codec::merge_bilingual(&primary, &self.get_timeline(id, other).await?),
            None => primary,
        };
        Ok(subtitle_codec::build(&timeline, format))
    }
}
