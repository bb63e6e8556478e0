/*!
 * Subtitle record model and storage keys.
 */

use serde::{Deserialize, Serialize};

use crate::language_utils::Language;

/// One record per transcription task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Record ID
    pub id: String,
    /// Language the media was transcribed in
    #[serde(default)]
    pub default_lang: Option<Language>,
    /// Translation language last chosen by the user
    #[serde(default)]
    pub selected_translation_lang: Option<Language>,
    /// Languages with a stored timeline
    #[serde(default)]
    pub languages: Vec<Language>,
}

impl SubtitleRecord {
    /// Create an empty record
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_lang: None,
            selected_translation_lang: None,
            languages: Vec::new(),
        }
    }

    pub fn has_language(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    pub(crate) fn add_language(&mut self, language: Language) -> bool {
        if self.has_language(language) {
            return false;
        }
        self.languages.push(language);
        true
    }

    pub(crate) fn remove_language(&mut self, language: Language) -> bool {
        let before = self.languages.len();
        self.languages.retain(|l| *l != language);
        self.languages.len() != before
    }

    /// Stored languages other than the default
    pub fn translations(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages
            .iter()
            .copied()
            .filter(move |l| Some(*l) != self.default_lang)
    }
}

// @returns: Key holding the record JSON
pub fn record_key(id: &str) -> String {
    format!("subtitles:{}", id)
}

// @returns: Key holding one language's timeline as WebVTT
pub fn timeline_key(id: &str, language: Language) -> String {
    format!("subtitles:{}:{}", id, language.code())
}
