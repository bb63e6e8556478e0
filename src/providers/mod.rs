/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the machine-translation
 * back-ends:
 * - Baidu: MD5-signed form request
 * - Youdao: SHA-256 signed form request
 * - Azure: API-key headers
 * - DeepL: bearer-style auth key
 * - Huoshan (Volcengine): HMAC-SHA256 canonical request
 * - Ali: RPC-style HMAC-SHA1 signature
 *
 * Every adapter reads its credentials from the key-value store on each
 * call and maps back-end failures onto the shared [`ErrorKind`](crate::errors::ErrorKind).
 */

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

pub mod ali;
pub mod azure;
pub mod baidu;
pub mod credentials;
pub mod deepl;
pub mod huoshan;
pub mod mock;
pub mod signing;
pub mod youdao;

/// Connect timeout for outbound calls; no overall timeout is applied
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// One batch of texts to translate
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    /// Texts in caller order
    pub texts: Vec<String>,
    /// Source language
    pub source: Language,
    /// Target language
    pub target: Language,
}

impl TranslateRequest {
    pub fn new(texts: Vec<String>, source: Language, target: Language) -> Self {
        Self { texts, source, target }
    }
}

/// Translations aligned with the request texts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationOutput {
    /// One translation per input text, same order
    pub translations: Vec<String>,
    /// Billable characters reported or computed for the call
    pub word_count: u64,
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing the scheduler to drive them interchangeably.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Which back-end this is
    fn kind(&self) -> TranslationProvider;

    /// Provider code for an internal language, `None` when unsupported
    fn language_code(&self, language: Language) -> Option<&'static str>;

    /// Languages that have an entry in the code table
    fn supported_languages(&self) -> Vec<Language> {
        Language::ALL
            .iter()
            .copied()
            .filter(|l| self.language_code(*l).is_some())
            .collect()
    }

    /// Provider code or an `UnsupportedLanguage` error
    fn require_code(&self, language: Language) -> Result<&'static str, ProviderError> {
        self.language_code(language)
            .ok_or_else(|| ProviderError::UnsupportedLanguage {
                provider: self.kind().display_name().to_string(),
                language: language.code().to_string(),
            })
    }

    /// Translate one batch
    ///
    /// # Returns
    /// * `Result<TranslationOutput, ProviderError>` - one translation per input text, or an error
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError>;
}

/// Trim whitespace and one trailing Chinese full stop, comma or enumeration comma
pub fn trim_text(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_suffix(['。', '，', '、'])
        .unwrap_or(trimmed)
        .to_string()
}

/// Character count of the texts, the unit back-ends bill by
pub(crate) fn char_count<S: AsRef<str>>(texts: &[S]) -> u64 {
    texts.iter().map(|t| t.as_ref().chars().count() as u64).sum()
}

/// Error codes arrive as numbers or strings depending on the back-end
pub(crate) fn code_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Shared HTTP client settings
pub fn http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Languages a provider offers, for language-selection menus
pub fn supported_languages(provider: TranslationProvider) -> Vec<Language> {
    let table: fn(Language) -> Option<&'static str> = match provider {
        TranslationProvider::Baidu => baidu::language_code,
        TranslationProvider::Ali => ali::language_code,
        TranslationProvider::Youdao => youdao::language_code,
        TranslationProvider::Huoshan => huoshan::language_code,
        TranslationProvider::Azure => azure::language_code,
        TranslationProvider::DeepL => deepl::language_code,
    };
    Language::ALL.iter().copied().filter(|l| table(*l).is_some()).collect()
}

/// Construct the real adapter for a provider
pub fn build_provider(
    provider: TranslationProvider,
    store: Arc<dyn KeyValueStore>,
    client: Client,
) -> Arc<dyn Provider> {
    match provider {
        TranslationProvider::Baidu => Arc::new(baidu::Baidu::new(store, client)),
        TranslationProvider::Ali => Arc::new(ali::Ali::new(store, client)),
        TranslationProvider::Youdao => Arc::new(youdao::Youdao::new(store, client)),
        TranslationProvider::Huoshan => Arc::new(huoshan::Huoshan::new(store, client)),
        TranslationProvider::Azure => Arc::new(azure::Azure::new(store, client)),
        TranslationProvider::DeepL => Arc::new(deepl::DeepL::new(store, client)),
    }
}
