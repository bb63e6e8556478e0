use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::{Provider, TranslateRequest, TranslationOutput, char_count, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const FREE_ORIGIN: &str = "https://api-free.deepl.com";
const PRO_ORIGIN: &str = "https://api.deepl.com";

/// DeepL account plan, decides the API origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepLAccountType {
    #[default]
    Free,
    Pro,
}

/// Stored under `DEEPL_TRANS_SETTINGS`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLCredentials {
    #[serde(default)]
    pub auth_key: String,
    #[serde(default)]
    pub deepl_acc_type: DeepLAccountType,
}

impl Credentials for DeepLCredentials {
    fn is_complete(&self) -> bool {
        !self.auth_key.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: &'a [String],
    source_lang: &'a str,
    target_lang: &'a str,
    split_sentences: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

// @returns: DeepL language code, `None` for languages DeepL lacks
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::En => "EN",
        Language::ZhCn => "ZH",
        Language::Ja => "JA",
        Language::Ko => "KO",
        Language::Fr => "FR",
        Language::Es => "ES",
        Language::Ru => "RU",
        Language::De => "DE",
        Language::Pt => "PT",
        Language::It => "IT",
        Language::Id => "ID",
        Language::Tr => "TR",
        Language::El => "EL",
        Language::Pl => "PL",
        Language::Nl => "NL",
        Language::Hu => "HU",
        Language::No => "NB",
        Language::Sv => "SV",
        Language::Fi => "FI",
        Language::Cs => "CS",
        Language::Da => "DA",
        Language::Lt => "LT",
        Language::Sk => "SK",
        Language::Ro => "RO",
        Language::Bg => "BG",
        _ => return None,
    };
    Some(code)
}

/// Map a non-success HTTP status onto the shared taxonomy
pub fn map_status(status: StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited(body.to_string()),
        456 => ProviderError::QuotaExceeded(body.to_string()),
        403 => ProviderError::Forbidden(body.to_string()),
        code => ProviderError::unrecognized(code, body),
    }
}

/// DeepL v2 translate client
#[derive(Debug)]
pub struct DeepL {
    client: Client,
    store: Arc<dyn KeyValueStore>,
    /// Fixed origin, replaces the plan-derived one when set
    origin: Option<String>,
}

impl DeepL {
    pub fn new(store: Arc<dyn KeyValueStore>, client: Client) -> Self {
        Self {
            client,
            store,
            origin: None,
        }
    }

    pub fn with_origin(store: Arc<dyn KeyValueStore>, client: Client, origin: impl Into<String>) -> Self {
        Self {
            client,
            store,
            origin: Some(origin.into()),
        }
    }

    fn origin_for(&self, account: DeepLAccountType) -> &str {
        match (&self.origin, account) {
            (Some(origin), _) => origin.as_str(),
            (None, DeepLAccountType::Pro) => PRO_ORIGIN,
            (None, DeepLAccountType::Free) => FREE_ORIGIN,
        }
    }
}

#[async_trait]
impl Provider for DeepL {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::DeepL
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let source_lang = self.require_code(request.source)?;
        let target_lang = self.require_code(request.target)?;
        let credentials: DeepLCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let url = format!("{}/v2/translate", self.origin_for(credentials.deepl_acc_type).trim_end_matches('/'));
        let body = DeepLRequest {
            text: &request.texts,
            source_lang,
            target_lang,
            split_sentences: "0",
        };

        debug!("DeepL request with {} texts", request.texts.len());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Authorization", format!("DeepL-Auth-Key {}", credentials.auth_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            return Err(map_status(status, &error_text));
        }

        let data: DeepLResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse DeepL response: {}", e)))?;

        if let Some(message) = data.message {
            error!("DeepL API error: {}", message);
            return Err(ProviderError::unrecognized(status.as_u16(), message));
        }

        Ok(TranslationOutput {
            translations: data.translations.iter().map(|t| trim_text(&t.text)).collect(),
            word_count: char_count(&request.texts),
        })
    }
}
