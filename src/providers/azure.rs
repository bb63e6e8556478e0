use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::{Provider, TranslateRequest, TranslationOutput, char_count, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const DEFAULT_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

/// Stored under `AZURE_TRANS_SETTINGS`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    #[serde(default)]
    pub sub_key: String,
    #[serde(default)]
    pub sub_region: String,
}

impl Credentials for AzureCredentials {
    fn is_complete(&self) -> bool {
        !self.sub_key.is_empty() && !self.sub_region.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct AzureText<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AzureResponse {
    Translations(Vec<AzureItem>),
    Failure { error: AzureError },
}

#[derive(Debug, Deserialize)]
struct AzureItem {
    translations: Vec<AzureTranslation>,
}

#[derive(Debug, Deserialize)]
struct AzureTranslation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AzureError {
    code: i64,
    #[serde(default)]
    message: String,
}

// @returns: Azure Translator language code
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::ZhCn => "zh-Hans",
        Language::ZhTw => "zh-Hant",
        Language::No => "nb",
        other => other.code(),
    };
    Some(code)
}

/// Map an Azure six-digit error code onto the shared taxonomy
pub fn map_error_code(code: i64, message: &str) -> ProviderError {
    match code {
        429000 | 429001 | 429002 => ProviderError::RateLimited(message.to_string()),
        403001 => ProviderError::QuotaExceeded(message.to_string()),
        401000..=401999 | 403000..=403999 => ProviderError::Forbidden(message.to_string()),
        _ => ProviderError::unrecognized(code, message),
    }
}

/// Azure Translator v3 client
#[derive(Debug)]
pub struct Azure {
    client: Client,
    store: Arc<dyn KeyValueStore>,
    endpoint: String,
}

impl Azure {
    pub fn new(store: Arc<dyn KeyValueStore>, client: Client) -> Self {
        Self::with_endpoint(store, client, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(store: Arc<dyn KeyValueStore>, client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            store,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Provider for Azure {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Azure
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let from = self.require_code(request.source)?;
        let to = self.require_code(request.target)?;
        let credentials: AzureCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let body: Vec<AzureText> = request.texts.iter().map(|t| AzureText { text: t }).collect();
        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));

        debug!("Azure request with {} texts", request.texts.len());

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", "3.0"), ("from", from), ("to", to)])
            .header("Content-Type", "application/json; charset=UTF-8")
            .header("Ocp-Apim-Subscription-Key", &credentials.sub_key)
            .header("Ocp-Apim-Subscription-Region", &credentials.sub_region)
            .header("X-ClientTraceId", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;

        let data: AzureResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse Azure response: {}", e)))?;

        match data {
            AzureResponse::Failure { error } => {
                error!("Azure API error {}: {}", error.code, error.message);
                Err(map_error_code(error.code, &error.message))
            }
            AzureResponse::Translations(items) => {
                let translations = items
                    .iter()
                    .map(|item| {
                        item.translations
                            .first()
                            .map(|t| trim_text(&t.text))
                            .unwrap_or_default()
                    })
                    .collect();

                Ok(TranslationOutput {
                    translations,
                    word_count: char_count(&request.texts),
                })
            }
        }
    }
}
