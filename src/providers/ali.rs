use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::signing::rpc_signature;
use super::{Provider, TranslateRequest, TranslationOutput, code_string, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const DEFAULT_ENDPOINT: &str = "https://mt.cn-hangzhou.aliyuncs.com";
const API_VERSION: &str = "2018-10-12";

/// Stored under `ALI_MT_SETTINGS`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliCredentials {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
}

impl Credentials for AliCredentials {
    fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AliResponse {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    translated_list: Vec<AliTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliTranslation {
    index: Value,
    #[serde(default)]
    translated: String,
    #[serde(default)]
    word_count: Value,
}

// @returns: Alibaba Cloud language code
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::ZhCn => "zh",
        Language::ZhTw => "zh-tw",
        Language::Hr => "hbs",
        other => other.code(),
    };
    Some(code)
}

/// Map an Alibaba Cloud error code onto the shared taxonomy
pub fn map_error_code(code: &str, message: &str) -> ProviderError {
    if code.starts_with("Throttling") {
        ProviderError::RateLimited(message.to_string())
    } else if code.starts_with("Forbidden")
        || code.starts_with("InvalidAccessKeyId")
        || code == "SignatureDoesNotMatch"
    {
        ProviderError::Forbidden(message.to_string())
    } else {
        ProviderError::unrecognized(code, message)
    }
}

// @returns: Source texts as the `{"0": text, "1": text}` map the API expects
pub fn source_text_map(texts: &[String]) -> String {
    let map: BTreeMap<String, &str> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| (i.to_string(), t.as_str()))
        .collect();
    serde_json::to_string(&map).unwrap_or_default()
}

/// Alibaba Cloud machine translation client (`GetBatchTranslate`)
#[derive(Debug)]
pub struct Ali {
    client: Client,
    store: Arc<dyn KeyValueStore>,
    endpoint: String,
}

impl Ali {
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

    /// Signed RPC parameters for one call
    fn signed_params(
        credentials: &AliCredentials,
        from: &str,
        to: &str,
        texts: &[String],
        nonce: &str,
        timestamp: &str,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let mut params: BTreeMap<String, String> = [
            ("AccessKeyId", credentials.access_key_id.as_str()),
            ("Action", "GetBatchTranslate"),
            ("ApiType", "translate_standard"),
            ("Format", "JSON"),
            ("FormatType", "text"),
            ("Scene", "general"),
            ("SignatureMethod", "HMAC-SHA1"),
            ("SignatureNonce", nonce),
            ("SignatureVersion", "1.0"),
            ("SourceLanguage", from),
            ("TargetLanguage", to),
            ("Timestamp", timestamp),
            ("Version", API_VERSION),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        params.insert("SourceText".to_string(), source_text_map(texts));

        let signature = rpc_signature("POST", &params, &credentials.access_key_secret)?;
        params.insert("Signature".to_string(), signature);
        Ok(params)
    }

    /// Place translations by their index, summing reported word counts
    fn collect(len: usize, items: &[AliTranslation]) -> TranslationOutput {
        let mut translations = vec![String::new(); len];
        let mut word_count = 0;

        for item in items {
            let index = code_string(&item.index).parse::<usize>().ok();
            if let Some(slot) = index.and_then(|i| translations.get_mut(i)) {
                *slot = trim_text(&item.translated);
            }
            word_count += code_string(&item.word_count).parse::<u64>().unwrap_or(0);
        }

        TranslationOutput {
            translations,
            word_count,
        }
    }
}

#[async_trait]
impl Provider for Ali {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Ali
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let from = self.require_code(request.source)?;
        let to = self.require_code(request.target)?;
        let credentials: AliCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let nonce = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let params = Self::signed_params(&credentials, from, to, &request.texts, &nonce, &timestamp)?;

        debug!("Ali request with {} texts", request.texts.len());

        let response = self
            .client
            .post(format!("{}/", self.endpoint.trim_end_matches('/')))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let data: AliResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse Ali response ({}): {}", status, e)))?;

        let code = code_string(&data.code);
        if !status.is_success() || code != "200" {
            let message = data.message.unwrap_or_default();
            error!("Ali API error ({}) {}: {}", status, code, message);
            return Err(map_error_code(&code, &message));
        }

        Ok(Self::collect(request.texts.len(), &data.translated_list))
    }
}
