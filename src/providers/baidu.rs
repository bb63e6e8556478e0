use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::signing::md5_hex;
use super::{Provider, TranslateRequest, TranslationOutput, code_string, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const DEFAULT_ENDPOINT: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

/// Stored under `BAIDU_MT_SETTINGS`
#[derive(Debug, Deserialize)]
pub struct BaiduCredentials {
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub key: String,
}

impl Credentials for BaiduCredentials {
    fn is_complete(&self) -> bool {
        !self.appid.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct BaiduResponse {
    #[serde(default)]
    error_code: Option<Value>,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    trans_result: Vec<BaiduTranslation>,
}

#[derive(Debug, Deserialize)]
struct BaiduTranslation {
    src: String,
    dst: String,
}

// @returns: Baidu language code
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::ZhCn => "zh",
        Language::ZhTw => "cht",
        Language::Ja => "jp",
        Language::Ko => "kor",
        Language::Fr => "fra",
        Language::Es => "spa",
        Language::Ar => "ara",
        Language::Vi => "vie",
        Language::He => "heb",
        Language::No => "nor",
        Language::Sv => "swe",
        Language::Da => "dan",
        Language::Lt => "lit",
        Language::Ms => "may",
        Language::Ro => "rom",
        Language::Bg => "bul",
        Language::Hr => "hrv",
        Language::Lo => "lao",
        Language::Ur => "urd",
        Language::Ta => "tam",
        other => other.code(),
    };
    Some(code)
}

// @returns: Request signature, md5(appid + q + salt + key)
pub fn sign(appid: &str, query: &str, salt: &str, key: &str) -> String {
    md5_hex(&format!("{}{}{}{}", appid, query, salt, key))
}

/// Map a Baidu `error_code` onto the shared taxonomy
pub fn map_error_code(code: &str, message: &str) -> ProviderError {
    match code {
        "54003" => ProviderError::RateLimited(message.to_string()),
        "54004" => ProviderError::QuotaExceeded(message.to_string()),
        "58003" | "52003" => ProviderError::Forbidden(message.to_string()),
        _ => ProviderError::unrecognized(code, message),
    }
}

/// Baidu Fanyi general translation client
#[derive(Debug)]
pub struct Baidu {
    /// HTTP client for API requests
    client: Client,
    /// Credential source
    store: Arc<dyn KeyValueStore>,
    /// API endpoint URL
    endpoint: String,
}

impl Baidu {
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

    /// Splice results back by source text; unmatched inputs become empty
    fn collect(texts: &[String], results: &[BaiduTranslation]) -> TranslationOutput {
        let mut word_count = 0;
        let translations = texts
            .iter()
            .map(|text| match results.iter().find(|r| &r.src == text) {
                Some(result) => {
                    word_count += text.chars().count() as u64;
                    trim_text(&result.dst)
                }
                None => String::new(),
            })
            .collect();

        TranslationOutput {
            translations,
            word_count,
        }
    }
}

#[async_trait]
impl Provider for Baidu {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Baidu
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let from = self.require_code(request.source)?;
        let to = self.require_code(request.target)?;
        let credentials: BaiduCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let query = request.texts.join("\n");
        let salt = rand::random::<u32>().to_string();
        let sign = sign(&credentials.appid, &query, &salt, &credentials.key);

        debug!("Baidu request with {} texts", request.texts.len());

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("q", query.as_str()),
                ("appid", credentials.appid.as_str()),
                ("salt", salt.as_str()),
                ("from", from),
                ("to", to),
                ("sign", sign.as_str()),
            ])
            .send()
            .await?;

        let data: BaiduResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse Baidu response: {}", e)))?;

        if let Some(code) = data.error_code.as_ref().map(code_string).filter(|c| !c.is_empty() && c != "52000") {
            let message = data.error_msg.unwrap_or_default();
            error!("Baidu API error {}: {}", code, message);
            return Err(map_error_code(&code, &message));
        }

        Ok(Self::collect(&request.texts, &data.trans_result))
    }
}
