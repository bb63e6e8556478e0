use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::signing::sha256_hex;
use super::{Provider, TranslateRequest, TranslationOutput, code_string, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const DEFAULT_ENDPOINT: &str = "https://openapi.youdao.com/v2/api";

/// Stored under `YOUDAO_TRANS_SETTINGS`
#[derive(Debug, Deserialize)]
pub struct YoudaoCredentials {
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub key: String,
}

impl Credentials for YoudaoCredentials {
    fn is_complete(&self) -> bool {
        !self.appid.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YoudaoResponse {
    #[serde(default)]
    error_code: Value,
    #[serde(default)]
    translate_results: Vec<YoudaoTranslation>,
}

#[derive(Debug, Deserialize)]
struct YoudaoTranslation {
    query: String,
    translation: String,
}

// @returns: Youdao language code
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::ZhCn => "zh-CHS",
        Language::ZhTw => "zh-CHT",
        Language::Es => "sp",
        other => other.code(),
    };
    Some(code)
}

/// Input digest for the v3 signature: strings over 20 characters become
/// `first10 + length + last10`
pub fn truncate(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    if len <= 20 {
        return input.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[len - 10..].iter().collect();
    format!("{}{}{}", head, len, tail)
}

// @returns: v3 signature, sha256(appKey + truncate(q) + salt + curtime + key)
pub fn sign(app_key: &str, texts: &[String], salt: &str, curtime: &str, key: &str) -> String {
    let input = truncate(&texts.concat());
    sha256_hex(format!("{}{}{}{}{}", app_key, input, salt, curtime, key).as_bytes())
}

/// Map a Youdao `errorCode` onto the shared taxonomy
pub fn map_error_code(code: &str) -> ProviderError {
    let message = format!("Youdao errorCode {}", code);
    match code {
        "411" => ProviderError::RateLimited(message),
        "401" => ProviderError::QuotaExceeded(message),
        "108" | "202" => ProviderError::Forbidden(message),
        _ => ProviderError::unrecognized(code, message),
    }
}

/// Youdao batch text translation client
#[derive(Debug)]
pub struct Youdao {
    client: Client,
    store: Arc<dyn KeyValueStore>,
    endpoint: String,
}

impl Youdao {
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
impl Provider for Youdao {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Youdao
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let from = self.require_code(request.source)?;
        let to = self.require_code(request.target)?;
        let credentials: YoudaoCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = chrono::Utc::now().timestamp().to_string();
        let sign = sign(&credentials.appid, &request.texts, &salt, &curtime, &credentials.key);

        let mut form: Vec<(&str, &str)> = request.texts.iter().map(|t| ("q", t.as_str())).collect();
        form.extend([
            ("appKey", credentials.appid.as_str()),
            ("salt", salt.as_str()),
            ("from", from),
            ("to", to),
            ("sign", sign.as_str()),
            ("signType", "v3"),
            ("curtime", curtime.as_str()),
        ]);

        debug!("Youdao request with {} texts", request.texts.len());

        let response = self.client.post(&self.endpoint).form(&form).send().await?;

        let data: YoudaoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse Youdao response: {}", e)))?;

        let code = code_string(&data.error_code);
        if code != "0" {
            error!("Youdao API error {}", code);
            return Err(map_error_code(&code));
        }

        let mut word_count = 0;
        let translations = request
            .texts
            .iter()
            .map(|text| match data.translate_results.iter().find(|r| &r.query == text) {
                Some(result) => {
                    word_count += text.chars().count() as u64;
                    trim_text(&result.translation)
                }
                None => String::new(),
            })
            .collect();

        Ok(TranslationOutput {
            translations,
            word_count,
        })
    }
}
