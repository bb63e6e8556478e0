use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::credentials::{Credentials, load_credentials};
use super::signing::{CanonicalRequest, canonical_query, sha256_hex};
use super::{Provider, TranslateRequest, TranslationOutput, char_count, trim_text};
use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;

const DEFAULT_ENDPOINT: &str = "https://translate.volcengineapi.com";
const REGION: &str = "cn-north-1";
const SERVICE: &str = "translate";
const ACTION: &str = "TranslateText";
const VERSION: &str = "2020-06-01";

/// Stored under `HUOSHAN_MT_SETTINGS`
#[derive(Debug, Deserialize)]
pub struct HuoshanCredentials {
    #[serde(default, rename = "accessKeyID")]
    pub access_key_id: String,
    #[serde(default, rename = "secretAccessKey")]
    pub secret_access_key: String,
}

impl Credentials for HuoshanCredentials {
    fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HuoshanRequest<'a> {
    source_language: &'a str,
    target_language: &'a str,
    text_list: &'a [String],
}

#[derive(Debug, Deserialize)]
struct HuoshanResponse {
    #[serde(rename = "ResponseMetadata", alias = "ResponseMetaData", default)]
    metadata: HuoshanMetadata,
    #[serde(rename = "TranslationList", default)]
    translation_list: Vec<HuoshanTranslation>,
}

#[derive(Debug, Default, Deserialize)]
struct HuoshanMetadata {
    #[serde(rename = "Error", default)]
    error: Option<HuoshanError>,
}

#[derive(Debug, Deserialize)]
struct HuoshanError {
    #[serde(rename = "CodeN", default)]
    code_n: i64,
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct HuoshanTranslation {
    #[serde(rename = "Translation")]
    translation: String,
}

// @returns: Volcengine language code
pub fn language_code(language: Language) -> Option<&'static str> {
    let code = match language {
        Language::ZhCn => "zh",
        Language::ZhTw => "zh-Hant",
        other => other.code(),
    };
    Some(code)
}

/// Map a Volcengine `CodeN` onto the shared taxonomy
pub fn map_error_code(code_n: i64, code: &str, message: &str) -> ProviderError {
    match code_n {
        -429 => ProviderError::RateLimited(message.to_string()),
        _ if code.starts_with("AccessDenied") || code.starts_with("SignatureDoesNotMatch") => {
            ProviderError::Forbidden(message.to_string())
        }
        _ => ProviderError::unrecognized(code_n, format!("{} {}", code, message).trim()),
    }
}

/// Volcengine machine translation client
#[derive(Debug)]
pub struct Huoshan {
    client: Client,
    store: Arc<dyn KeyValueStore>,
    endpoint: String,
}

impl Huoshan {
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

    fn host(&self) -> Result<String, ProviderError> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| ProviderError::RequestFailed(format!("Endpoint {} has no host", self.endpoint)))?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

#[async_trait]
impl Provider for Huoshan {
    fn kind(&self) -> TranslationProvider {
        TranslationProvider::Huoshan
    }

    fn language_code(&self, language: Language) -> Option<&'static str> {
        language_code(language)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationOutput, ProviderError> {
        let source_language = self.require_code(request.source)?;
        let target_language = self.require_code(request.target)?;
        let credentials: HuoshanCredentials = load_credentials(self.store.as_ref(), self.kind()).await?;

        let body = serde_json::to_string(&HuoshanRequest {
            source_language,
            target_language,
            text_list: &request.texts,
        })
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let body_hash = sha256_hex(body.as_bytes());

        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let query = BTreeMap::from([
            ("Action".to_string(), ACTION.to_string()),
            ("Version".to_string(), VERSION.to_string()),
        ]);
        let headers = [
            ("Content-Type", "application/json; charset=utf-8".to_string()),
            ("Host", self.host()?),
            ("X-Date", timestamp.clone()),
            ("X-Content-Sha256", body_hash.clone()),
        ];
        let authorization = CanonicalRequest {
            method: "POST",
            uri: "/",
            query: &query,
            headers: &headers,
            body_hash: &body_hash,
        }
        .authorization(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            &timestamp,
            REGION,
            SERVICE,
        )?;

        debug!("Volcengine request with {} texts", request.texts.len());

        let url = format!("{}/?{}", self.endpoint.trim_end_matches('/'), canonical_query(&query));
        let mut builder = self.client.post(&url).header("Authorization", authorization);
        for (name, value) in &headers {
            builder = builder.header(*name, value);
        }

        let response = builder.body(body).send().await?;

        let data: HuoshanResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to parse Volcengine response: {}", e)))?;

        if let Some(err) = data.metadata.error {
            error!("Volcengine API error {} ({}): {}", err.code_n, err.code, err.message);
            return Err(map_error_code(err.code_n, &err.code, &err.message));
        }

        Ok(TranslationOutput {
            translations: data
                .translation_list
                .iter()
                .map(|t| trim_text(&t.translation))
                .collect(),
            word_count: char_count(&request.texts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_mapErrorCode_withThrottleCode_shouldBeRateLimited() {
        assert_eq!(map_error_code(-429, "", "").kind(), ErrorKind::RateLimited);
        assert_eq!(
            map_error_code(100009, "SignatureDoesNotMatch", "").kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(map_error_code(-400, "InvalidArgument", "").kind(), ErrorKind::UnrecognizedErrorCode);
    }

    #[test]
    fn test_response_withErrorMetadata_shouldDecode() {
        let data: HuoshanResponse = serde_json::from_str(
            r#"{"ResponseMetadata":{"RequestId":"x","Error":{"CodeN":-429,"Code":"FlowLimitExceeded","Message":"slow"}}}"#,
        )
        .unwrap();

        let err = data.metadata.error.unwrap();
        assert_eq!(err.code_n, -429);
        assert!(data.translation_list.is_empty());
    }

    #[test]
    fn test_request_shouldSerializePascalCase() {
        let texts = vec!["hi".to_string()];
        let body = serde_json::to_string(&HuoshanRequest {
            source_language: "en",
            target_language: "zh",
            text_list: &texts,
        })
        .unwrap();

        assert_eq!(body, r#"{"SourceLanguage":"en","TargetLanguage":"zh","TextList":["hi"]}"#);
    }

    #[test]
    fn test_host_withPort_shouldKeepPort() {
        let store = Arc::new(crate::database::MemoryStore::new());
        let provider = Huoshan::with_endpoint(store, Client::new(), "http://127.0.0.1:8080");
        assert_eq!(provider.host().unwrap(), "127.0.0.1:8080");
    }
}
