/*!
 * Request signing primitives shared by the provider adapters.
 *
 * - digest helpers (MD5, SHA-256) rendered as lowercase hex
 * - RFC 3986 percent-encoding used by canonical query strings
 * - [`CanonicalRequest`]: Volcengine-style HMAC-SHA256 request signing
 * - [`rpc_signature`]: Alibaba Cloud RPC HMAC-SHA1 signature
 */

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use md5::Md5;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::errors::ProviderError;

/// Unreserved characters per RFC 3986 stay literal, everything else is escaped
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Algorithm name in the Volcengine authorization header
pub const VOLC_ALGORITHM: &str = "HMAC-SHA256";

// @returns: Lowercase hex MD5 digest
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

// @returns: Lowercase hex SHA-256 digest
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

fn invalid_key(error: hmac::digest::InvalidLength) -> ProviderError {
    ProviderError::RequestFailed(format!("Invalid signing key: {}", error))
}

// @returns: Raw HMAC-SHA256 of `data` under `key`
pub fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, ProviderError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

// @returns: Base64 HMAC-SHA1 of `data` under `key`
pub fn hmac_sha1_base64(key: &[u8], data: &str) -> Result<String, ProviderError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(invalid_key)?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

// @returns: RFC 3986 percent-encoded string
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

// @returns: `k=v&k=v` with keys sorted and both sides percent-encoded
pub fn canonical_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Request description signed with a derived per-date/region/service key
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub query: &'a BTreeMap<String, String>,
    pub headers: &'a [(&'a str, String)],
    pub body_hash: &'a str,
}

impl CanonicalRequest<'_> {
    /// Headers sorted by lower-cased name, as `(canonical block, signed list)`
    fn header_info(&self) -> (String, String) {
        let mut headers: Vec<(String, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.trim()))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect::<String>();
        let signed = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        (canonical, signed)
    }

    /// Canonical request text
    pub fn to_canonical_string(&self) -> String {
        let (canonical_headers, signed_headers) = self.header_info();
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.uri,
            canonical_query(self.query),
            canonical_headers,
            signed_headers,
            self.body_hash
        )
    }

    /// Authorization header value for the request
    ///
    /// `timestamp` is the `X-Date` value (`YYYYMMDDTHHMMSSZ`); its first eight
    /// characters are the credential date.
    pub fn authorization(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
        timestamp: &str,
        region: &str,
        service: &str,
    ) -> Result<String, ProviderError> {
        let date = timestamp.get(..8).unwrap_or(timestamp);
        let credential_scope = format!("{}/{}/{}/request", date, region, service);
        let (_, signed_headers) = self.header_info();

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            VOLC_ALGORITHM,
            timestamp,
            credential_scope,
            sha256_hex(self.to_canonical_string().as_bytes())
        );

        let k_date = hmac_sha256(secret_access_key.as_bytes(), date)?;
        let k_region = hmac_sha256(&k_date, region)?;
        let k_service = hmac_sha256(&k_region, service)?;
        let k_signing = hmac_sha256(&k_service, "request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, &string_to_sign)?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            VOLC_ALGORITHM, access_key_id, credential_scope, signed_headers, signature
        ))
    }
}

// @returns: Alibaba Cloud RPC signature over the sorted parameters
pub fn rpc_signature(
    method: &str,
    params: &BTreeMap<String, String>,
    secret: &str,
) -> Result<String, ProviderError> {
    let string_to_sign = format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    );
    hmac_sha1_base64(format!("{}&", secret).as_bytes(), &string_to_sign)
}
