/*!
 * Credential lookup.
 *
 * Credentials are JSON objects in the key-value store, fetched on every
 * call so an edit applies to the next request without a restart.
 */

use log::error;
use serde::de::DeserializeOwned;

use crate::app_config::TranslationProvider;
use crate::database::KeyValueStore;
use crate::errors::ProviderError;

/// Credential objects whose required fields can be checked
pub trait Credentials: DeserializeOwned {
    /// Whether every required field is present and non-empty
    fn is_complete(&self) -> bool;
}

/// Fetch and decode the credential object for `provider`
pub async fn load_credentials<T: Credentials>(
    store: &dyn KeyValueStore,
    provider: TranslationProvider,
) -> Result<T, ProviderError> {
    let key = provider.credentials_key();

    let raw = store.get_one(key).await.map_err(|e| {
        error!("Failed to read {} from store: {:#}", key, e);
        ProviderError::RequestFailed(format!("credential lookup failed: {}", e))
    })?;

    let raw = raw.ok_or_else(|| ProviderError::NoCredentials(provider.display_name().to_string()))?;

    let credentials: T = serde_json::from_str(&raw).map_err(|e| {
        error!("Malformed {} value: {}", key, e);
        ProviderError::NoCredentials(provider.display_name().to_string())
    })?;

    if !credentials.is_complete() {
        return Err(ProviderError::NoCredentials(provider.display_name().to_string()));
    }

    Ok(credentials)
}
