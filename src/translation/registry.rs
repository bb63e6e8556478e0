/*!
 * Process-wide scheduler registry.
 *
 * Built once at startup and shared behind an `Arc`. Holds one
 * [`RateLimitedScheduler`] per back-end.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::app_config::{Config, TranslationProvider};
use crate::database::KeyValueStore;
use crate::errors::ProviderError;
use crate::language_utils::Language;
use crate::providers::{Provider, TranslationOutput, build_provider, http_client};

use super::concurrency::ProviderProfile;
use super::scheduler::RateLimitedScheduler;

#[derive(Debug, Default)]
pub struct SchedulerRegistry {
    schedulers: HashMap<TranslationProvider, RateLimitedScheduler>,
}

impl SchedulerRegistry {
    /// Registry with the real adapter for every provider
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let client = http_client();
        let providers = TranslationProvider::ALL
            .iter()
            .map(|provider| {
                (
                    build_provider(*provider, Arc::clone(&store), client.clone()),
                    ProviderProfile::from_config(*provider, config),
                )
            })
            .collect();
        Self::with_providers(providers)
    }

    /// Registry over explicit adapters, keyed by their `kind()`
    pub fn with_providers(providers: Vec<(Arc<dyn Provider>, ProviderProfile)>) -> Self {
        let schedulers = providers
            .into_iter()
            .map(|(provider, profile)| {
                debug!(
                    "Registering {} scheduler: {} qps, {:?}",
                    provider.kind().display_name(),
                    profile.qps,
                    profile.batch_limit
                );
                (provider.kind(), RateLimitedScheduler::new(provider, profile))
            })
            .collect();
        Self { schedulers }
    }

    pub fn get(&self, provider: TranslationProvider) -> Option<&RateLimitedScheduler> {
        self.schedulers.get(&provider)
    }

    /// Translate through the named provider's scheduler
    pub async fn translate(
        &self,
        provider: TranslationProvider,
        texts: &[String],
        source: Language,
        target: Language,
    ) -> Result<TranslationOutput, ProviderError> {
        let scheduler = self
            .get(provider)
            .ok_or_else(|| ProviderError::NoCredentials(provider.display_name().to_string()))?;
        scheduler.translate(texts, source, target).await
    }
}
