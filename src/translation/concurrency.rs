/*!
 * Provider-specific rate tuning.
 *
 * Each back-end publishes (or in practice enforces) a queries-per-second
 * ceiling and a payload limit. This module holds those defaults and merges
 * the config-file overrides into them.
 */

use std::time::Duration;

use crate::app_config::{Config, TranslationProvider};

use super::batch::BatchLimit;

/// Provider-specific profile with tuned defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Dispatches allowed in any trailing window of `window`
    pub qps: u32,
    /// Length of the sliding window
    pub window: Duration,
    /// Per-request payload limit
    pub batch_limit: BatchLimit,
    /// Extra wait added when the window is full
    pub admission_padding: Duration,
    /// Minimum gap between two dispatches
    pub min_spacing: Duration,
    /// Retries per failed sub-batch
    pub retry_count: u32,
    /// Linear backoff unit, attempt n waits n units
    pub retry_backoff: Duration,
}

impl ProviderProfile {
    /// Get the published profile for a given provider
    pub fn for_provider(provider: TranslationProvider) -> Self {
        let base = Self {
            qps: 10,
            window: Duration::from_secs(1),
            batch_limit: BatchLimit::MaxItems(50),
            admission_padding: Duration::ZERO,
            min_spacing: Duration::from_millis(100),
            retry_count: 1,
            retry_backoff: Duration::from_millis(1000),
        };

        match provider {
            // 1 QPS on the standard plan, payload capped by encoded size
            TranslationProvider::Baidu | TranslationProvider::Youdao => Self {
                qps: 1,
                batch_limit: BatchLimit::MaxBytes(1500),
                admission_padding: Duration::from_millis(500),
                ..base
            },
            // Ali documents 50 but throttles above 10 in practice
            TranslationProvider::Ali
            | TranslationProvider::Huoshan
            | TranslationProvider::Azure
            | TranslationProvider::DeepL => base,
        }
    }

    /// Profile with the config-file settings and overrides applied
    pub fn from_config(provider: TranslationProvider, config: &Config) -> Self {
        let mut profile = Self::for_provider(provider);
        profile.min_spacing = Duration::from_millis(config.translation.min_dispatch_spacing_ms);
        profile.retry_count = config.translation.retry_count;
        profile.retry_backoff = Duration::from_millis(config.translation.retry_backoff_ms);

        if let Some(entry) = config.provider_override(provider) {
            if let Some(qps) = entry.qps {
                profile.qps = qps;
            }
            if let Some(max_items) = entry.max_items {
                profile.batch_limit = BatchLimit::MaxItems(max_items);
            }
            if let Some(max_bytes) = entry.max_bytes {
                profile.batch_limit = BatchLimit::MaxBytes(max_bytes);
            }
        }

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::ProviderOverride;

    #[test]
    fn test_providerProfile_forBaidu_shouldUseByteLimitAndPadding() {
        let profile = ProviderProfile::for_provider(TranslationProvider::Baidu);
        assert_eq!(profile.qps, 1);
        assert_eq!(profile.batch_limit, BatchLimit::MaxBytes(1500));
        assert_eq!(profile.admission_padding, Duration::from_millis(500));
    }

    #[test]
    fn test_providerProfile_forDeepL_shouldUseItemLimit() {
        let profile = ProviderProfile::for_provider(TranslationProvider::DeepL);
        assert_eq!(profile.qps, 10);
        assert_eq!(profile.batch_limit, BatchLimit::MaxItems(50));
        assert_eq!(profile.admission_padding, Duration::ZERO);
        assert_eq!(profile.min_spacing, Duration::from_millis(100));
    }

    #[test]
    fn test_fromConfig_withOverride_shouldReplaceDefaults() {
        let mut config = Config::default();
        config.translation.retry_backoff_ms = 250;
        config.providers.push(ProviderOverride {
            provider: TranslationProvider::Azure,
            qps: Some(3),
            max_items: None,
            max_bytes: Some(4000),
        });

        let profile = ProviderProfile::from_config(TranslationProvider::Azure, &config);

        assert_eq!(profile.qps, 3);
        assert_eq!(profile.batch_limit, BatchLimit::MaxBytes(4000));
        assert_eq!(profile.retry_backoff, Duration::from_millis(250));

        let untouched = ProviderProfile::from_config(TranslationProvider::Ali, &config);
        assert_eq!(untouched.qps, 10);
    }
}
