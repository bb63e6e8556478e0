/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;

use subweave::app_config::{Config, LogLevel, ProviderOverride, TranslationProvider};
use subweave::translation::{BatchLimit, ProviderProfile};
use crate::common;

/// Test that a saved configuration loads back unchanged
#[test]
fn test_config_saveThenLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.log_level = LogLevel::Debug;
    config.translation.provider = TranslationProvider::DeepL;
    config.translation.batch_size = 25;
    config.providers.push(ProviderOverride {
        provider: TranslationProvider::Youdao,
        qps: Some(2),
        max_items: None,
        max_bytes: Some(2000),
    });
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;

    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert_eq!(loaded.translation, config.translation);
    assert_eq!(loaded.providers, config.providers);
    Ok(())
}

/// Test that a missing or malformed file reports an error
#[test]
fn test_config_fromFile_withBadInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert!(Config::from_file(temp_dir.path().join("missing.json")).is_err());

    let broken = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    assert!(Config::from_file(broken).is_err());
    Ok(())
}

/// Test that an override may not set both limits
#[test]
fn test_config_validation_withBothLimits_shouldFail() {
    let mut config = Config::default();
    config.providers.push(ProviderOverride {
        provider: TranslationProvider::Azure,
        qps: None,
        max_items: Some(10),
        max_bytes: Some(1000),
    });

    assert!(config.validate().is_err());
}

/// Test that overrides flow into the scheduler profile
#[test]
fn test_config_overrides_shouldShapeProviderProfile() {
    let config: Config = serde_json::from_str(
        r#"{
            "translation": {"retry_count": 3, "min_dispatch_spacing_ms": 250},
            "providers": [{"provider": "baidu", "qps": 5, "max_items": 20}]
        }"#,
    )
    .expect("config json is valid");

    let profile = ProviderProfile::from_config(TranslationProvider::Baidu, &config);

    assert_eq!(profile.qps, 5);
    assert_eq!(profile.batch_limit, BatchLimit::MaxItems(20));
    assert_eq!(profile.retry_count, 3);
    assert_eq!(profile.min_spacing.as_millis(), 250);
}

/// Test the credential storage key of every provider
#[test]
fn test_credentialsKey_shouldBeDistinctPerProvider() {
    let mut keys: Vec<&str> = TranslationProvider::ALL.iter().map(|p| p.credentials_key()).collect();
    keys.sort_unstable();
    keys.dedup();

    assert_eq!(keys.len(), TranslationProvider::ALL.len());
    assert_eq!(TranslationProvider::Baidu.credentials_key(), "BAIDU_MT_SETTINGS");
}
