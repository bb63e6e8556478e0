use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Provider credentials are
/// not part of it; they live in the key-value store.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// SQLite store location, defaults to the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Per-provider rate and batch overrides
    #[serde(default)]
    pub providers: Vec<ProviderOverride>,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Baidu Fanyi
    #[default]
    Baidu,
    // @provider: Alibaba Cloud Machine Translation
    Ali,
    // @provider: Youdao Zhiyun
    Youdao,
    // @provider: Volcengine (Huoshan) Machine Translation
    Huoshan,
    // @provider: Azure Translator
    Azure,
    // @provider: DeepL
    DeepL,
}

impl TranslationProvider {
    // @const: Every supported back-end, in menu order
    pub const ALL: [TranslationProvider; 6] = [
        Self::Baidu,
        Self::Ali,
        Self::Youdao,
        Self::Huoshan,
        Self::Azure,
        Self::DeepL,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Baidu => "Baidu",
            Self::Ali => "Alibaba Cloud",
            Self::Youdao => "Youdao",
            Self::Huoshan => "Volcengine",
            Self::Azure => "Azure",
            Self::DeepL => "DeepL",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Baidu => "baidu".to_string(),
            Self::Ali => "ali".to_string(),
            Self::Youdao => "youdao".to_string(),
            Self::Huoshan => "huoshan".to_string(),
            Self::Azure => "azure".to_string(),
            Self::DeepL => "deepl".to_string(),
        }
    }

    // @returns: Store key holding this provider's credential object
    pub fn credentials_key(&self) -> &'static str {
        match self {
            Self::Baidu => "BAIDU_MT_SETTINGS",
            Self::Ali => "ALI_MT_SETTINGS",
            Self::Youdao => "YOUDAO_TRANS_SETTINGS",
            Self::Huoshan => "HUOSHAN_MT_SETTINGS",
            Self::Azure => "AZURE_TRANS_SETTINGS",
            Self::DeepL => "DEEPL_TRANS_SETTINGS",
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "baidu" => Ok(Self::Baidu),
            "ali" | "aliyun" | "alibaba" => Ok(Self::Ali),
            "youdao" => Ok(Self::Youdao),
            "huoshan" | "volcengine" => Ok(Self::Huoshan),
            "azure" => Ok(Self::Azure),
            "deepl" => Ok(Self::DeepL),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Override of a provider's published limits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderOverride {
    // @field: Provider the override applies to
    pub provider: TranslationProvider,

    // @field: Queries per second ceiling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qps: Option<u32>,

    // @field: Maximum number of texts per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    // @field: Maximum cumulative UTF-8 bytes per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

/// Translation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Default provider for the CLI
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Source segments submitted per diff-translate call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Retries per failed sub-batch
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Linear backoff unit between retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Minimum gap between two dispatches to the same provider
    #[serde(default = "default_min_dispatch_spacing_ms")]
    pub min_dispatch_spacing_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            batch_size: default_batch_size(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            min_dispatch_spacing_ms: default_min_dispatch_spacing_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_retry_count() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_min_dispatch_spacing_ms() -> u64 {
    100
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.batch_size == 0 {
            return Err(anyhow!("translation.batch_size must be greater than zero"));
        }

        for entry in &self.providers {
            if entry.qps == Some(0) {
                return Err(anyhow!("qps override for {} must be greater than zero", entry.provider));
            }
            if entry.max_items == Some(0) || entry.max_bytes == Some(0) {
                return Err(anyhow!("batch limit override for {} must be greater than zero", entry.provider));
            }
            if entry.max_items.is_some() && entry.max_bytes.is_some() {
                return Err(anyhow!(
                    "{} override may set max_items or max_bytes, not both",
                    entry.provider
                ));
            }
        }

        Ok(())
    }

    /// Override entry for a provider, if any
    pub fn provider_override(&self, provider: TranslationProvider) -> Option<&ProviderOverride> {
        self.providers.iter().find(|p| p.provider == provider)
    }
}
