//! Application configuration
//!
//! Loaded with the `config` crate from an optional file (TOML/JSON/YAML by
//! extension) plus `BASAROMETER_*` environment overrides, e.g.
//! `BASAROMETER_COORDINATOR__STAGGER_OFFSET_MS=500`. Every section falls back
//! to the built-in defaults below, and the result is validated before use.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::coordinator::CoordinatorSettings;
pub use crate::infrastructure::retry_policy::RetryPolicy;

/// Built-in configuration defaults
pub mod defaults {
    pub const ENV_PREFIX: &str = "BASAROMETER";
    pub const DEFAULT_CONFIG_FILE: &str = "config/basarometer";

    // Coordinator
    pub const STAGGER_OFFSET_MS: u64 = 2000;
    pub const COLLECTOR_TIMEOUT_SECS: u64 = 60;
    pub const MAX_CONCURRENT_COLLECTORS: usize = 2;
    pub const ACCEPTANCE_THRESHOLD: f64 = 0.6;

    // Collectors
    pub const VICTORY_REQUEST_DELAY_MS: u64 = 1000;
    pub const MEGA_REQUEST_DELAY_MS: u64 = 800;
    pub const HTML_REQUEST_DELAY_MS: u64 = 1000;

    // Retry policy
    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
    pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const RETRY_JITTER_RANGE_MS: u64 = 250;

    // HTTP
    pub const HTTP_TIMEOUT_SECS: u64 = 30;
    pub const USER_AGENT: &str = "basarometer-scan/0.1 (price comparison)";

    // Ingestion
    pub const INGESTION_ENDPOINT: &str = "/api/scanner/ingest";
    pub const INGESTION_BATCH_SIZE: usize = 20;
    pub const INGESTION_BATCH_DELAY_MS: u64 = 1000;
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation { message: message.into() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub coordinator: CoordinatorConfig,
    pub validation: ValidationConfig,
    pub retry: RetryPolicy,
    pub collectors: Vec<CollectorConfig>,
    pub logging: LoggingConfig,
    pub ingestion: Option<IngestionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            validation: ValidationConfig::default(),
            retry: RetryPolicy::default(),
            collectors: vec![CollectorConfig::victory(), CollectorConfig::mega()],
            logging: LoggingConfig::default(),
            ingestion: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Delay between consecutive collector starts (ms)
    pub stagger_offset_ms: u64,
    /// Overrides every collector's own timeout when set (seconds)
    pub collector_timeout_secs: Option<u64>,
    pub max_concurrent_collectors: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stagger_offset_ms: defaults::STAGGER_OFFSET_MS,
            collector_timeout_secs: None,
            max_concurrent_collectors: defaults::MAX_CONCURRENT_COLLECTORS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Records need a confidence strictly above this value
    pub acceptance_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { acceptance_threshold: defaults::ACCEPTANCE_THRESHOLD }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorKind {
    Victory,
    Mega,
    Html,
}

/// One configured source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub source_id: String,
    pub kind: CollectorKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Minimum spacing between this source's requests (ms)
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Listing fixture for the reference adapters; the bundled one is used when absent
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Category paths; empty means the adapter's own category list
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub selectors: Option<HtmlSelectorConfig>,
}

const fn enabled_by_default() -> bool {
    true
}

impl CollectorConfig {
    pub fn victory() -> Self {
        Self::reference("victory", CollectorKind::Victory)
    }

    pub fn mega() -> Self {
        Self::reference("mega", CollectorKind::Mega)
    }

    fn reference(source_id: &str, kind: CollectorKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            kind,
            enabled: true,
            request_delay_ms: None,
            timeout_secs: None,
            fixture_path: None,
            base_url: None,
            categories: Vec::new(),
            selectors: None,
        }
    }

    pub fn request_delay(&self) -> Duration {
        let default_ms = match self.kind {
            CollectorKind::Victory => defaults::VICTORY_REQUEST_DELAY_MS,
            CollectorKind::Mega => defaults::MEGA_REQUEST_DELAY_MS,
            CollectorKind::Html => defaults::HTML_REQUEST_DELAY_MS,
        };
        Duration::from_millis(self.request_delay_ms.unwrap_or(default_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(defaults::COLLECTOR_TIMEOUT_SECS))
    }
}

/// CSS selector lists for the generic HTML collector; the first selector that matches wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlSelectorConfig {
    pub product_container: Vec<String>,
    pub name: Vec<String>,
    pub price: Vec<String>,
    #[serde(default)]
    pub weight: Vec<String>,
    #[serde(default)]
    pub original_price: Vec<String>,
    #[serde(default)]
    pub brand: Vec<String>,
    #[serde(default)]
    pub kosher: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

const fn default_batch_size() -> usize {
    defaults::INGESTION_BATCH_SIZE
}

const fn default_batch_delay_ms() -> u64 {
    defaults::INGESTION_BATCH_DELAY_MS
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    /// Enable JSON formatted logs
    pub json_format: bool,
    /// Enable console output (stderr, stdout carries the session report)
    pub console_output: bool,
    /// Enable file output
    pub file_output: bool,
    /// Log directory, `logs/` next to the executable when unset
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: "basarometer.log".to_string(),
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// 설정 파일에서 로드
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_sources(Some(path.as_ref()), None)
    }

    /// Optional `config/basarometer.*` plus environment overrides
    pub fn load_default() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(defaults::DEFAULT_CONFIG_FILE).required(false))
            .add_source(Self::environment(None))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from an optional file and an explicit environment map
    /// (`None` reads the process environment)
    pub fn from_sources(
        path: Option<&Path>,
        environment: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(&path.to_string_lossy()));
        }
        let settings = builder.add_source(Self::environment(environment)).build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn environment(source: Option<HashMap<String, String>>) -> config::Environment {
        config::Environment::with_prefix(defaults::ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(source)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.max_concurrent_collectors == 0 {
            return Err(invalid("coordinator.max_concurrent_collectors must be greater than 0"));
        }
        if self.coordinator.collector_timeout_secs == Some(0) {
            return Err(invalid("coordinator.collector_timeout_secs must be greater than 0"));
        }

        let threshold = self.validation.acceptance_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(format!(
                "validation.acceptance_threshold must be within [0, 1], got {threshold}"
            )));
        }

        self.retry.validate().map_err(|e| invalid(e.to_string()))?;

        let mut seen = HashSet::new();
        for collector in &self.collectors {
            if collector.source_id.trim().is_empty() {
                return Err(invalid("collector source_id cannot be empty"));
            }
            if !seen.insert(collector.source_id.as_str()) {
                return Err(invalid(format!("duplicate collector source_id '{}'", collector.source_id)));
            }
            if collector.timeout_secs == Some(0) {
                return Err(invalid(format!("{} timeout_secs must be greater than 0", collector.source_id)));
            }
            if collector.kind == CollectorKind::Html {
                Self::validate_html_collector(collector)?;
            }
        }

        if let Some(ingestion) = &self.ingestion {
            url::Url::parse(&ingestion.base_url)
                .map_err(|e| invalid(format!("ingestion.base_url is not a valid URL: {e}")))?;
            if ingestion.batch_size == 0 {
                return Err(invalid("ingestion.batch_size must be greater than 0"));
            }
        }

        Ok(())
    }

    fn validate_html_collector(collector: &CollectorConfig) -> Result<(), ConfigError> {
        let id = &collector.source_id;
        let base_url = collector
            .base_url
            .as_deref()
            .ok_or_else(|| invalid(format!("{id}: html collectors need a base_url")))?;
        url::Url::parse(base_url).map_err(|e| invalid(format!("{id}: invalid base_url: {e}")))?;

        if collector.categories.is_empty() {
            return Err(invalid(format!("{id}: html collectors need at least one category")));
        }
        let selectors = collector
            .selectors
            .as_ref()
            .ok_or_else(|| invalid(format!("{id}: html collectors need selectors")))?;
        if selectors.product_container.is_empty() || selectors.name.is_empty() || selectors.price.is_empty() {
            return Err(invalid(format!(
                "{id}: product_container, name and price selectors are required"
            )));
        }
        Ok(())
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            stagger_offset: Duration::from_millis(self.coordinator.stagger_offset_ms),
            collector_timeout: self.coordinator.collector_timeout_secs.map(Duration::from_secs),
            max_concurrent_collectors: self.coordinator.max_concurrent_collectors,
            acceptance_threshold: self.validation.acceptance_threshold,
        }
    }

    pub fn enabled_collectors(&self) -> impl Iterator<Item = &CollectorConfig> {
        self.collectors.iter().filter(|c| c.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collectors.len(), 2);
        assert_eq!(config.collectors[0].request_delay(), Duration::from_millis(1000));
        assert_eq!(config.collectors[1].request_delay(), Duration::from_millis(800));

        let settings = config.coordinator_settings();
        assert_eq!(settings, CoordinatorSettings::default());
    }

    #[test]
    fn test_duplicate_source_ids_rejected() {
        let mut config = AppConfig::default();
        config.collectors.push(CollectorConfig::victory());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate collector source_id 'victory'"));
    }

    #[test]
    fn test_html_collector_requires_selectors() {
        let mut config = AppConfig::default();
        config.collectors.push(CollectorConfig {
            base_url: Some("https://shop.example.co.il".to_string()),
            categories: vec!["/meat".to_string()],
            ..CollectorConfig::reference("corner-butcher", CollectorKind::Html)
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env = HashMap::from([
            ("BASAROMETER_COORDINATOR__STAGGER_OFFSET_MS".to_string(), "250".to_string()),
            ("BASAROMETER_VALIDATION__ACCEPTANCE_THRESHOLD".to_string(), "0.75".to_string()),
        ]);
        let config = AppConfig::from_sources(None, Some(env)).unwrap();
        assert_eq!(config.coordinator.stagger_offset_ms, 250);
        assert!((config.validation.acceptance_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.collectors.len(), 2);
    }
}
