use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::FormLensError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for FormLensError {
    fn from(err: ConfigError) -> Self {
        FormLensError::Config(err.to_string())
    }
}

/// Main configuration for FormLens
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormLensConfig {
    /// Aggregate and response caching
    #[serde(default)]
    pub cache: CacheSettings,

    /// Orchestrator and analyzer tuning
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// When false every lookup misses and nothing is stored
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// TTL for computed field analytics (seconds)
    #[serde(default = "default_analytics_ttl_secs")]
    pub analytics_ttl_secs: u64,

    /// TTL for fetched response lists (seconds)
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,
}

impl CacheSettings {
    pub fn analytics_ttl(&self) -> Duration {
        Duration::from_secs(self.analytics_ttl_secs)
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            analytics_ttl_secs: default_analytics_ttl_secs(),
            response_ttl_secs: default_response_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Fields analyzed concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_text_top_words")]
    pub text_top_words: usize,

    #[serde(default = "default_text_top_phrases")]
    pub text_top_phrases: usize,

    /// Verbatim answers kept for qualitative review
    #[serde(default = "default_text_recent_responses")]
    pub text_recent_responses: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            text_top_words: default_text_top_words(),
            text_top_phrases: default_text_top_phrases(),
            text_recent_responses: default_text_recent_responses(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_analytics_ttl_secs() -> u64 {
    30 * 60
}
fn default_response_ttl_secs() -> u64 {
    30 * 60
}
fn default_batch_size() -> usize {
    5
}
fn default_text_top_words() -> usize {
    50
}
fn default_text_top_phrases() -> usize {
    20
}
fn default_text_recent_responses() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with layered sources
pub struct ConfigManager {
    config: FormLensConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.formlens.toml, then ~/.formlens/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Loaded FormLens configuration from {}", path.display()),
            None => info!("No FormLens config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load a specific TOML file, still honouring environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::apply_env_overrides(Self::read_toml_file(path)?);
        Self::validate_config(&config)?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".formlens.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .formlens.env: {}", e);
                }
            }
        }
    }

    fn load_config_file() -> Result<(FormLensConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".formlens.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".formlens").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((FormLensConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<FormLensConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: FormLensConfig) -> FormLensConfig {
        if let Some(ttl) = env_parse::<u64>("FORMLENS_ANALYTICS_TTL_SECS") {
            config.cache.analytics_ttl_secs = ttl;
        }
        if let Some(ttl) = env_parse::<u64>("FORMLENS_RESPONSE_TTL_SECS") {
            config.cache.response_ttl_secs = ttl;
        }
        if let Some(enabled) = env_parse::<bool>("FORMLENS_CACHE_ENABLED") {
            config.cache.enabled = enabled;
        }
        if let Some(batch) = env_parse::<usize>("FORMLENS_BATCH_SIZE") {
            config.analytics.batch_size = batch;
        }
        if let Ok(level) = std::env::var("FORMLENS_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("FORMLENS_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate_config(config: &FormLensConfig) -> Result<(), ConfigError> {
        if config.analytics.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.batch_size must be at least 1".to_string(),
            ));
        }

        if config.cache.analytics_ttl_secs == 0 || config.cache.response_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache TTLs must be greater than zero".to_string(),
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn config(&self) -> &FormLensConfig {
        &self.config
    }

    pub fn into_config(self) -> FormLensConfig {
        self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.config).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, raw);
            None
        }
    }
}
