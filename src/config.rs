//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub recurring: RecurringConfig,

    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub i18n: I18nConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without the `/api` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Local key/value store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("crewdesk").to_string_lossy().to_string())
        .unwrap_or_else(|| "./crewdesk_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Path of the JSON file backing the key/value store
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("storage.json")
    }
}

/// Recurring-event composer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecurringConfig {
    #[serde(default = "default_preview_debounce")]
    pub preview_debounce_ms: u64,

    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,

    #[serde(default = "default_preview_warning_threshold")]
    pub preview_warning_threshold: usize,
}

fn default_preview_debounce() -> u64 {
    300
}

fn default_preview_limit() -> usize {
    10
}

fn default_preview_warning_threshold() -> usize {
    100
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            preview_debounce_ms: default_preview_debounce(),
            preview_limit: default_preview_limit(),
            preview_warning_threshold: default_preview_warning_threshold(),
        }
    }
}

/// SMS broadcast configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    #[serde(default = "default_cost_per_segment")]
    pub cost_per_segment: f64,

    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
}

fn default_cost_per_segment() -> f64 {
    0.0079
}

fn default_max_recipients() -> usize {
    200
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            cost_per_segment: default_cost_per_segment(),
            max_recipients: default_max_recipients(),
        }
    }
}

/// Translation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct I18nConfig {
    #[serde(default = "default_locale")]
    pub default_locale: String,

    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,

    #[serde(default = "default_supported_locales")]
    pub supported_locales: Vec<String>,

    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_fallback_locale() -> String {
    "en".to_string()
}

fn default_supported_locales() -> Vec<String> {
    vec!["en".to_string(), "es".to_string(), "fr".to_string()]
}

fn default_namespaces() -> Vec<String> {
    vec!["common".to_string(), "signup".to_string()]
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            fallback_locale: default_fallback_locale(),
            supported_locales: default_supported_locales(),
            namespaces: default_namespaces(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("crewdesk").join("config.toml")),
            Some(PathBuf::from("./crewdesk.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CREWDESK_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("CREWDESK_API_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }

        if let Ok(data_dir) = std::env::var("CREWDESK_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Ok(locale) = std::env::var("CREWDESK_LOCALE") {
            self.i18n.default_locale = locale;
        }

        if let Ok(level) = std::env::var("CREWDESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CREWDESK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# CrewDesk Configuration
#
# Environment variables override these settings:
# - CREWDESK_API_URL
# - CREWDESK_API_TIMEOUT
# - CREWDESK_DATA_DIR
# - CREWDESK_LOCALE
# - CREWDESK_LOG_LEVEL
# - CREWDESK_LOG_FORMAT

[api]
# Backend base URL (REST endpoints live under /api)
base_url = "http://localhost:3000"

# Request timeout in seconds
request_timeout_secs = 30

[storage]
# Directory holding the session and preference store
data_dir = "~/.local/share/crewdesk"

[recurring]
# Quiet period before a preview request is sent (ms)
preview_debounce_ms = 300

# Occurrences listed in a preview
preview_limit = 10

# Total occurrence count that raises a warning
preview_warning_threshold = 100

[sms]
# Estimated cost of one SMS segment (USD)
cost_per_segment = 0.0079

# Maximum recipients per broadcast
max_recipients = 200

[i18n]
default_locale = "en"
fallback_locale = "en"
supported_locales = ["en", "es", "fr"]
namespaces = ["common", "signup"]

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
