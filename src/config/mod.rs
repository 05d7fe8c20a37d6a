//! Configuration management.
//!
//! Configuration is loaded once at start-up from an optional TOML file layered
//! with `PAPER_AGGREGATOR_*` environment variables, and is immutable afterwards.
//!
//! ```toml
//! [sources.scopus]
//! enabled = true
//! api_key = "your-elsevier-key"
//!
//! [sources.openalex]
//! enabled = true
//! email = "you@example.org"
//!
//! [sources.wos]
//! enabled = false
//! api_key = "your-clarivate-key"
//! database_id = "WOS"
//!
//! [search]
//! page_size = 25
//! timeout_secs = 30
//!
//! [export]
//! layout = "extended"
//! delimiter = ","
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```
//!
//! Nested keys map to environment variables with `__` between levels, e.g.
//! `PAPER_AGGREGATOR_SOURCES__SCOPUS__API_KEY`. When a key is still unset the
//! plain `SCOPUS_API_KEY`, `WOS_API_KEY` and `OPENALEX_EMAIL` variables are
//! consulted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::export::ExportLayout;
use crate::models::{SourceType, DEFAULT_PAGE_SIZE};
use crate::sources::DEFAULT_DATABASE_ID;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PAPER_AGGREGATOR";

/// Configuration file name looked up in the working and config directories
pub const CONFIG_FILE_NAME: &str = "paper-aggregator.toml";

/// Largest page size any provider accepts
pub const MAX_PAGE_SIZE: usize = 200;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-source credentials and switches
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub scopus: ScopusConfig,

    #[serde(default)]
    pub openalex: OpenAlexConfig,

    #[serde(default)]
    pub wos: WosConfig,
}

/// Scopus settings (disabled unless switched on; needs a key when enabled)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopusConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Full search endpoint URL override
    #[serde(default)]
    pub base_url: Option<String>,
}

/// OpenAlex settings (enabled by default; no key needed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAlexConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Contact address for the polite pool
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            email: None,
            base_url: None,
        }
    }
}

/// Web of Science settings (disabled unless switched on; needs a key when enabled)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WosConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Collection to query
    #[serde(default = "default_database_id")]
    pub database_id: String,

    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for WosConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            database_id: default_database_id(),
            base_url: None,
        }
    }
}

/// Search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results requested from each provider
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-source timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub layout: ExportLayout,

    /// Column delimiter (single ASCII character other than a quote or line break)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Default output path for `search --export`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layout: ExportLayout::default(),
            delimiter: default_delimiter(),
            path: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_database_id() -> String {
    DEFAULT_DATABASE_ID.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_delimiter() -> char {
    ','
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("{0} is enabled but no API key is configured")]
    MissingApiKey(SourceType),

    #[error("Invalid base URL for {provider}: {reason}")]
    InvalidBaseUrl { provider: SourceType, reason: String },

    #[error("Page size must be between 1 and {max}, got {got}")]
    InvalidPageSize { got: usize, max: usize },

    #[error("Timeout must be at least one second")]
    InvalidTimeout,

    #[error("Export delimiter must be a single ASCII character other than a quote or line break, got {0:?}")]
    InvalidDelimiter(char),
}

impl Config {
    /// Fill unset credentials from conventional environment variables
    pub fn with_env_fallbacks(self) -> Self {
        self.with_fallbacks(|name| std::env::var(name).ok())
    }

    /// Fill unset credentials using `lookup` for variable names
    pub fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let sources = &mut self.sources;
        if sources.scopus.api_key.is_none() {
            sources.scopus.api_key = lookup("SCOPUS_API_KEY");
        }
        if sources.wos.api_key.is_none() {
            sources.wos.api_key = lookup("WOS_API_KEY");
        }
        if sources.openalex.email.is_none() {
            sources.openalex.email = lookup("OPENALEX_EMAIL");
        }
        self
    }

    /// Check the configuration; enabled keyed sources must have a key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sources = &self.sources;

        if sources.scopus.enabled && is_blank(&sources.scopus.api_key) {
            return Err(ConfigError::MissingApiKey(SourceType::Scopus));
        }
        if sources.wos.enabled && is_blank(&sources.wos.api_key) {
            return Err(ConfigError::MissingApiKey(SourceType::Wos));
        }

        for (provider, base_url) in [
            (SourceType::Scopus, &sources.scopus.base_url),
            (SourceType::OpenAlex, &sources.openalex.base_url),
            (SourceType::Wos, &sources.wos.base_url),
        ] {
            if let Some(url) = base_url {
                validate_base_url(provider, url)?;
            }
        }

        if self.search.page_size == 0 || self.search.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize {
                got: self.search.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if !self.export.delimiter.is_ascii() || matches!(self.export.delimiter, '"' | '\n' | '\r') {
            return Err(ConfigError::InvalidDelimiter(self.export.delimiter));
        }

        Ok(())
    }

    /// Whether the given source is switched on
    pub fn is_enabled(&self, source: SourceType) -> bool {
        match source {
            SourceType::Scopus => self.sources.scopus.enabled,
            SourceType::OpenAlex => self.sources.openalex.enabled,
            SourceType::Wos => self.sources.wos.enabled,
        }
    }

    /// Switch a source on or off
    pub fn set_enabled(&mut self, source: SourceType, enabled: bool) {
        match source {
            SourceType::Scopus => self.sources.scopus.enabled = enabled,
            SourceType::OpenAlex => self.sources.openalex.enabled = enabled,
            SourceType::Wos => self.sources.wos.enabled = enabled,
        }
    }

    /// Whether a non-blank API key is configured (`None` for keyless sources)
    pub fn has_api_key(&self, source: SourceType) -> Option<bool> {
        match source {
            SourceType::Scopus => Some(!is_blank(&self.sources.scopus.api_key)),
            SourceType::OpenAlex => None,
            SourceType::Wos => Some(!is_blank(&self.sources.wos.api_key)),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn validate_base_url(provider: SourceType, raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
        provider,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidBaseUrl {
            provider,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path));
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    Ok(config.with_env_fallbacks())
}

/// Find a configuration file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("paper-aggregator").join("config.toml"))
        .filter(|path| path.is_file())
}
