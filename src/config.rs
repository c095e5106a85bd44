use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ai::{is_known_provider, AIConfig};
use crate::core::models::SearchCategory;
use crate::core::transport::{HttpMethod, RequestConfig};

/// Prefix for environment overrides, e.g. `SEARCHBOX_SEARCH__API_URL`.
pub const ENV_PREFIX: &str = "SEARCHBOX_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    /// Transport options applied to every search and autocomplete request.
    pub request: RequestConfig,
    pub ai: Option<AIConfig>,
    pub logging: LoggingConfig,
}

/// Search box behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint; also used for autocomplete unless `autocomplete_url` is set.
    pub api_url: String,
    pub autocomplete_url: Option<String>,
    /// Suggest as the user types.
    pub autocomplete: bool,
    /// Minimum trimmed query length before autocomplete fires.
    pub min_query_length: usize,
    /// Minimum trimmed query length for explicit searches.
    pub min_search_length: usize,
    pub debounce_ms: u64,
    /// Initially selected category; empty means all.
    pub category: String,
    pub categories: Vec<SearchCategory>,
    /// Start in AI mode when AI search is usable.
    pub initial_ai_mode: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Write JSON logs to a daily rolling file.
    pub file: bool,
    /// Override the log directory.
    pub directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            request: RequestConfig::new()
                .with_method(HttpMethod::Post)
                .with_timeout_ms(10_000),
            ai: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/search".to_string(),
            autocomplete_url: None,
            autocomplete: true,
            min_query_length: 2,
            min_search_length: 1,
            debounce_ms: 300,
            category: String::new(),
            categories: Vec::new(),
            initial_ai_mode: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            directory: None,
        }
    }
}

impl SearchConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Endpoint for autocomplete requests.
    pub fn autocomplete_endpoint(&self) -> &str {
        self.autocomplete_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.api_url)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/searchbox/config.toml` plus
    /// `SEARCHBOX_*` environment overrides.
    /// Returns `Default` if the file is unparseable or invalid.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match Self::load_from(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load config at {}: {e}; using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Load and validate configuration from `path`. A missing file yields
    /// defaults plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Layered sources: defaults, then the TOML file, then the environment.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("searchbox").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("search.api_url", &self.search.api_url)?;
        if let Some(url) = &self.search.autocomplete_url {
            check_url("search.autocomplete_url", url)?;
        }

        if self.request.timeout == Some(0) {
            return Err(ConfigError::Invalid(
                "request.timeout must be greater than zero".to_string(),
            ));
        }

        if let Some(ai) = &self.ai {
            if !is_known_provider(&ai.provider_id()) {
                return Err(ConfigError::Invalid(format!(
                    "ai.provider `{}` is not one of openai, claude, gemini, custom",
                    ai.provider
                )));
            }
            if let Some(temperature) = ai.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ConfigError::Invalid(format!(
                        "ai.temperature {} is outside 0.0..=2.0",
                        temperature
                    )));
                }
            }
            if ai.max_tokens == Some(0) {
                return Err(ConfigError::Invalid(
                    "ai.max_tokens must be greater than zero".to_string(),
                ));
            }
            if let Some(base_url) = &ai.base_url {
                check_url("ai.base_url", base_url)?;
            }
        }

        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Invalid(format!("{field} `{value}` is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid(format!(
            "{field} must use http or https, got `{scheme}`"
        ))),
    }
}
