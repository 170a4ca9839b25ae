//! Scraper configuration.
//!
//! Settings come from an optional TOML file. Every section has defaults, so an
//! empty file (or no file at all) is valid apart from the API key, which can
//! also be supplied through `TUMBLR_CONSUMER_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;
use crate::types::DEFAULT_LIMIT;

pub const CONFIG_PATH_ENV: &str = "TUMBLR_SCRAPER_CONFIG";
pub const CONSUMER_KEY_ENV: &str = "TUMBLR_CONSUMER_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "tumblr_scraper.toml";

/// Tumblr never returns more than 20 posts per call.
pub const MAX_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub scrape: ScrapeConfig,
    pub blogs: Vec<BlogTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub consumer_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            consumer_key: None,
            base_url: "https://api.tumblr.com/v2".to_string(),
            timeout_secs: 30,
            user_agent: concat!("tumblr-scraper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum delay between two API calls, in milliseconds.
    pub min_interval_ms: u64,
}

impl RateLimitConfig {
    pub fn tumblr() -> Self {
        Self {
            min_interval_ms: 1200,
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::tumblr()
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed after the first failed attempt of a page fetch
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub page_size: u32,
    pub limit: usize,
    pub output_dir: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            limit: DEFAULT_LIMIT,
            output_dir: PathBuf::from("output"),
        }
    }
}

/// A blog scraped in batch mode, with the keywords it is searched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogTarget {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AppConfig {
    /// Load configuration from an explicit path, `TUMBLR_SCRAPER_CONFIG`, or
    /// `tumblr_scraper.toml` in the working directory, falling back to defaults
    /// when none of them exists. `TUMBLR_CONSUMER_KEY` always wins over the file.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_path(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        Ok(config.with_consumer_key_override(std::env::var(CONSUMER_KEY_ENV).ok()))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_consumer_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.consumer_key = Some(key.trim().to_string());
        }
        self
    }

    pub fn consumer_key(&self) -> Result<&str, ConfigError> {
        self.api
            .consumer_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: format!("api.consumer_key (or {})", CONSUMER_KEY_ENV),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consumer_key()?;

        Url::parse(&self.api.base_url).map_err(|_| invalid("api.base_url", &self.api.base_url))?;

        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "0"));
        }
        if self.scrape.page_size == 0 || self.scrape.page_size > MAX_PAGE_SIZE {
            return Err(invalid("scrape.page_size", self.scrape.page_size));
        }
        if self.scrape.limit == 0 {
            return Err(invalid("scrape.limit", "0"));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(invalid("retry.jitter_factor", self.retry.jitter_factor));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(invalid(
                "retry.backoff_multiplier",
                self.retry.backoff_multiplier,
            ));
        }
        if let Some(blog) = self.blogs.iter().find(|b| b.name.trim().is_empty()) {
            return Err(invalid("blogs.name", &blog.name));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Resolve which configuration file to read, if any.
///
/// An explicitly requested file (flag or environment) must exist; the default
/// file in the working directory is optional.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let requested = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

    if let Some(path) = requested {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        return Ok(Some(path));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    Ok(default_path.exists().then_some(default_path))
}
