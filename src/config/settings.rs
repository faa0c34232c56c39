//! Application settings loading from config.toml
//!
//! Every section and field carries a serde default, so a partial file (or no file
//! at all) still yields a usable configuration. Secrets such as API tokens are
//! never read from the file; they come from the environment at the point of use.

use crate::{
    core::{trending::MAX_WINDOW_DAYS, trial::MAX_TRIAL_DAYS},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "APP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Housekeeping loop settings
    pub scheduler: SchedulerConfig,
    /// Free-trial settings
    pub trial: TrialConfig,
    /// Trending topics window and size
    pub trending: TrendingConfig,
    /// Third-party market data endpoints
    pub market: MarketConfig,
    /// AI chat-completion gateway
    pub ai: AiConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API binds to
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Housekeeping loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether `main` spawns the background loop at all
    pub enabled: bool,
    /// Seconds between housekeeping runs
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
        }
    }
}

impl SchedulerConfig {
    /// Interval as a `Duration`, never shorter than one second.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Free-trial settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Length of a new trial in days
    pub days: i64,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self { days: 7 }
    }
}

/// Trending topics window and size
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    /// Trailing window of posts considered, in days
    pub window_days: i64,
    /// Number of categories and hashtags returned
    pub limit: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            limit: 5,
        }
    }
}

/// Third-party market data endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Base URL of the central-bank time-series API
    pub central_bank_url: String,
    /// Base URL of the equity quote API
    pub quote_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            central_bank_url: "https://api.bcb.gov.br/dados/serie".to_string(),
            quote_url: "https://brapi.dev/api".to_string(),
            timeout_secs: 10,
        }
    }
}

impl MarketConfig {
    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// AI chat-completion gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Chat-completions endpoint
    pub gateway_url: String,
    /// Model identifier passed through to the gateway
    pub model: String,
    /// Pause between classification requests, in milliseconds
    pub classification_delay_ms: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gateway_url: "https://ai.gateway.example/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            classification_delay_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl AiConfig {
    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between classification requests as a `Duration`.
    #[must_use]
    pub const fn classification_delay(&self) -> Duration {
        Duration::from_millis(self.classification_delay_ms)
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed or a value is out of range.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if !(1..=MAX_TRIAL_DAYS).contains(&config.trial.days) {
        return Err(Error::Config {
            message: format!(
                "trial.days must be between 1 and {MAX_TRIAL_DAYS}, got {}",
                config.trial.days
            ),
        });
    }
    if !(1..=MAX_WINDOW_DAYS).contains(&config.trending.window_days) {
        return Err(Error::Config {
            message: format!(
                "trending.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                config.trending.window_days
            ),
        });
    }
    if config.trending.limit == 0 {
        return Err(Error::Config {
            message: "trending.limit must be positive".to_string(),
        });
    }
    Ok(())
}

/// Loads configuration from a TOML file
///
/// A missing file is not an error: defaults are used and a warning is logged.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);

    if !path_ref.exists() {
        warn!("Config file {:?} not found, using defaults", path_ref);
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `$APP_CONFIG`, falling back to `./config.toml`.
pub fn load_app_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;
    info!("Configuration loaded (bind address {})", config.server.bind_addr);
    Ok(config)
}
