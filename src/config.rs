//! Configuration System using Figment
//!
//! This module provides strongly-typed configuration loading for the monitor.
//! Configuration is loaded from:
//! 1. Built-in defaults
//! 2. `config/validator_monitor.toml` (or a path given on the command line)
//! 3. Environment variables (prefixed with `VALIDATOR_MONITOR_`)
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore so that field names keep
//! their own underscores:
//!
//! ```text
//! VALIDATOR_MONITOR_CONNECTION__ENDPOINT=wss://xrplcluster.com
//! VALIDATOR_MONITOR_MONITOR__COOLDOWN=10m
//! VALIDATOR_MONITOR_NOTIFIER__AUTH_TOKEN=...
//! ```
//!
//! # Example
//!
//! ```no_run
//! use validator_monitor::config::MonitorConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = MonitorConfig::load()?;
//!     println!("Endpoint: {}", config.connection.endpoint);
//!     println!("Thresholds: {:?}", config.threshold_table()?);
//!     Ok(())
//! }
//! ```

use crate::category::Category;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/validator_monitor.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "VALIDATOR_MONITOR_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Per-category staleness limits, iterated in category order.
pub type ThresholdTable = BTreeMap<Category, Duration>;

/// Top-level monitor configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Stream endpoint and reconnect policy
    pub connection: ConnectionConfig,
    /// Staleness tick and alert cooldown settings
    pub monitor: StalenessConfig,
    /// SMS delivery settings
    pub notifier: NotifierConfig,
    /// Diagnostic output settings
    pub logging: LoggingConfig,
}

/// Connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Websocket endpoint (`ws://` or `wss://`)
    pub endpoint: String,
    /// Streams requested in the subscription payload
    pub streams: Vec<String>,
    /// Upper bound on a single connect attempt
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Fixed delay between reconnect attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Consecutive failures tolerated before giving up
    pub max_retries: u32,
}

/// Staleness monitor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    /// Tick period
    #[serde(with = "humantime_serde")]
    pub tick_period: Duration,
    /// Delay before the first tick
    #[serde(with = "humantime_serde")]
    pub start_delay: Duration,
    /// Minimum spacing between staleness alerts
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Category name -> maximum tolerable staleness
    pub thresholds: BTreeMap<String, humantime_serde::Serde<Duration>>,
    /// Categories echoed in full to diagnostic output
    pub echo: Vec<Category>,
}

/// SMS notifier settings
///
/// Delivery is disabled unless both `account_sid` and `auth_token` are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Recipient number (E.164, e.g. `+15551114444`)
    pub destination: String,
    /// Sender number (E.164)
    pub source: String,
    /// Account identifier, also the basic-auth user
    pub account_sid: Option<String>,
    /// Account secret, the basic-auth password
    pub auth_token: Option<String>,
    /// REST API base URL
    pub api_base: String,
    /// Upper bound on a single delivery
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://s.altnet.rippletest.net".to_string(),
            streams: vec!["ledger".into(), "consensus".into(), "server".into()],
            connect_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(10),
            max_retries: 5,
        }
    }
}

impl Default for StalenessConfig {
    fn default() -> Self {
        let thresholds = [
            (Category::LedgerClosed, Duration::from_secs(8)),
            (Category::ConsensusPhase, Duration::from_secs(6)),
        ]
        .into_iter()
        .map(|(category, limit)| (category.name().to_string(), limit.into()))
        .collect();

        Self {
            tick_period: Duration::from_secs(5),
            start_delay: Duration::from_secs(5),
            cooldown: Duration::from_secs(300),
            thresholds,
            echo: vec![Category::Response, Category::ConsensusPhase],
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            source: String::new(),
            account_sid: None,
            auth_token: None,
            api_base: "https://api.twilio.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ============================================================================
// Configuration Loading and Validation
// ============================================================================

impl MonitorConfig {
    /// Load configuration from the default file and environment variables
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if extraction or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment overrides still
    /// apply. A present but unparsable file is.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::LoadError)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Endpoint uses a websocket scheme
    /// - At least one stream is subscribed
    /// - Tick period is non-zero
    /// - Threshold keys name known categories
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        let endpoint = &self.connection.endpoint;
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid endpoint '{}'. Must start with ws:// or wss://",
                endpoint
            )));
        }

        if self.connection.streams.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one stream must be subscribed".to_string(),
            ));
        }

        if self.monitor.tick_period.is_zero() {
            return Err(ConfigError::ValidationError(
                "monitor.tick_period must be greater than zero".to_string(),
            ));
        }

        self.threshold_table()?;
        Ok(())
    }

    /// Resolve configured thresholds into a typed table.
    pub fn threshold_table(&self) -> Result<ThresholdTable, ConfigError> {
        self.monitor
            .thresholds
            .iter()
            .map(|(name, limit)| {
                let category = name
                    .parse::<Category>()
                    .map_err(|e| ConfigError::ValidationError(format!("monitor.thresholds: {}", e)))?;
                Ok((category, **limit))
            })
            .collect()
    }

    /// JSON subscription request sent right after connecting.
    pub fn subscription_payload(&self) -> String {
        serde_json::json!({
            "command": "subscribe",
            "streams": self.connection.streams,
        })
        .to_string()
    }
}
