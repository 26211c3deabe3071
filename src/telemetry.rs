//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence when set; otherwise the configured level applies
//! to this crate and chatty dependencies are capped at `warn`.

use crate::config::LoggingConfig;
use crate::error::{AppResult, MonitorError};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(&config.level)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| MonitorError::Telemetry(e.to_string()))
}

fn default_filter(level: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_new(format!(
        "{level},validator_monitor={level},tungstenite=warn,tokio_tungstenite=warn,reqwest=warn,hyper=warn"
    ))
    .map_err(|e| MonitorError::Telemetry(e.to_string()))
}
