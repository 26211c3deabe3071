//! Validator stream monitor.
//!
//! ```bash
//! validator-monitor --config config/validator_monitor.toml
//! VALIDATOR_MONITOR_NOTIFIER__AUTH_TOKEN=... validator-monitor --endpoint wss://xrplcluster.com
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use validator_monitor::config::{MonitorConfig, DEFAULT_CONFIG_PATH};
use validator_monitor::{service, telemetry};

#[derive(Debug, Parser)]
#[command(name = "validator-monitor", version, about = "Watch a validator stream and alert when it goes stale")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the websocket endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Validate the configuration, print the effective thresholds and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MonitorConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(endpoint) = cli.endpoint {
        config.connection.endpoint = endpoint;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate().context("validating overrides")?;

    if cli.check_config {
        println!("endpoint: {}", config.connection.endpoint);
        for (category, limit) in config.threshold_table()? {
            println!("threshold {}: {:?}", category, limit);
        }
        return Ok(());
    }

    telemetry::init(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    if let Err(e) = service::run(config).await {
        error!(error = %e, "Validator monitor terminated");
        return Err(e.into());
    }
    Ok(())
}
