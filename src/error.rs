//! Custom error types for the monitor.
//!
//! This module defines the primary error type, `MonitorError`, for the whole crate.
//! Every failure the monitor can observe falls into one of a few kinds, and each
//! kind has a fixed propagation policy:
//!
//! - **`Transport`** / **`ConnectionClosed`**: connect, send or receive failures and
//!   remote closes. These feed the reconnect policy in the supervisor and are never
//!   fatal on their own.
//! - **`MalformedMessage`**: a single inbound message that could not be parsed or
//!   classified. Logged by the receive loop, the message is skipped.
//! - **`MonitorTick`**: a failure while computing staleness during one tick. Logged,
//!   the tick is skipped.
//! - **`Notification`**: alert delivery failures. The notification sink converts
//!   these into a soft `AlertOutcome`, so they never escape it.
//! - **`RetryBudgetExhausted`**: the only runtime error allowed to end the process.
//! - **`Config`** / **`Telemetry`**: startup failures surfaced before either loop
//!   runs.

use crate::config::ConfigError;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Monitor tick failed: {0}")]
    MonitorTick(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Reconnect budget exhausted after {attempts} attempts")]
    RetryBudgetExhausted { attempts: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl MonitorError {
    /// Whether this error should end the process rather than be handled by
    /// the loop it originated in.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RetryBudgetExhausted { .. } | Self::Config(_) | Self::Telemetry(_)
        )
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}
