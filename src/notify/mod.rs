//! External alert delivery.
//!
//! Alerts leave the process through a [`NotificationSink`]. Sinks never return
//! errors: every failure of the underlying channel is logged inside the sink
//! and reported as a soft [`AlertOutcome`], so the caller always proceeds as if
//! the alert had been sent. [`Alerter`] additionally bounds each delivery with
//! a timeout so a hung channel cannot stall the caller's loop.

pub mod mock;
pub mod sms;

pub use mock::RecordingSink;
pub use sms::SmsNotifier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Result of a delivery attempt. Every variant is a soft success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Accepted by the delivery channel.
    Delivered {
        /// Channel-assigned message identifier, when one was returned.
        id: Option<String>,
    },
    /// Delivery is not configured; the alert was only logged.
    Disabled,
    /// Delivery failed; the failure was logged and swallowed.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl AlertOutcome {
    /// Whether the channel accepted the alert.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// A channel that can carry alert text to an operator.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers `text`. Must not panic and must not propagate failures.
    async fn send_alert(&self, text: &str) -> AlertOutcome;
}

/// Shared handle to a sink with a bounded delivery time.
#[derive(Clone)]
pub struct Alerter {
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl Alerter {
    /// Wraps `sink`, bounding each delivery by `timeout`.
    pub fn new(sink: Arc<dyn NotificationSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Delivers `text`, giving up after the configured timeout.
    pub async fn notify(&self, text: &str) -> AlertOutcome {
        match tokio::time::timeout(self.timeout, self.sink.send_alert(text)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Alert delivery timed out");
                AlertOutcome::Failed {
                    reason: format!("timed out after {:?}", self.timeout),
                }
            }
        }
    }
}

impl std::fmt::Debug for Alerter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alerter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
