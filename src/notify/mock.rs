//! In-memory sink for tests and dry runs.

use super::{AlertOutcome, NotificationSink};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Records every alert instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every alert received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of alerts containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages()
            .iter()
            .filter(|message| message.contains(needle))
            .count()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_alert(&self, text: &str) -> AlertOutcome {
        info!(text, "Recorded alert");
        let mut messages = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push(text.to_string());
        AlertOutcome::Delivered {
            id: Some(format!("recorded-{}", messages.len())),
        }
    }
}
