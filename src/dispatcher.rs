//! Classification of inbound stream messages.

use crate::category::Category;
use crate::error::{AppResult, MonitorError};
use crate::liveness::LivenessTable;
use serde_json::Value;
use std::collections::BTreeSet;
use tokio::time::Instant;
use tracing::{debug, info};

/// Parses inbound messages and stamps their category in the liveness table.
#[derive(Debug, Clone)]
pub struct StreamDispatcher {
    liveness: LivenessTable,
    echo: BTreeSet<Category>,
}

impl StreamDispatcher {
    /// Creates a dispatcher writing into `liveness`, echoing the `echo`
    /// categories to diagnostic output.
    pub fn new(liveness: LivenessTable, echo: impl IntoIterator<Item = Category>) -> Self {
        Self {
            liveness,
            echo: echo.into_iter().collect(),
        }
    }

    /// Handles one raw message observed now.
    pub async fn handle(&self, raw: &str) -> AppResult<Option<Category>> {
        self.handle_at(raw, Instant::now()).await
    }

    /// Handles one raw message observed at `at`.
    ///
    /// Returns the category that was stamped, or `None` for a well-formed
    /// message whose tag is not tracked. Malformed messages leave the table
    /// untouched.
    pub async fn handle_at(&self, raw: &str, at: Instant) -> AppResult<Option<Category>> {
        let value: Value = serde_json::from_str(raw)?;
        let kind = type_tag(&value)?;

        let Some(category) = Category::from_stream_type(kind) else {
            debug!(tag = %kind, "Ignoring untracked message type");
            return Ok(None);
        };

        self.liveness.observe(category, at).await;

        if self.echo.contains(&category) {
            let pretty = serde_json::to_string_pretty(&value)?;
            info!(%category, "Received message\n{}", pretty);
        }

        Ok(Some(category))
    }
}

/// The string `type` field of a JSON object message.
fn type_tag(value: &Value) -> AppResult<&str> {
    let object = value
        .as_object()
        .ok_or_else(|| MonitorError::MalformedMessage("message is not a JSON object".into()))?;
    object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| MonitorError::MalformedMessage("missing or invalid type tag".into()))
}
