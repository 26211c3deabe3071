//! SMS delivery through a Twilio-compatible REST API.
//!
//! Messages are created with `POST {api_base}/2010-04-01/Accounts/{sid}/Messages.json`
//! using HTTP basic auth (`account_sid` / `auth_token`) and a form body of
//! `To`, `From` and `Body`. Without both credentials the notifier degrades to
//! logging a warning per alert.

use super::{AlertOutcome, NotificationSink};
use crate::config::NotifierConfig;
use crate::error::{AppResult, MonitorError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
struct Credentials {
    account_sid: String,
    auth_token: String,
}

/// Subset of the message resource returned on creation.
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

/// Sends alerts as SMS messages.
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    client: reqwest::Client,
    api_base: String,
    destination: String,
    source: String,
    credentials: Option<Credentials>,
}

impl SmsNotifier {
    /// Builds a notifier from configuration.
    ///
    /// Missing or empty credentials are not an error; the notifier is created
    /// in its disabled form.
    pub fn from_config(config: &NotifierConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MonitorError::Notification(format!("HTTP client setup failed: {}", e)))?;

        let credentials = match (non_empty(&config.account_sid), non_empty(&config.auth_token)) {
            (Some(account_sid), Some(auth_token)) => Some(Credentials {
                account_sid,
                auth_token,
            }),
            _ => {
                warn!("No SMS credentials provided; alerts will only be logged");
                None
            }
        };

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            destination: config.destination.clone(),
            source: config.source.clone(),
            credentials,
        })
    }

    /// Whether alerts will actually be sent.
    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn create_message(&self, credentials: &Credentials, body: &str) -> AppResult<Option<String>> {
        if self.destination.is_empty() || self.source.is_empty() {
            return Err(MonitorError::Notification(
                "destination and source numbers must both be set".to_string(),
            ));
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, credentials.account_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[
                ("To", self.destination.as_str()),
                ("From", self.source.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MonitorError::Notification(e.to_string()))?;

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| MonitorError::Notification(format!("unexpected response body: {}", e)))?;

        Ok(resource.sid)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl NotificationSink for SmsNotifier {
    async fn send_alert(&self, text: &str) -> AlertOutcome {
        let Some(credentials) = &self.credentials else {
            warn!(text, "No SMS credentials provided; alert not delivered");
            return AlertOutcome::Disabled;
        };

        match self.create_message(credentials, text).await {
            Ok(id) => {
                info!(sid = id.as_deref().unwrap_or("unknown"), "Sent SMS alert");
                AlertOutcome::Delivered { id }
            }
            Err(e) => {
                error!(error = %e, "Handled SMS delivery failure");
                AlertOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
