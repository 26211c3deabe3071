//! Resilient connection lifecycle.
//!
//! The supervisor owns the connect -> subscribe -> receive cycle. Any way a
//! session can end (refused connect, failed send, receive error, remote close)
//! counts as a lost connection and is retried after a fixed delay until the
//! reconnect budget runs out.

use crate::dispatcher::StreamDispatcher;
use crate::error::{AppResult, MonitorError};
use crate::notify::Alerter;
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Defines a policy for retrying a lost connection.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// The maximum number of consecutive retry attempts. This counts retries,
    /// not connects: a dead endpoint sees `max_attempts + 1` connect attempts.
    pub max_attempts: u32,
    /// The delay before each retry attempt.
    pub backoff_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_delay: Duration::from_secs(10),
        }
    }
}

/// Consecutive-failure accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryState {
    /// Failures since the last established session.
    pub attempt_count: u32,
    /// Failures tolerated before giving up.
    pub max_attempts: u32,
}

impl RetryState {
    fn exhausted(&self) -> bool {
        self.attempt_count > self.max_attempts
    }
}

/// Keeps a subscription to the stream alive.
pub struct ConnectionSupervisor<T: Transport> {
    transport: T,
    endpoint: String,
    subscription: String,
    dispatcher: StreamDispatcher,
    alerter: Alerter,
    policy: RetryPolicy,
    state: RetryState,
}

impl<T: Transport> ConnectionSupervisor<T> {
    /// Creates a supervisor that will subscribe with `subscription` on every
    /// session opened to `endpoint`.
    pub fn new(
        transport: T,
        endpoint: impl Into<String>,
        subscription: impl Into<String>,
        dispatcher: StreamDispatcher,
        alerter: Alerter,
        policy: RetryPolicy,
    ) -> Self {
        let state = RetryState {
            attempt_count: 0,
            max_attempts: policy.max_attempts,
        };
        Self {
            transport,
            endpoint: endpoint.into(),
            subscription: subscription.into(),
            dispatcher,
            alerter,
            policy,
            state,
        }
    }

    /// Current retry accounting.
    pub fn retry_state(&self) -> RetryState {
        self.state
    }

    /// Runs sessions until the reconnect budget is exhausted.
    ///
    /// Only ever returns `MonitorError::RetryBudgetExhausted`.
    pub async fn run(&mut self) -> AppResult<()> {
        loop {
            let cause = match self.run_session().await {
                Ok(()) => MonitorError::ConnectionClosed,
                Err(e) => e,
            };

            self.state.attempt_count += 1;
            let attempt = self.state.attempt_count;

            if self.state.exhausted() {
                let message = format!(
                    "Connection closed! Giving up after {} failed reconnect attempts",
                    self.policy.max_attempts
                );
                error!(error = %cause, attempt, "{}", message);
                self.alerter.notify(&message).await;
                return Err(MonitorError::RetryBudgetExhausted { attempts: attempt });
            }

            let message = format!(
                "Connection closed! Attempting restart #{} in {}s",
                attempt,
                self.policy.backoff_delay.as_secs_f64()
            );
            warn!(error = %cause, attempt, max_attempts = self.policy.max_attempts, "{}", message);
            self.alerter.notify(&message).await;
            sleep(self.policy.backoff_delay).await;
        }
    }

    /// One connect -> subscribe -> receive cycle.
    ///
    /// `Ok(())` means the remote closed cleanly; every other ending is an error.
    async fn run_session(&mut self) -> AppResult<()> {
        let mut session = self.transport.connect(&self.endpoint).await?;
        session.send(self.subscription.clone()).await?;
        info!(endpoint = %self.endpoint, "Subscribed to stream");

        if self.state.attempt_count > 0 {
            let message = "Monitoring connection restored";
            warn!(attempt = self.state.attempt_count, "{}", message);
            self.alerter.notify(message).await;
        }

        let mut established = false;
        loop {
            let Some(raw) = session.receive().await? else {
                session.close().await;
                return Ok(());
            };

            if !established {
                established = true;
                if self.state.attempt_count > 0 {
                    info!(
                        previous_failures = self.state.attempt_count,
                        "Session established; reconnect budget reset"
                    );
                    self.state.attempt_count = 0;
                }
            }

            if let Err(e) = self.dispatcher.handle(&raw).await {
                warn!(error = %e, "Skipping inbound message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::liveness::{LastSeen, LivenessTable};
    use crate::notify::RecordingSink;
    use crate::transport::mock::SessionEnd;
    use crate::transport::{ScriptedSession, ScriptedTransport};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn supervisor(
        transport: ScriptedTransport,
        max_attempts: u32,
    ) -> (ConnectionSupervisor<ScriptedTransport>, LivenessTable, Arc<RecordingSink>) {
        let liveness = LivenessTable::new(Instant::now());
        let dispatcher = StreamDispatcher::new(liveness.clone(), []);
        let sink = Arc::new(RecordingSink::new());
        let alerter = Alerter::new(sink.clone(), Duration::from_secs(1));
        let policy = RetryPolicy {
            max_attempts,
            backoff_delay: Duration::from_secs(10),
        };
        let supervisor = ConnectionSupervisor::new(
            transport,
            "ws://validator.test",
            r#"{"command":"subscribe"}"#,
            dispatcher,
            alerter,
            policy,
        );
        (supervisor, liveness, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_after_max_attempts() {
        let transport = ScriptedTransport::new([]);
        let (mut supervisor, _liveness, sink) = supervisor(transport.clone(), 5);

        let result = supervisor.run().await;

        assert!(matches!(
            result,
            Err(MonitorError::RetryBudgetExhausted { attempts: 6 })
        ));
        // Initial attempt plus five retries, never a seventh connect
        assert_eq!(transport.connect_attempts(), 6);
        assert_eq!(sink.count_containing("Attempting restart"), 5);
        assert_eq!(sink.count_containing("Giving up"), 1);
        assert_eq!(sink.count_containing("restored"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_fixed_delay() {
        let transport = ScriptedTransport::new([]);
        let (mut supervisor, _liveness, _sink) = supervisor(transport, 2);

        let started = Instant::now();
        let _ = supervisor.run().await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(20), "waited {waited:?}");
        assert!(waited < Duration::from_secs(21), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_connection_sends_no_restore_notice() {
        let transport = ScriptedTransport::new([ScriptedSession::deliver(
            [r#"{"type":"ledgerClosed"}"#],
            SessionEnd::Hang,
        )]);
        let (mut supervisor, liveness, sink) = supervisor(transport.clone(), 5);

        let outcome = tokio::time::timeout(Duration::from_secs(60), supervisor.run()).await;

        assert!(outcome.is_err(), "supervisor should still be running");
        assert!(sink.messages().is_empty());
        assert_eq!(transport.sent_payloads(), vec![r#"{"command":"subscribe"}"#.to_string()]);
        assert!(matches!(
            liveness.last_seen(Category::LedgerClosed).await,
            Some(LastSeen::At(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_failing_before_first_message_keeps_count() {
        let transport = ScriptedTransport::new([
            ScriptedSession::Refuse,
            ScriptedSession::deliver(Vec::<String>::new(), SessionEnd::Fail),
            ScriptedSession::deliver([r#"{"type":"serverStatus"}"#], SessionEnd::Hang),
        ]);
        let (mut supervisor, _liveness, sink) = supervisor(transport.clone(), 5);

        let outcome = tokio::time::timeout(Duration::from_secs(60), supervisor.run()).await;

        assert!(outcome.is_err());
        assert_eq!(transport.connect_attempts(), 3);
        assert_eq!(sink.count_containing("Attempting restart #1"), 1);
        assert_eq!(sink.count_containing("Attempting restart #2"), 1);
        assert_eq!(sink.count_containing("restored"), 2);
        assert_eq!(supervisor.retry_state().attempt_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_subscription_counts_as_loss() {
        let transport = ScriptedTransport::new([ScriptedSession::FailSend]);
        let (mut supervisor, _liveness, sink) = supervisor(transport.clone(), 0);

        let result = supervisor.run().await;

        assert!(matches!(
            result,
            Err(MonitorError::RetryBudgetExhausted { attempts: 1 })
        ));
        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(sink.count_containing("Attempting restart"), 0);
    }
}
