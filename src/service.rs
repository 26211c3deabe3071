//! Wiring of the two monitoring loops.
//!
//! The receive loop (supervisor + dispatcher) runs on the caller's task; the
//! staleness tick runs on a spawned task. They share only the liveness table.
//! When the supervisor gives up, the tick task is torn down with it.

use crate::config::MonitorConfig;
use crate::dispatcher::StreamDispatcher;
use crate::error::AppResult;
use crate::liveness::LivenessTable;
use crate::monitor::StalenessMonitor;
use crate::notify::{Alerter, NotificationSink, SmsNotifier};
use crate::supervisor::{ConnectionSupervisor, RetryPolicy};
use crate::transport::{Transport, WebSocketTransport};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Runs the monitor against the configured websocket endpoint and SMS channel
/// until the reconnect budget is exhausted or Ctrl-C is received.
pub async fn run(config: MonitorConfig) -> AppResult<()> {
    let transport = WebSocketTransport::new(config.connection.connect_timeout);
    let sink: Arc<dyn NotificationSink> = Arc::new(SmsNotifier::from_config(&config.notifier)?);

    tokio::select! {
        result = run_with(&config, transport, sink) => result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown requested");
            Ok(())
        }
    }
}

/// Runs both loops with explicit collaborators.
///
/// Returns once the supervisor exits, which only happens when the reconnect
/// budget is exhausted. Dropping the returned future also stops the tick task.
pub async fn run_with<T: Transport>(
    config: &MonitorConfig,
    transport: T,
    sink: Arc<dyn NotificationSink>,
) -> AppResult<()> {
    let thresholds = config.threshold_table()?;
    let liveness = LivenessTable::new(Instant::now());
    let alerter = Alerter::new(sink, config.notifier.timeout);

    let monitor = StalenessMonitor::new(
        liveness.clone(),
        thresholds,
        config.monitor.cooldown,
        alerter.clone(),
    );
    let ticker = TickTask(tokio::spawn(
        monitor.run(config.monitor.tick_period, config.monitor.start_delay),
    ));

    let dispatcher = StreamDispatcher::new(liveness, config.monitor.echo.iter().copied());
    let policy = RetryPolicy {
        max_attempts: config.connection.max_retries,
        backoff_delay: config.connection.retry_delay,
    };
    let mut supervisor = ConnectionSupervisor::new(
        transport,
        config.connection.endpoint.clone(),
        config.subscription_payload(),
        dispatcher,
        alerter,
        policy,
    );

    info!(endpoint = %config.connection.endpoint, "Starting validator monitor");
    let result = supervisor.run().await;
    drop(ticker);
    result
}

/// Aborts the staleness task when dropped.
struct TickTask(tokio::task::JoinHandle<()>);

impl Drop for TickTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
