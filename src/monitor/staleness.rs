//! Periodic staleness check.

use super::debounce::{AlertDebouncer, CooldownStatus, DebounceState};
use crate::category::Category;
use crate::config::ThresholdTable;
use crate::error::{AppResult, MonitorError};
use crate::liveness::{LivenessTable, Staleness};
use crate::notify::{AlertOutcome, Alerter};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// A category over its threshold on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breach {
    /// The stale category.
    pub category: Category,
    /// How stale it was.
    pub staleness: Staleness,
    /// The limit it crossed.
    pub threshold: Duration,
}

/// What one tick observed and did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Instant the tick sampled at.
    pub at: Instant,
    /// Staleness of every category, in table order.
    pub snapshot: Vec<(Category, Staleness)>,
    /// Threshold breaches, in threshold-table order.
    pub breaches: Vec<Breach>,
    /// Alert sent on this tick, with its delivery outcome.
    pub alert: Option<(String, AlertOutcome)>,
    /// Cooldown check result.
    pub cooldown: CooldownStatus,
    /// Debouncer state after the tick.
    pub debounce: DebounceState,
}

/// Samples the liveness table on a fixed period and raises debounced alerts.
#[derive(Debug)]
pub struct StalenessMonitor {
    liveness: LivenessTable,
    thresholds: ThresholdTable,
    debouncer: AlertDebouncer,
    alerter: Alerter,
}

impl StalenessMonitor {
    /// Creates a monitor over `liveness` using a fixed threshold table.
    pub fn new(
        liveness: LivenessTable,
        thresholds: ThresholdTable,
        cooldown: Duration,
        alerter: Alerter,
    ) -> Self {
        Self {
            liveness,
            thresholds,
            debouncer: AlertDebouncer::new(cooldown),
            alerter,
        }
    }

    /// Current debouncer state.
    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Runs forever: first tick after `start_delay`, then every `period`.
    ///
    /// A failed tick is logged and skipped; nothing inside the loop ends it.
    /// Stop it by aborting the task it runs on.
    pub async fn run(mut self, period: Duration, start_delay: Duration) {
        let mut ticker = interval_at(Instant::now() + start_delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(?period, ?start_delay, thresholds = self.thresholds.len(), "Staleness monitor started");

        loop {
            ticker.tick().await;
            // Sample the clock after the wait; a delayed tick runs behind its deadline.
            if let Err(e) = self.tick(Instant::now()).await {
                error!(error = %e, "Handled in-loop monitor error; tick skipped");
            }
        }
    }

    /// Performs one staleness check as of `now`.
    pub async fn tick(&mut self, now: Instant) -> AppResult<TickReport> {
        let seen = self.liveness.snapshot().await;
        let snapshot: Vec<(Category, Staleness)> = seen
            .iter()
            .map(|(category, last_seen)| (*category, last_seen.staleness_at(now)))
            .collect();

        let mut breaches = Vec::new();
        for (category, threshold) in &self.thresholds {
            let staleness = seen
                .get(category)
                .map(|last_seen| last_seen.staleness_at(now))
                .ok_or_else(|| {
                    MonitorError::MonitorTick(format!("no liveness entry for {}", category))
                })?;
            if staleness.exceeds(*threshold) {
                breaches.push(Breach {
                    category: *category,
                    staleness,
                    threshold: *threshold,
                });
            }
        }

        let mut pending_alert = None;
        if self.debouncer.is_armed() && !breaches.is_empty() {
            // Trip before delivering: a failed delivery still starts the cooldown.
            self.debouncer.trip(now);
            let text = compose_alert(&breaches);
            warn!(breaches = breaches.len(), "{}", text);
            pending_alert = Some(text);
        }

        let cooldown = self.debouncer.poll(now);
        match cooldown {
            CooldownStatus::Armed => {}
            CooldownStatus::Rearmed => info!("Re-enabled staleness alerts"),
            CooldownStatus::Cooling { since_last, remaining } => info!(
                since_last = %format!("{:.0}s", since_last.as_secs_f64()),
                remaining = %format!("{:.0}s", remaining.as_secs_f64()),
                "Staleness alerts disabled"
            ),
        }

        info!("Staleness: {}", format_snapshot(&snapshot));

        let alert = match pending_alert {
            Some(text) => {
                let outcome = self.alerter.notify(&text).await;
                Some((text, outcome))
            }
            None => None,
        };

        Ok(TickReport {
            at: now,
            snapshot,
            breaches,
            alert,
            cooldown,
            debounce: self.debouncer.state(),
        })
    }
}

/// One message naming every breached category.
fn compose_alert(breaches: &[Breach]) -> String {
    breaches
        .iter()
        .map(|breach| match breach.staleness {
            Staleness::Never => format!(
                "Warning: {} never seen (limit {}s)",
                breach.category,
                breach.threshold.as_secs_f64()
            ),
            Staleness::Elapsed(_) => format!(
                "Warning: {} last seen {} ago (limit {}s)",
                breach.category,
                breach.staleness,
                breach.threshold.as_secs_f64()
            ),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_snapshot(snapshot: &[(Category, Staleness)]) -> String {
    snapshot
        .iter()
        .map(|(category, staleness)| format!("{}={}", category, staleness))
        .collect::<Vec<_>>()
        .join(" ")
}
