//! Staleness and debounce behaviour across sequences of ticks.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use validator_monitor::liveness::LivenessTable;
use validator_monitor::monitor::{CooldownStatus, StalenessMonitor};
use validator_monitor::notify::{Alerter, RecordingSink};
use validator_monitor::{Category, ThresholdTable};

const COOLDOWN: Duration = Duration::from_secs(300);

struct Harness {
    start: Instant,
    liveness: LivenessTable,
    monitor: StalenessMonitor,
    sink: Arc<RecordingSink>,
}

impl Harness {
    /// Thresholds {ledger_closed: 8s, consensus_phase: 6s}.
    fn reference() -> Self {
        Self::with_thresholds(ThresholdTable::from([
            (Category::LedgerClosed, Duration::from_secs(8)),
            (Category::ConsensusPhase, Duration::from_secs(6)),
        ]))
    }

    fn with_thresholds(thresholds: ThresholdTable) -> Self {
        let start = Instant::now();
        let liveness = LivenessTable::new(start);
        let sink = Arc::new(RecordingSink::new());
        let alerter = Alerter::new(sink.clone(), Duration::from_secs(5));
        let monitor = StalenessMonitor::new(liveness.clone(), thresholds, COOLDOWN, alerter);
        Self {
            start,
            liveness,
            monitor,
            sink,
        }
    }

    fn at(&self, secs: u64) -> Instant {
        self.start + Duration::from_secs(secs)
    }

    async fn see(&self, category: Category, secs: u64) {
        self.liveness.observe(category, self.at(secs)).await;
    }

    async fn see_all(&self, secs: u64) {
        for category in Category::ALL {
            if category != Category::SessionStart {
                self.see(category, secs).await;
            }
        }
    }
}

#[tokio::test]
async fn test_reference_scenario_alerts_once_naming_both_categories() {
    let mut h = Harness::reference();
    h.see(Category::LedgerClosed, 0).await;
    h.see(Category::ConsensusPhase, 0).await;

    let report = h.monitor.tick(h.at(9)).await.expect("tick");

    let messages = h.sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("ledger_closed"));
    assert!(messages[0].contains("consensus_phase"));
    assert!(messages[0].find("ledger_closed") < messages[0].find("consensus_phase"));
    assert_eq!(report.breaches.len(), 2);
    assert!(!report.debounce.alerts_enabled);
    assert_eq!(report.debounce.last_alert_time, Some(h.at(9)));

    // Still suppressed one second before the window closes
    let report = h.monitor.tick(h.at(308)).await.expect("tick");
    assert!(!report.debounce.alerts_enabled);
    assert!(report.alert.is_none());

    let report = h.monitor.tick(h.at(309)).await.expect("tick");
    assert_eq!(report.cooldown, CooldownStatus::Rearmed);
    assert!(report.debounce.alerts_enabled);
    assert_eq!(h.sink.messages().len(), 1);
}

#[tokio::test]
async fn test_unthresholded_categories_never_alert() {
    let mut h = Harness::with_thresholds(ThresholdTable::from([(
        Category::LedgerClosed,
        Duration::from_secs(8),
    )]));
    // server_status, response and consensus_phase are never seen at all
    for secs in [5, 10, 15, 1_000, 100_000] {
        h.see(Category::LedgerClosed, secs).await;
        let report = h.monitor.tick(h.at(secs + 1)).await.expect("tick");
        assert!(report.breaches.is_empty(), "tick at {secs}");
    }
    assert!(h.sink.messages().is_empty());
    assert!(h.monitor.debounce_state().alerts_enabled);
}

#[tokio::test]
async fn test_within_threshold_never_disables_or_notifies() {
    let mut h = Harness::reference();
    for secs in (0..120).step_by(5) {
        h.see_all(secs).await;
        let report = h.monitor.tick(h.at(secs + 5)).await.expect("tick");
        assert!(report.breaches.is_empty());
        assert!(report.alert.is_none());
        assert_eq!(report.cooldown, CooldownStatus::Armed);
    }
    assert!(h.sink.messages().is_empty());
    assert!(h.monitor.debounce_state().alerts_enabled);
}

#[tokio::test]
async fn test_single_breach_while_armed() {
    let mut h = Harness::reference();
    h.see_all(0).await;
    h.see(Category::ConsensusPhase, 10).await;

    let report = h.monitor.tick(h.at(12)).await.expect("tick");

    assert_eq!(h.sink.messages().len(), 1);
    assert!(h.sink.messages()[0].contains("ledger_closed"));
    assert!(!h.sink.messages()[0].contains("consensus_phase"));
    assert!(report.alert.as_ref().is_some_and(|(_, outcome)| outcome.is_delivered()));
    let state = h.monitor.debounce_state();
    assert!(!state.alerts_enabled);
    assert_eq!(state.last_alert_time, Some(h.at(12)));
}

#[tokio::test]
async fn test_cooling_suppresses_repeat_breaches() {
    let mut h = Harness::reference();
    h.see_all(0).await;

    h.monitor.tick(h.at(10)).await.expect("tick");
    for secs in (15..310).step_by(5) {
        let report = h.monitor.tick(h.at(secs)).await.expect("tick");
        assert!(report.alert.is_none(), "tick at {secs}");
        assert!(!report.breaches.is_empty());
    }
    assert_eq!(h.sink.messages().len(), 1);
}

#[tokio::test]
async fn test_rearm_regardless_of_breach_then_alert_again() {
    let mut h = Harness::reference();
    h.see_all(0).await;
    h.monitor.tick(h.at(10)).await.expect("tick");

    // Cooldown elapsed while still breaching: this tick only re-arms
    let report = h.monitor.tick(h.at(310)).await.expect("tick");
    assert_eq!(report.cooldown, CooldownStatus::Rearmed);
    assert!(report.alert.is_none());
    assert_eq!(h.sink.messages().len(), 1);

    // The next breaching tick alerts and starts a new window
    let report = h.monitor.tick(h.at(315)).await.expect("tick");
    assert!(report.alert.is_some());
    assert_eq!(report.debounce.last_alert_time, Some(h.at(315)));
    assert_eq!(h.sink.messages().len(), 2);
}

#[tokio::test]
async fn test_rearm_when_healthy() {
    let mut h = Harness::reference();
    h.see_all(0).await;
    h.monitor.tick(h.at(10)).await.expect("tick");

    h.see_all(308).await;
    let report = h.monitor.tick(h.at(310)).await.expect("tick");

    assert_eq!(report.cooldown, CooldownStatus::Rearmed);
    assert!(report.breaches.is_empty());
    assert!(h.monitor.debounce_state().alerts_enabled);
}

#[tokio::test]
async fn test_global_cooldown_spans_categories() {
    let mut h = Harness::reference();
    h.see_all(0).await;
    h.see(Category::ConsensusPhase, 10).await;

    // ledger_closed trips the window
    h.monitor.tick(h.at(10)).await.expect("tick");
    assert_eq!(h.sink.messages().len(), 1);

    // consensus_phase goes stale later; still suppressed
    h.see(Category::LedgerClosed, 60).await;
    let report = h.monitor.tick(h.at(61)).await.expect("tick");
    assert_eq!(report.breaches.len(), 1);
    assert_eq!(report.breaches[0].category, Category::ConsensusPhase);
    assert!(report.alert.is_none());
    assert_eq!(h.sink.messages().len(), 1);
}
