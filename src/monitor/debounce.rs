//! Global alert cooldown.

use std::time::Duration;
use tokio::time::Instant;

/// Snapshot of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    /// Whether the next breach may alert.
    pub alerts_enabled: bool,
    /// When the last alert was sent, if any.
    pub last_alert_time: Option<Instant>,
}

/// Result of checking the cooldown on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// Alerts were already enabled.
    Armed,
    /// The cooldown elapsed on this tick and alerts are enabled again.
    Rearmed,
    /// Alerts stay suppressed.
    Cooling {
        /// Time since the last alert.
        since_last: Duration,
        /// Time left until alerts are re-enabled.
        remaining: Duration,
    },
}

/// Two-state gate (armed / cooling) shared by every category.
///
/// A breach in any category starts the one cooldown window, and no alert of
/// any category goes out until it has elapsed.
#[derive(Debug, Clone)]
pub struct AlertDebouncer {
    cooldown: Duration,
    state: DebounceState,
}

impl AlertDebouncer {
    /// Creates an armed debouncer with the given cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: DebounceState {
                alerts_enabled: true,
                last_alert_time: None,
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Whether a breach observed now would alert.
    pub fn is_armed(&self) -> bool {
        self.state.alerts_enabled
    }

    /// Records an alert sent at `now` and starts cooling.
    pub fn trip(&mut self, now: Instant) {
        self.state = DebounceState {
            alerts_enabled: false,
            last_alert_time: Some(now),
        };
    }

    /// Re-arms once `now` is at least one cooldown past the last alert.
    pub fn poll(&mut self, now: Instant) -> CooldownStatus {
        if self.state.alerts_enabled {
            return CooldownStatus::Armed;
        }

        let since_last = self
            .state
            .last_alert_time
            .map(|sent| now.saturating_duration_since(sent))
            .unwrap_or(self.cooldown);

        if since_last >= self.cooldown {
            self.state.alerts_enabled = true;
            CooldownStatus::Rearmed
        } else {
            CooldownStatus::Cooling {
                since_last,
                remaining: self.cooldown - since_last,
            }
        }
    }
}
