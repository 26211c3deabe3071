//! Staleness detection and debounced alerting.
//!
//! The [`StalenessMonitor`] runs on its own task, independent of connection
//! health. Each tick it samples the shared liveness table, compares every
//! thresholded category against its limit and, through the [`AlertDebouncer`],
//! sends at most one combined alert per cooldown window.

pub mod debounce;
pub mod staleness;

pub use debounce::{AlertDebouncer, CooldownStatus, DebounceState};
pub use staleness::{Breach, StalenessMonitor, TickReport};
