//! Last-seen bookkeeping shared by the receive loop and the staleness tick.

use crate::category::Category;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// When a category was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastSeen {
    /// Not observed since the monitor started.
    Never,
    /// Observed at this instant.
    At(Instant),
}

impl LastSeen {
    /// Staleness of this entry as observed at `now`.
    pub fn staleness_at(&self, now: Instant) -> Staleness {
        match self {
            Self::Never => Staleness::Never,
            Self::At(seen) => Staleness::Elapsed(now.saturating_duration_since(*seen)),
        }
    }
}

/// Elapsed time since a category was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Never observed; breaches any threshold.
    Never,
    /// Time since the last observation.
    Elapsed(Duration),
}

impl Staleness {
    /// Whether this staleness breaches `threshold` (inclusive).
    pub fn exceeds(&self, threshold: Duration) -> bool {
        match self {
            Self::Never => true,
            Self::Elapsed(elapsed) => *elapsed >= threshold,
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Elapsed(elapsed) => write!(f, "{:.1}s", elapsed.as_secs_f64()),
        }
    }
}

/// Shared mapping from category to last-seen instant.
///
/// Cloning yields another handle to the same table. Every category has an
/// entry for the lifetime of the table; entries are overwritten, never removed.
#[derive(Debug, Clone)]
pub struct LivenessTable {
    entries: Arc<Mutex<BTreeMap<Category, LastSeen>>>,
}

impl LivenessTable {
    /// Creates a table with `SessionStart` stamped at `started_at` and every
    /// other category unseen.
    pub fn new(started_at: Instant) -> Self {
        let entries = Category::ALL
            .into_iter()
            .map(|category| {
                let seen = match category {
                    Category::SessionStart => LastSeen::At(started_at),
                    _ => LastSeen::Never,
                };
                (category, seen)
            })
            .collect();

        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Records an observation of `category` at `at`.
    pub async fn observe(&self, category: Category, at: Instant) {
        self.entries.lock().await.insert(category, LastSeen::At(at));
    }

    /// Last observation of a single category.
    pub async fn last_seen(&self, category: Category) -> Option<LastSeen> {
        self.entries.lock().await.get(&category).copied()
    }

    /// Copy of the whole table, taken under one lock acquisition.
    pub async fn snapshot(&self) -> BTreeMap<Category, LastSeen> {
        self.entries.lock().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn forget(&self, category: Category) {
        self.entries.lock().await.remove(&category);
    }
}
