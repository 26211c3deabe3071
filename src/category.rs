//! Message categories observed on the validator stream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification tag for an inbound stream message.
///
/// The set is closed: stream messages carrying any other `type` tag are not
/// tracked. `SessionStart` is synthetic, it is stamped once when the monitor
/// starts and never produced by the stream, so its staleness reads as uptime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// `ledgerClosed` events from the `ledger` stream.
    LedgerClosed,
    /// `consensusPhase` events from the `consensus` stream.
    ConsensusPhase,
    /// `serverStatus` heartbeats from the `server` stream.
    ServerStatus,
    /// Command responses (e.g. the subscribe acknowledgement).
    Response,
    /// Synthetic marker stamped at monitor start.
    SessionStart,
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 5] = [
        Category::LedgerClosed,
        Category::ConsensusPhase,
        Category::ServerStatus,
        Category::Response,
        Category::SessionStart,
    ];

    /// Classify a stream `type` tag.
    ///
    /// Returns `None` for tags outside the tracked set, including anything that
    /// would name the synthetic `SessionStart` marker.
    pub fn from_stream_type(tag: &str) -> Option<Self> {
        match tag {
            "ledgerClosed" => Some(Self::LedgerClosed),
            "consensusPhase" => Some(Self::ConsensusPhase),
            "serverStatus" => Some(Self::ServerStatus),
            "response" => Some(Self::Response),
            _ => None,
        }
    }

    /// The `type` tag the stream uses for this category, if any.
    pub fn stream_type(&self) -> Option<&'static str> {
        match self {
            Self::LedgerClosed => Some("ledgerClosed"),
            Self::ConsensusPhase => Some("consensusPhase"),
            Self::ServerStatus => Some("serverStatus"),
            Self::Response => Some("response"),
            Self::SessionStart => None,
        }
    }

    /// Configuration name (snake_case).
    pub fn name(&self) -> &'static str {
        match self {
            Self::LedgerClosed => "ledger_closed",
            Self::ConsensusPhase => "consensus_phase",
            Self::ServerStatus => "server_status",
            Self::Response => "response",
            Self::SessionStart => "session_start",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(Category::name).collect();
                format!("Unknown category '{}'. Must be one of: {}", s, known.join(", "))
            })
    }
}
