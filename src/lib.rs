//! Core library for the validator monitor.
//!
//! The monitor subscribes to a validator's websocket streams, records when each
//! message category was last seen, and sends a rate-limited SMS when a category
//! goes quiet for longer than its threshold. Connection losses are retried a
//! bounded number of times with a fixed delay.
//!
//! Two loops run concurrently:
//! - the receive loop ([`supervisor::ConnectionSupervisor`] driving
//!   [`dispatcher::StreamDispatcher`]), and
//! - the staleness tick ([`monitor::StalenessMonitor`]).
//!
//! They share only the [`liveness::LivenessTable`].

pub mod category;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod liveness;
pub mod monitor;
pub mod notify;
pub mod service;
pub mod supervisor;
pub mod telemetry;
pub mod transport;

pub use category::Category;
pub use config::{ConfigError, MonitorConfig, ThresholdTable};
pub use error::{AppResult, MonitorError};
