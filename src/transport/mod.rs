//! Stream transport capability.
//!
//! The supervisor only needs to open a session, send one subscription request
//! and then read text messages until the session ends. [`Transport`] and
//! [`Session`] capture exactly that, so the production websocket client and the
//! scripted test transport are interchangeable.

pub mod mock;
pub mod websocket;

pub use mock::{ScriptedSession, ScriptedTransport};
pub use websocket::WebSocketTransport;

use crate::error::AppResult;
use async_trait::async_trait;

/// Opens sessions to a remote endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects to `endpoint`.
    async fn connect(&self, endpoint: &str) -> AppResult<Box<dyn Session>>;
}

/// One open connection.
#[async_trait]
pub trait Session: Send {
    /// Sends one text payload.
    async fn send(&mut self, payload: String) -> AppResult<()>;

    /// Waits for the next text message.
    ///
    /// Returns `Ok(None)` when the remote closed the session cleanly.
    async fn receive(&mut self) -> AppResult<Option<String>>;

    /// Closes the session; errors are ignored.
    async fn close(&mut self);
}
