//! Websocket transport over tokio-tungstenite.

use super::{Session, Transport};
use crate::error::{AppResult, MonitorError};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

/// Connects to `ws://` and `wss://` endpoints.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl WebSocketTransport {
    /// Creates a transport bounding each connect attempt by `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, endpoint: &str) -> AppResult<Box<dyn Session>> {
        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| {
                MonitorError::Transport(format!(
                    "connect to {} timed out after {:?}",
                    endpoint, self.connect_timeout
                ))
            })?
            .map_err(|e| MonitorError::Transport(format!("connect to {} failed: {}", endpoint, e)))?;

        info!(endpoint, status = %response.status(), "Websocket connected");
        Ok(Box::new(WebSocketSession { stream }))
    }
}

struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Session for WebSocketSession {
    async fn send(&mut self, payload: String) -> AppResult<()> {
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(|e| MonitorError::Transport(format!("send failed: {}", e)))
    }

    async fn receive(&mut self) -> AppResult<Option<String>> {
        loop {
            let frame = match self.stream.next().await {
                None => return Ok(None),
                Some(frame) => {
                    frame.map_err(|e| MonitorError::Transport(format!("receive failed: {}", e)))?
                }
            };

            match frame {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Message::Close(reason) => {
                    debug!(?reason, "Remote sent close frame");
                    return Ok(None);
                }
                // Pongs are queued by tungstenite and flushed on the next read.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Ignoring error while closing websocket");
        }
    }
}
