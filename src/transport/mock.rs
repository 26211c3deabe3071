//! Scripted transport for tests.
//!
//! Each call to `connect` consumes the next [`ScriptedSession`]. Once the
//! script runs out, further connects fail, which makes retry exhaustion easy
//! to provoke.

use super::{Session, Transport};
use crate::error::{AppResult, MonitorError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How a scripted session ends once its messages are drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Remote closes cleanly.
    Close,
    /// Receive fails with a transport error.
    Fail,
    /// Receive never returns.
    Hang,
}

/// Script for one connect attempt.
#[derive(Debug, Clone)]
pub enum ScriptedSession {
    /// The connect attempt fails.
    Refuse,
    /// The connect attempt succeeds but the subscription send fails.
    FailSend,
    /// The session delivers `messages`, then ends as `end`.
    Deliver {
        /// Raw messages returned by successive receives.
        messages: Vec<String>,
        /// Behaviour after the last message.
        end: SessionEnd,
    },
}

impl ScriptedSession {
    /// Session delivering `messages` and then ending as `end`.
    pub fn deliver<I, S>(messages: I, end: SessionEnd) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deliver {
            messages: messages.into_iter().map(Into::into).collect(),
            end,
        }
    }
}

/// Transport replaying a fixed list of sessions.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<ScriptedSession>>>,
    connects: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    /// Creates a transport replaying `script` in order.
    pub fn new(script: impl IntoIterator<Item = ScriptedSession>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Number of connect attempts made so far.
    pub fn connect_attempts(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Every payload sent on any session, oldest first.
    pub fn sent_payloads(&self) -> Vec<String> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn next_script(&self) -> Option<ScriptedSession> {
        match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, endpoint: &str) -> AppResult<Box<dyn Session>> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        match self.next_script() {
            None | Some(ScriptedSession::Refuse) => Err(MonitorError::Transport(format!(
                "scripted refusal of {} (attempt {})",
                endpoint, attempt
            ))),
            Some(ScriptedSession::FailSend) => Ok(Box::new(MockSession {
                messages: VecDeque::new(),
                end: SessionEnd::Close,
                fail_send: true,
                sent: Arc::clone(&self.sent),
            })),
            Some(ScriptedSession::Deliver { messages, end }) => Ok(Box::new(MockSession {
                messages: messages.into(),
                end,
                fail_send: false,
                sent: Arc::clone(&self.sent),
            })),
        }
    }
}

struct MockSession {
    messages: VecDeque<String>,
    end: SessionEnd,
    fail_send: bool,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Session for MockSession {
    async fn send(&mut self, payload: String) -> AppResult<()> {
        if self.fail_send {
            return Err(MonitorError::Transport("scripted send failure".to_string()));
        }
        match self.sent.lock() {
            Ok(mut sent) => sent.push(payload),
            Err(poisoned) => poisoned.into_inner().push(payload),
        }
        Ok(())
    }

    async fn receive(&mut self) -> AppResult<Option<String>> {
        if let Some(message) = self.messages.pop_front() {
            // Yield so a paused-clock test can interleave the tick task.
            tokio::task::yield_now().await;
            return Ok(Some(message));
        }
        match self.end {
            SessionEnd::Close => Ok(None),
            SessionEnd::Fail => Err(MonitorError::Transport("scripted receive failure".to_string())),
            SessionEnd::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}
