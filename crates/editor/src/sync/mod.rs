//! Fire-and-forget channel to the segmentation service.
//!
//! `send` never blocks. Replies are collected in the background and handed
//! back through `poll`, which the session calls from its own event loop.

mod http;
mod recording;

pub use http::HttpSyncClient;
pub use recording::RecordingClient;

use std::fmt;

use shared::Action;

use crate::error::SyncError;

/// Correlates a request with its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub uuid::Uuid);

impl Ticket {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for Ticket {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one request
#[derive(Debug, Clone)]
pub struct SyncReply {
    pub ticket: Ticket,
    /// Wire name of the action that produced this reply
    pub action: &'static str,
    pub result: Result<serde_json::Value, SyncError>,
}

/// Request/response channel to the segmentation service
pub trait SyncClient {
    /// Queue a request and return the ticket its reply will carry
    fn send(&mut self, action: Action) -> Ticket;

    /// Drain the replies that arrived since the last call
    fn poll(&mut self) -> Vec<SyncReply>;
}
