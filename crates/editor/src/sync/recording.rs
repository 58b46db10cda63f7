use std::collections::VecDeque;

use shared::Action;

use super::{SyncClient, SyncReply, Ticket};
use crate::error::SyncError;

/// In-process client that records requests and replays scripted replies.
///
/// Used by the headless harness and by offline runs of the binary.
#[derive(Debug, Default)]
pub struct RecordingClient {
    sent: Vec<(Ticket, Action)>,
    inbox: VecDeque<SyncReply>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request sent so far, oldest first
    pub fn sent(&self) -> &[(Ticket, Action)] {
        &self.sent
    }

    /// Most recent request
    pub fn last(&self) -> Option<&(Ticket, Action)> {
        self.sent.last()
    }

    /// Number of requests of one kind
    pub fn count(&self, kind: &str) -> usize {
        self.sent.iter().filter(|(_, a)| a.kind() == kind).count()
    }

    fn kind_of(&self, ticket: Ticket) -> &'static str {
        self.sent
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, a)| a.kind())
            .unwrap_or("unknown")
    }

    /// Queue a successful reply for `ticket`
    pub fn respond(&mut self, ticket: Ticket, body: serde_json::Value) {
        let action = self.kind_of(ticket);
        self.inbox.push_back(SyncReply {
            ticket,
            action,
            result: Ok(body),
        });
    }

    /// Queue a failed reply for `ticket`
    pub fn fail(&mut self, ticket: Ticket, error: SyncError) {
        let action = self.kind_of(ticket);
        self.inbox.push_back(SyncReply {
            ticket,
            action,
            result: Err(error),
        });
    }

    /// Reply to the most recent request; false if nothing was sent
    pub fn respond_last(&mut self, body: serde_json::Value) -> bool {
        match self.last().map(|(t, _)| *t) {
            Some(ticket) => {
                self.respond(ticket, body);
                true
            }
            None => false,
        }
    }
}

impl SyncClient for RecordingClient {
    fn send(&mut self, action: Action) -> Ticket {
        let ticket = Ticket::new();
        tracing::debug!("Recorded {} ({ticket})", action.kind());
        self.sent.push((ticket, action));
        ticket
    }

    fn poll(&mut self) -> Vec<SyncReply> {
        self.inbox.drain(..).collect()
    }
}
