//! Service replies, matched to the continuation registered at send time

use shared::{Ack, CellNum};

use super::{EditingSession, SaveStatus};
use crate::error::SessionError;
use crate::sync::{SyncClient, SyncReply};
use crate::viewport::scene::Scene;

/// What to do with the reply to one request. Each runs at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    Load { mask_link: String },
    Save { link: String },
    Split { cell: CellNum, next_cell: CellNum },
    Merge { sources: Vec<CellNum> },
    /// Nothing to apply beyond logging the outcome
    Ack { action: &'static str },
}

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    /// Apply every reply that arrived since the last call.
    /// Returns the errors they produced, recovered ones included.
    pub fn poll(&mut self) -> Vec<SessionError> {
        let mut errors = Vec::new();
        for reply in self.client.poll() {
            if let Err(e) = self.handle_reply(reply) {
                if e.is_recovered() {
                    tracing::warn!("{e}");
                } else {
                    tracing::error!("{e}");
                }
                errors.push(e);
            }
        }
        errors
    }

    /// Apply one reply
    pub fn handle_reply(&mut self, reply: SyncReply) -> Result<(), SessionError> {
        let SyncReply {
            ticket,
            action,
            result,
        } = reply;
        let Some(continuation) = self.continuations.remove(&ticket) else {
            return Err(SessionError::StaleState { ticket });
        };
        tracing::debug!("Reply to {action} request {ticket}");

        match continuation {
            Continuation::Load { mask_link } => self.finish_load(mask_link, result?),
            Continuation::Save { link } => {
                match result {
                    Ok(_) => {
                        tracing::info!("Saved mask to {link}");
                        self.save_status = Some(SaveStatus::Saved);
                    }
                    Err(e) => {
                        self.save_status = Some(SaveStatus::Failed(e.to_string()));
                        return Err(e.into());
                    }
                }
                Ok(())
            }
            Continuation::Split { cell, next_cell } => {
                let body = match result {
                    Ok(body) => body,
                    Err(e) => {
                        // Stalled until a cancel; nothing is rolled back
                        tracing::error!("Split of cell {cell} (next id {next_cell}) failed");
                        self.in_flight_split = None;
                        return Err(e.into());
                    }
                };
                self.finish_split(ticket, cell, body)
            }
            Continuation::Merge { sources } => {
                if self.in_flight_merge == Some(ticket) {
                    self.in_flight_merge = None;
                }
                self.finish_merge(ticket, &sources, result?)
            }
            Continuation::Ack { action } => {
                // Any successful body acknowledges; only a message is read from it
                let ack: Ack = serde_json::from_value(result?).unwrap_or_default();
                match ack.message {
                    Some(message) => tracing::debug!("Service acknowledged {action}: {message}"),
                    None => tracing::debug!("Service acknowledged {action}"),
                }
                Ok(())
            }
        }
    }
}
