//! Error types for store, sync and session operations.

use shared::CellNum;
use thiserror::Error;

use crate::state::session::Mode;
use crate::sync::Ticket;

/// Local invariant violations. The offending operation leaves the store untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Cell id already present in active, marked or pending
    #[error("cell {0} already exists")]
    DuplicateId(CellNum),

    #[error("cell {0} is not in the store")]
    UnknownCell(CellNum),

    #[error("cell {0} is not active")]
    NotActive(CellNum),

    #[error("cell {0} is not marked for removal")]
    NotMarked(CellNum),
}

/// Failures talking to the segmentation service. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Service unreachable or connection dropped
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("service responded with status {0}")]
    Status(u16),

    /// Body was not the JSON the action expects
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Async runtime could not be started
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Errors reported by the editing session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Service found no separable region; the session rolled back to zoomed
    #[error("split of cell {cell} was not feasible")]
    InfeasibleSplit { cell: CellNum },

    /// Reply refers to state already superseded locally; ignored
    #[error("stale reply {ticket} ignored")]
    StaleState { ticket: Ticket },

    #[error("{event} is not valid while {mode:?}")]
    InvalidTransition { mode: Mode, event: &'static str },

    /// Stray input while a conflicting request is in flight
    #[error("request in flight, {event} dropped")]
    Busy { event: &'static str },

    #[error("split needs at least {needed} markers, have {have}")]
    NotEnoughMarkers { needed: usize, have: usize },

    #[error("no cells are marked")]
    NothingMarked,
}

impl SessionError {
    /// Conditions the session already recovered from on its own
    pub fn is_recovered(&self) -> bool {
        matches!(
            self,
            SessionError::InfeasibleSplit { .. } | SessionError::StaleState { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts() {
        let e: SessionError = StoreError::DuplicateId(3).into();
        assert_eq!(e.to_string(), "cell 3 already exists");
        assert!(!e.is_recovered());
    }

    #[test]
    fn test_sync_error_message() {
        let e: SessionError = SyncError::Status(500).into();
        assert_eq!(e.to_string(), "service responded with status 500");
    }

    #[test]
    fn test_infeasible_split_is_recovered() {
        assert!(SessionError::InfeasibleSplit { cell: 5 }.is_recovered());
    }
}
