//! Merge flow: the marked set doubles as the merge candidate set

use shared::{Action, CellNum, MergeResponse};

use super::{Continuation, EditingSession, Mode};
use crate::error::{SessionError, StoreError, SyncError};
use crate::state::store::Membership;
use crate::sync::{SyncClient, Ticket};
use crate::viewport::scene::Scene;

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    pub(super) fn merge(&mut self) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle, Mode::Zoomed, Mode::Marking], "merge")?;
        if self.in_flight_merge.is_some() {
            return Err(SessionError::Busy { event: "merge" });
        }

        let sources = self.store.marked_ids().to_vec();
        if sources.is_empty() {
            return Err(SessionError::NothingMarked);
        }

        let ticket = self.issue(
            Action::Merge {
                cell_nums: sources.clone(),
            },
            Continuation::Merge {
                sources: sources.clone(),
            },
        );
        self.in_flight_merge = Some(ticket);
        tracing::info!("Requested merge of {sources:?}");
        self.leave_to_idle();
        Ok(())
    }

    /// Sources of the merge still waiting for its reply
    pub(super) fn merge_sources(&self) -> &[CellNum] {
        match self
            .in_flight_merge
            .and_then(|ticket| self.continuations.get(&ticket))
        {
            Some(Continuation::Merge { sources }) => sources.as_slice(),
            _ => &[],
        }
    }

    /// Replace the merged sources with the single object the service built.
    /// The reply is checked in full before the store is touched.
    pub(super) fn finish_merge(
        &mut self,
        ticket: Ticket,
        sources: &[CellNum],
        body: serde_json::Value,
    ) -> Result<(), SessionError> {
        let response: MergeResponse =
            serde_json::from_value(body).map_err(|e| SyncError::Decode(e.to_string()))?;

        let unrequested: Vec<CellNum> = response
            .cell_nums
            .iter()
            .copied()
            .filter(|c| !sources.contains(c))
            .collect();
        if !unrequested.is_empty() {
            tracing::warn!("Merge reply names cells {unrequested:?} that were not requested");
        }

        // Only cells this request asked for are ever removed
        let present: Vec<CellNum> = sources
            .iter()
            .copied()
            .filter(|c| response.cell_nums.is_empty() || response.cell_nums.contains(c))
            .filter(|&c| self.store.contains(c))
            .collect();

        // Nothing left to merge, or a source is being edited right now
        let editing = |c: &CellNum| {
            self.current_cell == Some(*c)
                || self.split_original.as_ref().is_some_and(|a| a.cell == *c)
        };
        if present.is_empty() || present.iter().any(editing) {
            tracing::warn!("Merge reply for {sources:?} no longer applies");
            return Err(SessionError::StaleState { ticket });
        }

        let target = response.object.cell_num;
        if self.store.contains(target) && !present.contains(&target) {
            tracing::error!("Merged cell {target} collides with a cell outside {present:?}");
            return Err(StoreError::DuplicateId(target).into());
        }

        for &cell in &present {
            self.store.remove(cell)?;
        }
        let merged = self
            .store
            .insert_object(&response.object, Membership::Active)?;
        if self.mode != Mode::Idle {
            // Keep the isolated view intact
            self.store.hide(merged)?;
        }
        tracing::info!("Merged {present:?} into cell {merged}");
        Ok(())
    }
}
