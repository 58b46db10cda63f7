//! Split flow: seeds, request, verification and rollback

use glam::Vec3;
use shared::{Action, CellNum, SplitResponse};

use super::{Continuation, EditingSession, Mode, MIN_SPLIT_POINTS};
use crate::coords::{world_to_voxel, SplitPoint};
use crate::error::{SessionError, SyncError};
use crate::state::store::Membership;
use crate::sync::{SyncClient, Ticket};
use crate::viewport::scene::Scene;

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    pub(super) fn mark_point(&mut self, position: Vec3, remove: bool) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Zoomed, Mode::Marking], "mark_point")?;

        let voxel = world_to_voxel(position, self.store.voxel_size());
        if self.split_points.iter().any(|p| p.voxel == voxel) {
            tracing::debug!("Voxel {voxel} already marked");
            return Ok(());
        }

        self.split_points.push(SplitPoint { voxel, remove });
        self.store.add_seg_helper(voxel, remove);
        self.set_mode(Mode::Marking);
        Ok(())
    }

    pub(super) fn commit_split(&mut self) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Zoomed, Mode::Marking], "commit_split")?;

        let have = self.split_points.len();
        if have < MIN_SPLIT_POINTS {
            return Err(SessionError::NotEnoughMarkers {
                needed: MIN_SPLIT_POINTS,
                have,
            });
        }
        let Some(cell) = self.current_cell else {
            return Err(SessionError::InvalidTransition {
                mode: self.mode,
                event: "commit_split",
            });
        };

        // Allocated at commit time so marking never races on ids
        let next_cell = self.store.next_available_id();
        let markers = self.split_points.iter().map(|p| p.to_marker()).collect();
        let ticket = self.issue(
            Action::Split {
                markers,
                curr_cell: cell,
                next_cell,
            },
            Continuation::Split { cell, next_cell },
        );
        self.split_points.clear();
        self.in_flight_split = Some(ticket);

        let dimmed = self.settings.display.awaiting_opacity;
        self.store.dim(cell, dimmed);
        tracing::info!("Requested split of cell {cell} with {have} seeds");
        self.set_mode(Mode::AwaitingSplit);
        Ok(())
    }

    /// Materialize a split reply as pending annotations, or roll back
    pub(super) fn finish_split(
        &mut self,
        ticket: Ticket,
        cell: CellNum,
        body: serde_json::Value,
    ) -> Result<(), SessionError> {
        if self.in_flight_split != Some(ticket) || self.mode != Mode::AwaitingSplit {
            return Err(SessionError::StaleState { ticket });
        }
        self.in_flight_split = None;

        let response: SplitResponse =
            serde_json::from_value(body).map_err(|e| SyncError::Decode(e.to_string()))?;
        let kept = response.kept();
        if kept.is_empty() {
            tracing::warn!("Split of cell {cell} was not feasible, rolling back");
            self.store.undim(cell);
            self.store.clear_seg_helpers();
            self.set_mode(Mode::Zoomed);
            return Err(SessionError::InfeasibleSplit { cell });
        }

        let original = match self.store.take(cell) {
            Ok(original) => original,
            Err(e) => {
                tracing::error!("Split target {cell} vanished: {e}");
                self.leave_to_idle();
                return Err(SessionError::StaleState { ticket });
            }
        };

        for info in &kept {
            if let Err(e) = self.store.insert_object(info, Membership::PendingNew) {
                self.store.discard_pending();
                self.store.restore(original)?;
                self.store.focus(cell);
                self.store.clear_seg_helpers();
                self.set_mode(Mode::Zoomed);
                return Err(e.into());
            }
        }

        tracing::info!("Split of cell {cell} produced {} cells", kept.len());
        self.split_original = Some(original);
        self.set_mode(Mode::Verify);
        Ok(())
    }

    pub(super) fn accept(&mut self) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Verify], "accept")?;

        let promoted = self.store.promote_pending();
        if let Some(original) = self.split_original.take() {
            self.store.discard(original);
        }
        self.issue(
            Action::CompleteSegment,
            Continuation::Ack {
                action: "complete_segment",
            },
        );
        tracing::info!("Accepted split into {promoted:?}");
        self.current_cell = None;
        self.leave_to_idle();
        Ok(())
    }

    pub(super) fn reject(&mut self) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Verify], "reject")?;

        let rejected = self.store.discard_pending();
        if let Some(original) = self.split_original.take() {
            self.store.restore(original)?;
        }
        if let Some(cell) = self.current_cell {
            self.store.focus(cell);
        }
        self.issue(
            Action::Undo {
                cell_nums: rejected.clone(),
            },
            Continuation::Ack { action: "undo" },
        );
        tracing::info!("Rejected split result {rejected:?}");
        self.store.clear_seg_helpers();
        self.set_mode(Mode::Zoomed);
        Ok(())
    }

    pub(super) fn cancel(&mut self) -> Result<(), SessionError> {
        match self.mode {
            Mode::Idle => Err(SessionError::InvalidTransition {
                mode: Mode::Idle,
                event: "cancel",
            }),
            Mode::Zoomed | Mode::Marking => {
                self.leave_to_idle();
                Ok(())
            }
            Mode::AwaitingSplit => {
                // The reply, whenever it lands, no longer has a continuation
                tracing::warn!("Abandoned split in flight");
                self.abandon_split();
                self.split_points.clear();
                self.store.clear_seg_helpers();
                self.set_mode(Mode::Zoomed);
                Ok(())
            }
            Mode::Verify => {
                self.abandon_split();
                self.leave_to_idle();
                Ok(())
            }
        }
    }
}
