//! Picking, removal marking and whole-mask display controls

use shared::{Action, CellNum};

use super::{Continuation, EditingSession, Mode};
use crate::error::SessionError;
use crate::state::store::Membership;
use crate::sync::SyncClient;
use crate::viewport::picking::{pick_nearest, Ray};
use crate::viewport::scene::Scene;

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    /// Nearest visual of the given sets under the ray
    fn pick(&self, ray: &Ray, sets: &[Membership]) -> Option<CellNum> {
        let handle = pick_nearest(ray, self.store.pick_candidates(sets))?;
        self.store.cell_for_handle(handle)
    }

    pub(super) fn select(&mut self, ray: &Ray) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle], "select")?;

        let Some(cell) = self.pick(ray, &[Membership::Active, Membership::MarkedForRemoval])
        else {
            tracing::debug!("Select missed every cell");
            return Ok(());
        };

        if self.store.membership(cell) == Some(Membership::MarkedForRemoval) {
            if self.merge_sources().contains(&cell) {
                return Err(SessionError::Busy { event: "select" });
            }
            // Marked cells are not eligible for zoom; a hit un-marks them
            self.store.unmark(cell)?;
            return Ok(());
        }

        let hidden = self.store.highlight_only(cell)?;
        self.current_cell = Some(cell);
        tracing::info!("Zoomed on cell {cell} ({} hidden)", hidden.len());
        self.set_mode(Mode::Zoomed);
        Ok(())
    }

    pub(super) fn mark_under_ray(&mut self, ray: &Ray) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle], "mark_for_removal")?;
        if let Some(cell) = self.pick(ray, &[Membership::Active]) {
            self.store.mark_for_removal(cell)?;
        }
        Ok(())
    }

    /// Delete every marked cell locally, then report them in one request
    pub(super) fn commit_removal(&mut self) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle], "commit_removal")?;
        // The marked set is the candidate set of the merge
        if self.in_flight_merge.is_some() {
            return Err(SessionError::Busy {
                event: "commit_removal",
            });
        }
        let removed = self.store.commit_removal();
        if removed.is_empty() {
            tracing::debug!("Nothing marked, no remove request sent");
            return Ok(());
        }
        self.issue(
            Action::Remove {
                rem_objects: removed,
            },
            Continuation::Ack { action: "remove" },
        );
        Ok(())
    }

    pub(super) fn toggle_mask(&mut self, visible: bool) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle], "toggle_mask")?;
        self.store.set_mask_visible(visible);
        Ok(())
    }

    pub(super) fn set_opacity(&mut self, opacity: f32) {
        self.store.set_opacity(opacity);
        if self.mode == Mode::AwaitingSplit {
            if let Some(cell) = self.current_cell {
                let dimmed = self.settings.display.awaiting_opacity;
                self.store.dim(cell, dimmed);
            }
        }
    }
}
