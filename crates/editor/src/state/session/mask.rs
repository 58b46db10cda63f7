//! Loading and saving the mask

use shared::{Action, LoadResponse};

use super::{Continuation, EditingSession, Mode, SaveStatus};
use crate::error::{SessionError, SyncError};
use crate::state::store::Membership;
use crate::sync::SyncClient;
use crate::viewport::scene::Scene;

/// Label value of unsegmented voxels
const BACKGROUND: shared::CellNum = 0;

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    pub(super) fn load(&mut self, mask_link: String, image_link: String) -> Result<(), SessionError> {
        self.require_mode(&[Mode::Idle], "load")?;
        tracing::info!("Loading mask {mask_link}");
        self.issue(
            Action::Load {
                mask_link: mask_link.clone(),
                image_link,
            },
            Continuation::Load { mask_link },
        );
        Ok(())
    }

    pub(super) fn save(&mut self, link: String) -> Result<(), SessionError> {
        if self.settings.persist_palette {
            if let Some(mask) = self.mask_link.as_deref() {
                self.store.save_palette(mask);
            }
        }
        tracing::info!("Saving mask to {link}");
        self.issue(Action::Save { link: link.clone() }, Continuation::Save { link });
        self.save_status = Some(SaveStatus::Pending);
        Ok(())
    }

    /// Replace the store content with the loaded objects
    pub(super) fn finish_load(
        &mut self,
        mask_link: String,
        body: serde_json::Value,
    ) -> Result<(), SessionError> {
        let response: LoadResponse =
            serde_json::from_value(body).map_err(|e| SyncError::Decode(e.to_string()))?;

        // Whatever was being edited belongs to the previous mask
        self.abandon_split();
        if let Some(ticket) = self.in_flight_merge.take() {
            self.continuations.remove(&ticket);
        }
        self.leave_to_idle();
        self.store.reset();

        if self.settings.persist_palette && self.store.load_palette(&mask_link) {
            tracing::debug!("Reusing remembered colors for {mask_link}");
        }

        let mut first_error = None;
        for info in response.obj_paths.iter().filter(|o| o.cell_num != BACKGROUND) {
            if let Err(e) = self.store.insert_object(info, Membership::Active) {
                first_error.get_or_insert(e);
            }
        }
        tracing::info!("Loaded {} cells from {mask_link}", self.store.len());
        self.mask_link = Some(mask_link);

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
