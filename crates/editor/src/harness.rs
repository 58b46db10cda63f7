//! Headless test harness for driving an editing session.
//!
//! Wraps a session backed by `HeadlessScene` and `RecordingClient`, so tests
//! can aim rays at cells, script service replies and inspect the store.

use glam::{IVec3, Vec3};
use serde_json::Value;
use shared::{Action, CellNum};

use crate::coords::voxel_center;
use crate::error::{SessionError, SyncError};
use crate::fixtures::{cell_region, load_response_json};
use crate::state::session::{EditingSession, SessionEvent};
use crate::state::settings::EditorSettings;
use crate::sync::{RecordingClient, Ticket};
use crate::validation::StoreValidator;
use crate::viewport::picking::Ray;
use crate::viewport::scene::HeadlessScene;

/// Distance rays start from in front of their target
const RAY_STANDOFF: f32 = 100.0;

/// Headless test harness: one session, a scene graph and a scripted service
pub struct TestHarness {
    pub session: EditingSession<HeadlessScene, RecordingClient>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Empty session; nothing is read from or written to disk
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::ephemeral())
    }

    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            session: EditingSession::new(HeadlessScene::new(), RecordingClient::new(), settings),
        }
    }

    /// Session whose `mask.tif` load returned the given cells
    pub fn with_cells(cells: &[CellNum]) -> Self {
        let mut harness = Self::new();
        harness.load_cells(cells);
        harness
    }

    // ── Input ─────────────────────────────────────────────────

    pub fn send(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        self.session.handle(event)
    }

    /// Load `mask.tif` and answer with the given cells
    pub fn load_cells(&mut self, cells: &[CellNum]) -> Vec<SessionError> {
        let sent = self.send(SessionEvent::Load {
            mask_link: "mask.tif".to_string(),
            image_link: "image.tif".to_string(),
        });
        match sent {
            Ok(()) => self.respond_last(load_response_json(cells)),
            Err(e) => vec![e],
        }
    }

    /// Ray along +z through the middle of a cell
    pub fn ray_to_cell(&self, cell: CellNum) -> Ray {
        let store = self.session.store();
        let region = store
            .get(cell)
            .map(|a| a.region)
            .unwrap_or_else(|| cell_region(cell));
        let target = region.world_aabb(store.voxel_size()).center();
        Ray::new(target - Vec3::Z * RAY_STANDOFF, Vec3::Z)
    }

    pub fn select_cell(&mut self, cell: CellNum) -> Result<(), SessionError> {
        let ray = self.ray_to_cell(cell);
        self.send(SessionEvent::Select { ray })
    }

    pub fn mark_cell(&mut self, cell: CellNum) -> Result<(), SessionError> {
        let ray = self.ray_to_cell(cell);
        self.send(SessionEvent::MarkForRemoval { ray })
    }

    /// Place a split seed in the middle of a voxel
    pub fn mark_voxel(&mut self, x: i32, y: i32, z: i32, remove: bool) -> Result<(), SessionError> {
        let position = voxel_center(IVec3::new(x, y, z), self.session.store().voxel_size());
        self.send(SessionEvent::MarkPoint { position, remove })
    }

    // ── Service ───────────────────────────────────────────────

    pub fn last_ticket(&self) -> Option<Ticket> {
        self.session.client().last().map(|(t, _)| *t)
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.session.client().last().map(|(_, a)| a)
    }

    pub fn sent_count(&self, kind: &str) -> usize {
        self.session.client().count(kind)
    }

    /// Answer the most recent request and apply the reply
    pub fn respond_last(&mut self, body: Value) -> Vec<SessionError> {
        self.session.client_mut().respond_last(body);
        self.session.poll()
    }

    /// Fail the most recent request and apply the failure
    pub fn fail_last(&mut self, error: SyncError) -> Vec<SessionError> {
        if let Some(ticket) = self.last_ticket() {
            self.session.client_mut().fail(ticket, error);
        }
        self.session.poll()
    }

    // ── Inspection ────────────────────────────────────────────

    /// Store invariant violations; empty when consistent
    pub fn validate(&self) -> Vec<String> {
        StoreValidator::new(self.session.store()).validate_all()
    }

    /// Visuals currently drawn, helpers included
    pub fn visible_count(&self) -> usize {
        self.session.store().scene().attached_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_only_its_cell() {
        let h = TestHarness::with_cells(&[1, 2, 3]);
        let ray = h.ray_to_cell(2);
        let store = h.session.store();
        let hits: Vec<_> = store
            .pick_candidates(&[crate::state::store::Membership::Active])
            .into_iter()
            .filter(|(_, b)| crate::viewport::picking::ray_aabb(&ray, b).is_some())
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(store.cell_for_handle(hits[0].0), Some(2));
    }

    #[test]
    fn test_loaded_harness_is_valid() {
        let h = TestHarness::with_cells(&[1, 2]);
        assert!(h.validate().is_empty());
        assert_eq!(h.visible_count(), 2);
    }
}
