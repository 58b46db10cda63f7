//! Hidden overlay, single-cell focus, opacity and split seed helpers

use glam::IVec3;
use shared::CellNum;

use super::{AnnotationStore, Membership};
use crate::coords::voxel_center;
use crate::error::StoreError;
use crate::palette::{HELPER_KEEP_COLOR, HELPER_REMOVE_COLOR};
use crate::viewport::scene::{Scene, VisualHandle};

impl<S: Scene> AnnotationStore<S> {
    pub fn is_hidden(&self, cell: CellNum) -> bool {
        self.hidden_set.contains(&cell)
    }

    pub fn hidden_ids(&self) -> &[CellNum] {
        &self.hidden
    }

    pub fn mask_visible(&self) -> bool {
        self.mask_visible
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Take a visual out of the scene without touching membership.
    /// Returns false if it was already hidden.
    pub fn hide(&mut self, cell: CellNum) -> Result<bool, StoreError> {
        let visual = self
            .get(cell)
            .map(|a| a.visual)
            .ok_or(StoreError::UnknownCell(cell))?;
        if !self.hidden_set.insert(cell) {
            return Ok(false);
        }
        self.scene.detach(visual);
        self.hidden.push(cell);
        self.version += 1;
        Ok(true)
    }

    /// Put every hidden visual back, most recently hidden first.
    /// Returns the restored ids in that order.
    pub fn restore_all_hidden(&mut self) -> Vec<CellNum> {
        let mut restored = Vec::with_capacity(self.hidden.len());
        while let Some(cell) = self.hidden.pop() {
            self.hidden_set.remove(&cell);
            let Some(entry) = self.entries.get(&cell) else {
                continue;
            };
            if self.mask_visible || entry.membership == Membership::PendingNew {
                self.scene.attach(entry.annotation.visual);
            }
            restored.push(cell);
        }
        if !restored.is_empty() {
            self.version += 1;
        }
        restored
    }

    /// Hide everything except `cell`, which shrinks to the focus marker size.
    /// Returns the ids hidden by this call.
    pub fn highlight_only(&mut self, cell: CellNum) -> Result<Vec<CellNum>, StoreError> {
        if !self.contains(cell) {
            return Err(StoreError::UnknownCell(cell));
        }
        if !self.is_active(cell) {
            return Err(StoreError::NotActive(cell));
        }

        let others: Vec<CellNum> = self
            .entries
            .keys()
            .copied()
            .filter(|&c| c != cell && !self.hidden_set.contains(&c))
            .collect();
        for &other in &others {
            self.hide(other)?;
        }

        self.focus(cell);
        tracing::debug!("Isolated cell {cell}, hid {} others", others.len());
        Ok(others)
    }

    /// Scale a cell down to the focus marker size
    pub fn focus(&mut self, cell: CellNum) {
        if let Some(visual) = self.get(cell).map(|a| a.visual) {
            let scale = self.display.marker_scale;
            self.scene.set_scale(visual, scale);
        }
    }

    /// Undo [`focus`](Self::focus)
    pub fn unfocus(&mut self, cell: CellNum) {
        if let Some(visual) = self.get(cell).map(|a| a.visual) {
            self.scene.set_scale(visual, 1.0);
        }
    }

    /// Draw one cell at a custom opacity (e.g. while its split is in flight)
    pub fn dim(&mut self, cell: CellNum, opacity: f32) {
        if let Some(visual) = self.get(cell).map(|a| a.visual) {
            self.scene.set_opacity(visual, opacity.clamp(0.0, 1.0));
        }
    }

    /// Back to the opacity its set calls for
    pub fn undim(&mut self, cell: CellNum) {
        let Some(entry) = self.entries.get(&cell) else {
            return;
        };
        let opacity = match entry.membership {
            Membership::PendingNew => self.pending_opacity(),
            _ => self.opacity,
        };
        let visual = entry.annotation.visual;
        self.scene.set_opacity(visual, opacity);
    }

    /// Base opacity for every annotation visual
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        let pending = self.pending_opacity();
        for entry in self.entries.values() {
            let value = match entry.membership {
                Membership::PendingNew => pending,
                _ => self.opacity,
            };
            self.scene.set_opacity(entry.annotation.visual, value);
        }
        self.version += 1;
    }

    /// Show or hide the whole mask. Hidden-overlay cells stay hidden.
    pub fn set_mask_visible(&mut self, visible: bool) {
        self.mask_visible = visible;
        for entry in self.entries.values() {
            if self.hidden_set.contains(&entry.annotation.cell)
                || entry.membership == Membership::PendingNew
            {
                continue;
            }
            if visible {
                self.scene.attach(entry.annotation.visual);
            } else {
                self.scene.detach(entry.annotation.visual);
            }
        }
        self.version += 1;
    }

    /// Spawn a seed cube at a voxel; white keeps, black subtracts
    pub fn add_seg_helper(&mut self, voxel: IVec3, remove: bool) -> VisualHandle {
        let color = if remove {
            HELPER_REMOVE_COLOR
        } else {
            HELPER_KEEP_COLOR
        };
        let center = voxel_center(voxel, self.voxel_size);
        let size = self.display.helper_size * self.voxel_size;
        let handle = self.scene.spawn_marker(center, size, color);
        self.scene.attach(handle);
        self.helpers.push(handle);
        handle
    }

    /// Free every seed cube; returns how many there were
    pub fn clear_seg_helpers(&mut self) -> usize {
        let count = self.helpers.len();
        while let Some(handle) = self.helpers.pop() {
            self.scene.despawn(handle);
        }
        count
    }

    pub fn seg_helper_count(&self) -> usize {
        self.helpers.len()
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use crate::fixtures::store_with_cells;
    use crate::palette::{HELPER_KEEP_COLOR, HELPER_REMOVE_COLOR};
    use crate::validation::StoreValidator;

    #[test]
    fn test_hide_keeps_membership() {
        let mut store = store_with_cells(&[1, 2]);
        assert!(store.hide(1).unwrap());
        assert!(!store.hide(1).unwrap());
        assert!(store.is_active(1));
        let visual = store.get(1).unwrap().visual;
        assert!(!store.scene().is_attached(visual));
    }

    #[test]
    fn test_highlight_then_restore_is_exact() {
        let mut store = store_with_cells(&[1, 2, 3, 4]);
        let mut hidden = store.highlight_only(2).unwrap();
        hidden.sort();
        assert_eq!(hidden, vec![1, 3, 4]);
        assert_eq!(store.scene().attached_count(), 1);

        let focus = store.get(2).unwrap().visual;
        assert_eq!(store.scene().node(focus).unwrap().scale, 0.1);

        let mut restored = store.restore_all_hidden();
        restored.sort();
        assert_eq!(restored, hidden);
        assert_eq!(store.scene().attached_count(), 4);
        assert!(store.restore_all_hidden().is_empty());
    }

    #[test]
    fn test_restore_skips_removed_cells() {
        let mut store = store_with_cells(&[1, 2]);
        store.highlight_only(1).unwrap();
        store.remove(2).unwrap();
        assert!(store.restore_all_hidden().is_empty());
    }

    #[test]
    fn test_hidden_lookup_follows_overlay() {
        let mut store = store_with_cells(&[1, 2, 3]);
        store.highlight_only(1).unwrap();
        assert!(store.is_hidden(2) && store.is_hidden(3));
        store.remove(2).unwrap();
        assert!(!store.is_hidden(2));
        assert_eq!(store.hidden_ids(), &[3]);
        // Re-hiding after a restore must not be refused as a duplicate
        store.restore_all_hidden();
        assert!(!store.is_hidden(3));
        assert!(store.hide(3).unwrap());
        assert!(StoreValidator::new(&store).is_hidden_consistent());
    }

    #[test]
    fn test_highlight_rejects_marked() {
        let mut store = store_with_cells(&[1, 2]);
        store.mark_for_removal(1).unwrap();
        assert!(store.highlight_only(1).is_err());
        assert!(store.hidden_ids().is_empty());
    }

    #[test]
    fn test_mask_toggle_leaves_hidden_alone() {
        let mut store = store_with_cells(&[1, 2]);
        store.hide(1).unwrap();
        store.set_mask_visible(false);
        assert_eq!(store.scene().attached_count(), 0);
        store.set_mask_visible(true);
        assert_eq!(store.scene().attached_count(), 1);
        store.restore_all_hidden();
        assert_eq!(store.scene().attached_count(), 2);
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut store = store_with_cells(&[1]);
        store.set_opacity(3.0);
        assert_eq!(store.opacity(), 1.0);
        store.set_opacity(0.4);
        let visual = store.get(1).unwrap().visual;
        assert_eq!(store.scene().node(visual).unwrap().opacity, 0.4);
    }

    #[test]
    fn test_dim_and_undim() {
        let mut store = store_with_cells(&[1]);
        let visual = store.get(1).unwrap().visual;
        store.dim(1, 0.6);
        assert_eq!(store.scene().node(visual).unwrap().opacity, 0.6);
        store.undim(1);
        assert_eq!(store.scene().node(visual).unwrap().opacity, 1.0);
    }

    #[test]
    fn test_seg_helpers_colored_and_cleared() {
        let mut store = store_with_cells(&[]);
        let keep = store.add_seg_helper(IVec3::new(0, 0, 0), false);
        let cut = store.add_seg_helper(IVec3::new(1, 0, 0), true);
        assert_eq!(store.scene().node(keep).unwrap().color, HELPER_KEEP_COLOR);
        assert_eq!(store.scene().node(cut).unwrap().color, HELPER_REMOVE_COLOR);
        assert_eq!(store.scene().marker_count(), 2);
        assert_eq!(store.clear_seg_helpers(), 2);
        assert_eq!(store.scene().marker_count(), 0);
    }
}
