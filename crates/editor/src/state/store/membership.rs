//! Set membership: add, mark/unmark, batched removal, pending promotion

use shared::{AnnotationSummary, CellNum, ObjectInfo};

use super::{Annotation, AnnotationStore, Entry, Membership};
use crate::error::StoreError;
use crate::palette::REMOVAL_COLOR;
use crate::viewport::scene::Scene;

impl<S: Scene> AnnotationStore<S> {
    fn insert_entry(
        &mut self,
        annotation: Annotation,
        membership: Membership,
    ) -> Result<(), StoreError> {
        let cell = annotation.cell;
        if self.entries.contains_key(&cell) {
            tracing::error!("Rejected duplicate cell id {cell}");
            // The rejected annotation is destroyed with its visual
            self.scene.despawn(annotation.visual);
            return Err(StoreError::DuplicateId(cell));
        }

        let handle = annotation.visual;
        let opacity = match membership {
            Membership::PendingNew => self.pending_opacity(),
            _ => self.opacity,
        };
        let color = self.base_color(&annotation);
        self.scene.set_color(handle, color);
        self.scene.set_opacity(handle, opacity);
        self.scene.set_scale(handle, 1.0);
        if self.mask_visible || membership == Membership::PendingNew {
            self.scene.attach(handle);
        }

        self.max_seen = self.max_seen.max(cell);
        self.handles.insert(handle, cell);
        self.entries.insert(
            cell,
            Entry {
                annotation,
                membership,
            },
        );
        self.version += 1;
        Ok(())
    }

    /// Unlink an entry from every index. The visual stays alive.
    fn remove_entry(&mut self, cell: CellNum) -> Option<Annotation> {
        let entry = self.entries.remove(&cell)?;
        self.handles.remove(&entry.annotation.visual);
        self.marked_order.retain(|&c| c != cell);
        if self.hidden_set.remove(&cell) {
            self.hidden.retain(|&c| c != cell);
        }
        self.version += 1;
        Some(entry.annotation)
    }

    fn require_active(&self, cell: CellNum) -> Result<(), StoreError> {
        match self.membership(cell) {
            None => Err(StoreError::UnknownCell(cell)),
            Some(Membership::Active) => Ok(()),
            Some(_) => Err(StoreError::NotActive(cell)),
        }
    }

    fn require_marked(&self, cell: CellNum) -> Result<(), StoreError> {
        match self.membership(cell) {
            None => Err(StoreError::UnknownCell(cell)),
            Some(Membership::MarkedForRemoval) => Ok(()),
            Some(_) => Err(StoreError::NotMarked(cell)),
        }
    }

    fn set_membership(&mut self, cell: CellNum, membership: Membership) {
        if let Some(entry) = self.entries.get_mut(&cell) {
            entry.membership = membership;
            self.version += 1;
        }
    }

    /// Insert into `active` and attach the visual
    pub fn add(&mut self, annotation: Annotation) -> Result<(), StoreError> {
        self.insert_entry(annotation, Membership::Active)
    }

    /// Insert into `pending_new`, drawn at reduced opacity
    pub fn add_pending(&mut self, annotation: Annotation) -> Result<(), StoreError> {
        self.insert_entry(annotation, Membership::PendingNew)
    }

    /// Create and insert an annotation for a service object.
    /// Nothing is spawned when the id is already taken.
    pub fn insert_object(
        &mut self,
        info: &ObjectInfo,
        membership: Membership,
    ) -> Result<CellNum, StoreError> {
        if self.contains(info.cell_num) {
            tracing::error!("Rejected duplicate cell id {}", info.cell_num);
            return Err(StoreError::DuplicateId(info.cell_num));
        }
        let annotation = self.create(info);
        self.insert_entry(annotation, membership)?;
        Ok(info.cell_num)
    }

    /// Move `active -> marked_for_removal` and paint the removal indicator
    pub fn mark_for_removal(&mut self, cell: CellNum) -> Result<(), StoreError> {
        self.require_active(cell)?;
        self.set_membership(cell, Membership::MarkedForRemoval);
        self.marked_order.push(cell);
        if let Some(annotation) = self.get(cell) {
            let handle = annotation.visual;
            self.scene.set_color(handle, REMOVAL_COLOR);
        }
        tracing::debug!("Marked cell {cell} for removal");
        Ok(())
    }

    /// Move `marked_for_removal -> active` and restore the palette color
    pub fn unmark(&mut self, cell: CellNum) -> Result<(), StoreError> {
        self.require_marked(cell)?;
        self.set_membership(cell, Membership::Active);
        self.marked_order.retain(|&c| c != cell);
        if let Some(annotation) = self.get(cell) {
            let (handle, color) = (annotation.visual, self.base_color(annotation));
            self.scene.set_color(handle, color);
        }
        tracing::debug!("Unmarked cell {cell}");
        Ok(())
    }

    /// Delete every marked annotation and return their summaries,
    /// in marking order, for the batched remove request
    pub fn commit_removal(&mut self) -> Vec<AnnotationSummary> {
        let marked = std::mem::take(&mut self.marked_order);
        let mut removed = Vec::with_capacity(marked.len());
        for cell in marked {
            if let Some(annotation) = self.remove_entry(cell) {
                self.scene.despawn(annotation.visual);
                removed.push(annotation.summary());
            }
        }
        if !removed.is_empty() {
            tracing::info!("Removed {} cells", removed.len());
        }
        removed
    }

    /// Destroy one annotation regardless of its set
    pub fn remove(&mut self, cell: CellNum) -> Result<AnnotationSummary, StoreError> {
        let annotation = self
            .remove_entry(cell)
            .ok_or(StoreError::UnknownCell(cell))?;
        self.scene.despawn(annotation.visual);
        Ok(annotation.summary())
    }

    /// Promote every pending annotation to active at full opacity
    pub fn promote_pending(&mut self) -> Vec<CellNum> {
        let pending = self.ids(Membership::PendingNew);
        for &cell in &pending {
            self.set_membership(cell, Membership::Active);
            if let Some(annotation) = self.get(cell) {
                let handle = annotation.visual;
                self.scene.set_opacity(handle, self.opacity);
                if self.mask_visible {
                    self.scene.attach(handle);
                }
            }
        }
        pending
    }

    /// Destroy every pending annotation; returns their ids ascending
    pub fn discard_pending(&mut self) -> Vec<CellNum> {
        let pending = self.ids(Membership::PendingNew);
        for &cell in &pending {
            if let Some(annotation) = self.remove_entry(cell) {
                self.scene.despawn(annotation.visual);
            }
        }
        pending
    }

    /// Move an active annotation out of the store, visual detached but alive
    pub fn take(&mut self, cell: CellNum) -> Result<Annotation, StoreError> {
        self.require_active(cell)?;
        let annotation = self
            .remove_entry(cell)
            .ok_or(StoreError::UnknownCell(cell))?;
        self.scene.detach(annotation.visual);
        Ok(annotation)
    }

    /// Put a previously taken annotation back into `active`
    pub fn restore(&mut self, annotation: Annotation) -> Result<(), StoreError> {
        self.insert_entry(annotation, Membership::Active)
    }

    /// Destroy an annotation that is no longer in the store
    pub fn discard(&mut self, annotation: Annotation) {
        self.scene.despawn(annotation.visual);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::fixtures::{object_info, store_with_cells};
    use crate::palette::{self, REMOVAL_COLOR};
    use crate::state::store::Membership;
    use crate::validation::StoreValidator;

    #[test]
    fn test_add_attaches_and_colors() {
        let store = store_with_cells(&[1, 2]);
        let a = store.get(1).unwrap();
        let node = store.scene().node(a.visual).unwrap();
        assert!(node.attached);
        assert_eq!(node.color, palette::color(a.color_index));
        assert_eq!(store.ids(Membership::Active), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_id_rejected_without_side_effects() {
        let mut store = store_with_cells(&[1]);
        let nodes_before = store.scene().node_count();
        let version = store.version();

        let err = store.insert_object(&object_info(1), Membership::Active).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(1));
        assert_eq!(store.scene().node_count(), nodes_before);
        assert_eq!(store.version(), version);

        let dup = store.create(&object_info(1));
        assert_eq!(store.add(dup).unwrap_err(), StoreError::DuplicateId(1));
        assert_eq!(store.scene().node_count(), nodes_before);
    }

    #[test]
    fn test_duplicate_across_sets() {
        let mut store = store_with_cells(&[1]);
        store.mark_for_removal(1).unwrap();
        let err = store.insert_object(&object_info(1), Membership::PendingNew).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(1));
    }

    #[test]
    fn test_mark_and_unmark() {
        let mut store = store_with_cells(&[1, 2, 3]);
        store.mark_for_removal(2).unwrap();
        let visual = store.get(2).unwrap().visual;
        assert_eq!(store.scene().node(visual).unwrap().color, REMOVAL_COLOR);
        assert_eq!(store.membership(2), Some(Membership::MarkedForRemoval));
        assert_eq!(store.marked_ids(), &[2]);

        store.unmark(2).unwrap();
        let annotation = store.get(2).unwrap();
        assert_eq!(
            store.scene().node(visual).unwrap().color,
            palette::color(annotation.color_index)
        );
        assert!(store.marked_ids().is_empty());
        assert!(StoreValidator::new(&store).validate_all().is_empty());
    }

    #[test]
    fn test_mark_requires_active() {
        let mut store = store_with_cells(&[1]);
        assert_eq!(store.mark_for_removal(9), Err(StoreError::UnknownCell(9)));
        store.mark_for_removal(1).unwrap();
        assert_eq!(store.mark_for_removal(1), Err(StoreError::NotActive(1)));
        assert_eq!(store.marked_ids(), &[1]);
        store.unmark(1).unwrap();
        assert_eq!(store.unmark(1), Err(StoreError::NotMarked(1)));
    }

    #[test]
    fn test_commit_removal_deletes_marked_only() {
        let mut store = store_with_cells(&[1, 2, 3]);
        store.mark_for_removal(3).unwrap();
        store.mark_for_removal(1).unwrap();
        let removed = store.commit_removal();
        let ids: Vec<_> = removed.iter().map(|s| s.cell_num).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(store.ids(Membership::Active), vec![2]);
        assert!(store.marked_ids().is_empty());
        assert_eq!(store.scene().node_count(), 1);
        assert!(store.commit_removal().is_empty());
    }

    #[test]
    fn test_next_id_monotonic_after_removal() {
        let mut store = store_with_cells(&[1, 7]);
        assert_eq!(store.next_available_id(), 8);
        store.mark_for_removal(7).unwrap();
        store.commit_removal();
        assert_eq!(store.next_available_id(), 8);
        store.remove(1).unwrap();
        assert_eq!(store.next_available_id(), 8);
    }

    #[test]
    fn test_pending_promote() {
        let mut store = store_with_cells(&[1]);
        store.insert_object(&object_info(2), Membership::PendingNew).unwrap();
        let visual = store.get(2).unwrap().visual;
        assert_eq!(store.scene().node(visual).unwrap().opacity, 0.5);

        assert_eq!(store.promote_pending(), vec![2]);
        assert_eq!(store.membership(2), Some(Membership::Active));
        assert_eq!(store.scene().node(visual).unwrap().opacity, 1.0);
    }

    #[test]
    fn test_pending_discard_sorted() {
        let mut store = store_with_cells(&[]);
        store.insert_object(&object_info(9), Membership::PendingNew).unwrap();
        store.insert_object(&object_info(4), Membership::PendingNew).unwrap();
        assert_eq!(store.discard_pending(), vec![4, 9]);
        assert!(store.is_empty());
        assert_eq!(store.scene().node_count(), 0);
        // ids seen while pending are still never reused
        assert_eq!(store.next_available_id(), 10);
    }

    #[test]
    fn test_take_and_restore() {
        let mut store = store_with_cells(&[5]);
        let taken = store.take(5).unwrap();
        assert!(!store.contains(5));
        assert!(!store.scene().is_attached(taken.visual));
        assert!(store.cell_for_handle(taken.visual).is_none());

        let visual = taken.visual;
        store.restore(taken).unwrap();
        assert!(store.is_active(5));
        assert!(store.scene().is_attached(visual));
        assert_eq!(store.cell_for_handle(visual), Some(5));
    }

    #[test]
    fn test_discard_frees_visual() {
        let mut store = store_with_cells(&[5]);
        let taken = store.take(5).unwrap();
        let visual = taken.visual;
        store.discard(taken);
        assert!(store.scene().node(visual).is_none());
    }
}
