//! Annotation store validation utilities.
//!
//! `StoreValidator` checks the structural invariants of an `AnnotationStore`:
//! set exclusivity, the handle reverse index, the marking order, the hidden
//! overlay and monotonic id allocation.

use std::collections::HashSet;

use crate::state::store::{AnnotationStore, Membership};
use crate::viewport::scene::Scene;

/// Validator for `AnnotationStore` invariants.
pub struct StoreValidator<'a, S: Scene> {
    store: &'a AnnotationStore<S>,
}

impl<'a, S: Scene> StoreValidator<'a, S> {
    pub fn new(store: &'a AnnotationStore<S>) -> Self {
        Self { store }
    }

    /// Every visual maps back to exactly the cell that owns it.
    pub fn is_reverse_index_consistent(&self) -> bool {
        let parts = self.store.raw_parts();
        parts.handles.len() == parts.entries.len()
            && parts
                .entries
                .iter()
                .all(|(cell, a, _)| parts.handles.get(&a.visual) == Some(cell))
    }

    /// Marking order lists exactly the marked cells, once each.
    pub fn is_marked_order_consistent(&self) -> bool {
        let parts = self.store.raw_parts();
        let marked: HashSet<_> = parts
            .entries
            .iter()
            .filter(|(_, _, m)| *m == Membership::MarkedForRemoval)
            .map(|(cell, _, _)| *cell)
            .collect();
        let ordered: HashSet<_> = parts.marked_order.iter().copied().collect();
        ordered.len() == parts.marked_order.len() && ordered == marked
    }

    /// Hidden ids are known cells, listed once, and match the lookup set.
    pub fn is_hidden_consistent(&self) -> bool {
        let parts = self.store.raw_parts();
        let known: HashSet<_> = parts.entries.iter().map(|(cell, _, _)| *cell).collect();
        let hidden: HashSet<_> = parts.hidden.iter().copied().collect();
        hidden.len() == parts.hidden.len()
            && hidden.is_subset(&known)
            && &hidden == parts.hidden_set
    }

    /// Next id is above every cell currently held.
    pub fn is_allocation_monotonic(&self) -> bool {
        let next = self.store.next_available_id();
        self.store
            .raw_parts()
            .entries
            .iter()
            .all(|(cell, _, _)| *cell < next)
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the store is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let parts = self.store.raw_parts();

        for (cell, annotation, _) in &parts.entries {
            if *cell != annotation.cell {
                errors.push(format!(
                    "Entry {cell} holds annotation for cell {}",
                    annotation.cell
                ));
            }
        }

        if !self.is_reverse_index_consistent() {
            errors.push(format!(
                "Reverse index has {} handles for {} annotations",
                parts.handles.len(),
                parts.entries.len()
            ));
        }

        if !self.is_marked_order_consistent() {
            errors.push(format!(
                "Marking order {:?} disagrees with marked set",
                parts.marked_order
            ));
        }

        if !self.is_hidden_consistent() {
            errors.push(format!("Hidden overlay {:?} is inconsistent", parts.hidden));
        }

        if !self.is_allocation_monotonic() {
            errors.push(format!(
                "Next id {} does not exceed every cell (max seen {})",
                self.store.next_available_id(),
                parts.max_seen
            ));
        }

        errors
    }
}
