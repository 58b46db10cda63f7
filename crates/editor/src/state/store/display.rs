//! Display helpers for annotations

use super::{Annotation, Membership};

/// Display name for an annotation
pub fn cell_display_name(annotation: &Annotation) -> String {
    format!("Cell {} ({})", annotation.cell, annotation.asset)
}

/// Short label for a membership set
pub fn membership_label(membership: Membership) -> &'static str {
    match membership {
        Membership::Active => "active",
        Membership::MarkedForRemoval => "marked",
        Membership::PendingNew => "pending",
    }
}
