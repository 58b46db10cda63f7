//! Input events consumed by the session

use glam::Vec3;

use crate::viewport::picking::Ray;

/// Closed set of user intents
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Pick a cell: zooms on an active hit, un-marks a marked hit
    Select { ray: Ray },
    /// Flag the active cell under the ray for removal
    MarkForRemoval { ray: Ray },
    /// Add a split seed at a world position
    MarkPoint { position: Vec3, remove: bool },
    CommitSplit,
    Accept,
    Reject,
    /// Merge every marked cell into one
    Merge,
    /// Delete every marked cell
    CommitRemoval,
    /// Leave the current editing step
    Cancel,
    Save { link: String },
    Load { mask_link: String, image_link: String },
    SetOpacity { opacity: f32 },
    ToggleMask { visible: bool },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Select { .. } => "select",
            SessionEvent::MarkForRemoval { .. } => "mark_for_removal",
            SessionEvent::MarkPoint { .. } => "mark_point",
            SessionEvent::CommitSplit => "commit_split",
            SessionEvent::Accept => "accept",
            SessionEvent::Reject => "reject",
            SessionEvent::Merge => "merge",
            SessionEvent::CommitRemoval => "commit_removal",
            SessionEvent::Cancel => "cancel",
            SessionEvent::Save { .. } => "save",
            SessionEvent::Load { .. } => "load",
            SessionEvent::SetOpacity { .. } => "set_opacity",
            SessionEvent::ToggleMask { .. } => "toggle_mask",
        }
    }

    /// Events that cannot conflict with a split in flight
    pub(crate) fn allowed_while_awaiting(&self) -> bool {
        matches!(
            self,
            SessionEvent::Cancel | SessionEvent::Save { .. } | SessionEvent::SetOpacity { .. }
        )
    }
}
