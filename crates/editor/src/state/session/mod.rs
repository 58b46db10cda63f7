//! Editing session
//!
//! One explicitly constructed object owns the annotation store, the sync
//! client and the state machine. Every input arrives as a [`SessionEvent`];
//! every service reply is matched to the continuation registered when its
//! request was sent.

mod events;
mod mask;
mod merge;
mod replies;
mod selection;
mod split;

pub use events::SessionEvent;
pub use replies::Continuation;

use std::collections::HashMap;

use shared::{Action, CellNum};

use crate::coords::SplitPoint;
use crate::error::SessionError;
use crate::state::settings::EditorSettings;
use crate::state::store::{Annotation, AnnotationStore};
use crate::sync::{SyncClient, Ticket};
use crate::viewport::scene::Scene;

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// A single cell is isolated
    Zoomed,
    /// Collecting split seeds on the isolated cell
    Marking,
    /// Split request in flight
    AwaitingSplit,
    /// Split result shown, waiting for accept or reject
    Verify,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Zoomed => "zoomed",
            Mode::Marking => "marking",
            Mode::AwaitingSplit => "awaiting_split",
            Mode::Verify => "verify",
        }
    }
}

/// Outcome of the most recent save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Pending,
    Saved,
    Failed(String),
}

/// Seeds needed before a split can be requested
pub const MIN_SPLIT_POINTS: usize = 2;

pub struct EditingSession<S: Scene, C: SyncClient> {
    store: AnnotationStore<S>,
    client: C,
    settings: EditorSettings,
    mode: Mode,
    /// Cell isolated in ZOOMED and later modes
    current_cell: Option<CellNum>,
    split_points: Vec<SplitPoint>,
    /// Pre-split annotation, kept until the split is accepted or rejected
    split_original: Option<Annotation>,
    in_flight_split: Option<Ticket>,
    in_flight_merge: Option<Ticket>,
    continuations: HashMap<Ticket, Continuation>,
    save_status: Option<SaveStatus>,
    /// Mask of the last successful load
    mask_link: Option<String>,
}

impl<S: Scene, C: SyncClient> EditingSession<S, C> {
    pub fn new(scene: S, client: C, settings: EditorSettings) -> Self {
        Self {
            store: AnnotationStore::new(scene, &settings),
            client,
            settings,
            mode: Mode::Idle,
            current_cell: None,
            split_points: Vec::new(),
            split_original: None,
            in_flight_split: None,
            in_flight_merge: None,
            continuations: HashMap::new(),
            save_status: None,
            mask_link: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn store(&self) -> &AnnotationStore<S> {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn current_cell(&self) -> Option<CellNum> {
        self.current_cell
    }

    pub fn split_points(&self) -> &[SplitPoint] {
        &self.split_points
    }

    /// Annotation set aside while a split result is being verified
    pub fn split_original(&self) -> Option<&Annotation> {
        self.split_original.as_ref()
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.save_status.as_ref()
    }

    pub fn mask_link(&self) -> Option<&str> {
        self.mask_link.as_deref()
    }

    /// Requests whose replies have not been applied yet
    pub fn pending_requests(&self) -> usize {
        self.continuations.len()
    }

    pub fn merge_in_flight(&self) -> bool {
        self.in_flight_merge.is_some()
    }

    /// Apply one input event
    pub fn handle(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        let name = event.name();
        if self.mode == Mode::AwaitingSplit && !event.allowed_while_awaiting() {
            tracing::warn!("Dropped {name} while a split is in flight");
            return Err(SessionError::Busy { event: name });
        }
        tracing::debug!("Handling {name} in {:?}", self.mode);

        match event {
            SessionEvent::Select { ray } => self.select(&ray),
            SessionEvent::MarkForRemoval { ray } => self.mark_under_ray(&ray),
            SessionEvent::MarkPoint { position, remove } => self.mark_point(position, remove),
            SessionEvent::CommitSplit => self.commit_split(),
            SessionEvent::Accept => self.accept(),
            SessionEvent::Reject => self.reject(),
            SessionEvent::Merge => self.merge(),
            SessionEvent::CommitRemoval => self.commit_removal(),
            SessionEvent::Cancel => self.cancel(),
            SessionEvent::Save { link } => self.save(link),
            SessionEvent::Load {
                mask_link,
                image_link,
            } => self.load(mask_link, image_link),
            SessionEvent::SetOpacity { opacity } => {
                self.set_opacity(opacity);
                Ok(())
            }
            SessionEvent::ToggleMask { visible } => self.toggle_mask(visible),
        }
    }

    fn require_mode(&self, allowed: &[Mode], event: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.mode) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                mode: self.mode,
                event,
            })
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::info!("Session {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Send a request and remember what to do with its reply
    fn issue(&mut self, action: Action, continuation: Continuation) -> Ticket {
        let kind = action.kind();
        let ticket = self.client.send(action);
        tracing::debug!("Issued {kind} request {ticket}");
        self.continuations.insert(ticket, continuation);
        ticket
    }

    /// Drop every piece of single-cell editing state and show the whole mask
    fn leave_to_idle(&mut self) {
        if let Some(cell) = self.current_cell.take() {
            self.store.unfocus(cell);
        }
        self.split_points.clear();
        self.store.clear_seg_helpers();
        self.store.restore_all_hidden();
        self.set_mode(Mode::Idle);
    }

    /// Abort whatever split is in progress, restoring the pre-split cell
    fn abandon_split(&mut self) {
        if let Some(ticket) = self.in_flight_split.take() {
            self.continuations.remove(&ticket);
        }
        self.store.discard_pending();
        if let Some(original) = self.split_original.take() {
            let cell = original.cell;
            if let Err(e) = self.store.restore(original) {
                tracing::error!("Could not restore cell {cell}: {e}");
            }
        }
        if let Some(cell) = self.current_cell {
            self.store.undim(cell);
        }
    }
}
