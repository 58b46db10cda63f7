//! Annotation store
//!
//! Owns every annotation of the session and its membership in one of the
//! mutually exclusive sets (active, marked for removal, pending new). Hiding is
//! an overlay on top of membership, not a set of its own.

mod display;
mod membership;
mod persistence;
mod visibility;

pub use display::{cell_display_name, membership_label};

use std::collections::{BTreeMap, HashMap, HashSet};

use shared::{AnnotationSummary, CellNum, ObjectInfo};

use crate::coords::{to_wire, BoundingRegion};
use crate::palette::{self, PaletteMemory};
use crate::state::settings::{DisplaySettings, EditorSettings};
use crate::viewport::picking::Aabb;
use crate::viewport::scene::{Scene, VisualHandle};

/// One segmented cell
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub cell: CellNum,
    /// Owned visual; freed when the annotation is destroyed
    pub visual: VisualHandle,
    pub region: BoundingRegion,
    pub color_index: usize,
    /// Surface asset the visual was built from
    pub asset: String,
}

impl Annotation {
    pub fn summary(&self) -> AnnotationSummary {
        AnnotationSummary {
            cell_num: self.cell,
            path: self.asset.clone(),
            min_coords: to_wire(self.region.min),
            max_coords: to_wire(self.region.max),
        }
    }
}

/// Which set an annotation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Active,
    MarkedForRemoval,
    PendingNew,
}

#[derive(Debug)]
struct Entry {
    annotation: Annotation,
    membership: Membership,
}

/// Authoritative annotation set with scene side effects
pub struct AnnotationStore<S: Scene> {
    scene: S,
    palette: PaletteMemory,
    entries: BTreeMap<CellNum, Entry>,
    /// Reverse lookup visual -> cell
    handles: HashMap<VisualHandle, CellNum>,
    /// Marked cells in marking order
    marked_order: Vec<CellNum>,
    /// Hidden overlay, drained LIFO
    hidden: Vec<CellNum>,
    /// Membership index over `hidden`
    hidden_set: HashSet<CellNum>,
    /// Transient split seed cubes
    helpers: Vec<VisualHandle>,
    /// Highest cell id ever seen in this session
    max_seen: CellNum,
    /// Base opacity for annotation visuals
    opacity: f32,
    mask_visible: bool,
    voxel_size: f32,
    display: DisplaySettings,
    /// Monotonically increasing version counter for cache invalidation
    version: u64,
}

impl<S: Scene> AnnotationStore<S> {
    pub fn new(scene: S, settings: &EditorSettings) -> Self {
        Self {
            scene,
            palette: PaletteMemory::default(),
            entries: BTreeMap::new(),
            handles: HashMap::new(),
            marked_order: Vec::new(),
            hidden: Vec::new(),
            hidden_set: HashSet::new(),
            helpers: Vec::new(),
            max_seen: 0,
            opacity: 1.0,
            mask_visible: true,
            voxel_size: settings.voxel_size,
            display: settings.display.clone(),
            version: 0,
        }
    }

    /// Current store version (increments on every mutation)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn palette(&self) -> &PaletteMemory {
        &self.palette
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn get(&self, cell: CellNum) -> Option<&Annotation> {
        self.entries.get(&cell).map(|e| &e.annotation)
    }

    pub fn membership(&self, cell: CellNum) -> Option<Membership> {
        self.entries.get(&cell).map(|e| e.membership)
    }

    pub fn contains(&self, cell: CellNum) -> bool {
        self.entries.contains_key(&cell)
    }

    pub fn is_active(&self, cell: CellNum) -> bool {
        self.membership(cell) == Some(Membership::Active)
    }

    /// Ids in one set, ascending
    pub fn ids(&self, membership: Membership) -> Vec<CellNum> {
        self.entries
            .iter()
            .filter(|(_, e)| e.membership == membership)
            .map(|(&cell, _)| cell)
            .collect()
    }

    /// Marked ids in the order they were marked
    pub fn marked_ids(&self) -> &[CellNum] {
        &self.marked_order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, membership: Membership) -> usize {
        self.entries
            .values()
            .filter(|e| e.membership == membership)
            .count()
    }

    /// Reverse lookup from a picked visual
    pub fn cell_for_handle(&self, handle: VisualHandle) -> Option<CellNum> {
        self.handles.get(&handle).copied()
    }

    /// Attached visuals of the given sets, with their pick bounds
    pub fn pick_candidates(&self, sets: &[Membership]) -> Vec<(VisualHandle, Aabb)> {
        self.entries
            .values()
            .filter(|e| sets.contains(&e.membership) && !self.hidden_set.contains(&e.annotation.cell))
            .filter(|e| self.mask_visible || e.membership == Membership::PendingNew)
            .filter_map(|e| {
                let handle = e.annotation.visual;
                self.scene.bounds(handle).map(|b| (handle, b))
            })
            .collect()
    }

    /// `1 + max(cell id ever seen)`; ids are never handed out twice
    pub fn next_available_id(&self) -> CellNum {
        self.max_seen + 1
    }

    /// Build an annotation (visual spawned, not attached) from a service object
    pub fn create(&mut self, info: &ObjectInfo) -> Annotation {
        let region = BoundingRegion::from_wire(info.min_coords, info.max_coords);
        let visual = self
            .scene
            .spawn_mesh(&info.path, region.world_aabb(self.voxel_size));
        let color_index = self.palette.assign(info.cell_num);
        Annotation {
            cell: info.cell_num,
            visual,
            region,
            color_index,
            asset: info.path.clone(),
        }
    }

    /// Drop every annotation and helper; palette memory survives
    pub fn reset(&mut self) {
        for (_, entry) in std::mem::take(&mut self.entries) {
            self.scene.despawn(entry.annotation.visual);
        }
        self.handles.clear();
        self.marked_order.clear();
        self.hidden.clear();
        self.hidden_set.clear();
        self.clear_seg_helpers();
        self.max_seen = 0;
        self.mask_visible = true;
        self.version += 1;
    }

    pub(crate) fn base_color(&self, annotation: &Annotation) -> palette::Rgb {
        palette::color(annotation.color_index)
    }

    pub(crate) fn pending_opacity(&self) -> f32 {
        self.opacity * self.display.pending_opacity
    }

    /// Structural view for the invariant validator
    pub(crate) fn raw_parts(&self) -> RawParts<'_> {
        RawParts {
            entries: self
                .entries
                .iter()
                .map(|(&cell, e)| (cell, &e.annotation, e.membership))
                .collect(),
            handles: &self.handles,
            marked_order: &self.marked_order,
            hidden: &self.hidden,
            hidden_set: &self.hidden_set,
            max_seen: self.max_seen,
        }
    }
}

/// Borrowed internals, read-only
pub(crate) struct RawParts<'a> {
    pub entries: Vec<(CellNum, &'a Annotation, Membership)>,
    pub handles: &'a HashMap<VisualHandle, CellNum>,
    pub marked_order: &'a [CellNum],
    pub hidden: &'a [CellNum],
    pub hidden_set: &'a HashSet<CellNum>,
    pub max_seen: CellNum,
}
