//! Factory functions for creating test data.
//!
//! Provides helpers to construct service objects, stores and the JSON bodies
//! the segmentation service answers with. Cells built here sit on a row along
//! x, ten voxels apart, so a ray aimed at one never crosses another.

use glam::IVec3;
use serde_json::{json, Value};
use shared::{CellNum, ObjectInfo, VoxelCoords};

use crate::coords::{to_wire, BoundingRegion};
use crate::state::settings::EditorSettings;
use crate::state::store::{AnnotationStore, Membership};
use crate::viewport::scene::HeadlessScene;

/// Spacing between fixture cells along x, in voxels
pub const CELL_SPACING: i32 = 10;

/// Edge length of a fixture cell, in voxels
pub const CELL_EXTENT: i32 = 4;

// ── Objects ─────────────────────────────────────────────────────

/// Voxel region of a fixture cell
pub fn cell_region(cell: CellNum) -> BoundingRegion {
    let min = IVec3::new(cell as i32 * CELL_SPACING, 0, 0);
    BoundingRegion::new(min, min + IVec3::splat(CELL_EXTENT - 1))
}

/// Asset path the service would report for a cell
pub fn asset_path(cell: CellNum) -> String {
    format!("./objects/{cell}.obj")
}

/// Service object for a fixture cell
pub fn object_info(cell: CellNum) -> ObjectInfo {
    let region = cell_region(cell);
    object_info_at(cell, to_wire(region.min), to_wire(region.max))
}

/// Service object with explicit bounds
pub fn object_info_at(cell: CellNum, min: VoxelCoords, max: VoxelCoords) -> ObjectInfo {
    ObjectInfo {
        path: asset_path(cell),
        cell_num: cell,
        min_coords: min,
        max_coords: max,
    }
}

// ── Stores ──────────────────────────────────────────────────────

/// Store holding the given cells, all active
pub fn store_with_cells(cells: &[CellNum]) -> AnnotationStore<HeadlessScene> {
    let settings = EditorSettings::ephemeral();
    let mut store = AnnotationStore::new(HeadlessScene::new(), &settings);
    for &cell in cells {
        // Repeated ids are skipped
        let _ = store.insert_object(&object_info(cell), Membership::Active);
    }
    store
}

// ── Service replies ─────────────────────────────────────────────

fn object_json(info: &ObjectInfo) -> Value {
    json!({
        "path": info.path,
        "cell_num": info.cell_num,
        "min_coords": info.min_coords,
        "max_coords": info.max_coords,
    })
}

/// `load` reply listing the given cells
pub fn load_response_json(cells: &[CellNum]) -> Value {
    let objects: Vec<Value> = cells.iter().map(|&c| object_json(&object_info(c))).collect();
    json!({
        "message": "Mask loaded",
        "objPaths": objects,
        "totalMask": "./objects/mask.obj",
        "image": "./objects/image.tif",
    })
}

/// `split` reply; objects flagged `remove` carry only their id and flag
pub fn split_response_json(objects: &[(CellNum, bool)]) -> Value {
    let objects: Vec<Value> = objects
        .iter()
        .map(|&(cell, remove)| {
            if remove {
                json!({ "cell_num": cell, "remove": true })
            } else {
                let mut value = object_json(&object_info(cell));
                value["remove"] = json!(false);
                value
            }
        })
        .collect();
    json!({ "message": "Split complete", "objects": objects })
}

/// `merge` reply: `target` grown to span every source
pub fn merge_response_json(target: CellNum, sources: &[CellNum]) -> Value {
    let mut region = cell_region(target);
    for &cell in sources {
        let other = cell_region(cell);
        region = BoundingRegion::new(region.min.min(other.min), region.max.max(other.max));
    }
    let merged = object_info_at(target, to_wire(region.min), to_wire(region.max));
    json!({ "object": object_json(&merged), "cell_nums": sources })
}
