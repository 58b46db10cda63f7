use serde::{Deserialize, Serialize};

/// Label of a cell in the segmentation mask (0 is background)
pub type CellNum = u32;

/// Integer voxel coordinates as exchanged with the segmentation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct VoxelCoords {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoords {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Seed point for a split, in voxel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Region grown from this seed is subtracted from the mask
    #[serde(default)]
    pub remove: bool,
}

/// Surface asset produced by the service for one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Path to the externally produced surface asset
    pub path: String,
    pub cell_num: CellNum,
    pub min_coords: VoxelCoords,
    pub max_coords: VoxelCoords,
}

/// One entry of a split result.
///
/// Entries flagged `remove` carry only the cell number; the region was
/// subtracted and has no surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitObject {
    pub cell_num: CellNum,
    #[serde(default)]
    pub remove: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_coords: Option<VoxelCoords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_coords: Option<VoxelCoords>,
}

impl SplitObject {
    /// Surface envelope of a kept entry, or `None` for removed or incomplete ones
    pub fn info(&self) -> Option<ObjectInfo> {
        if self.remove {
            return None;
        }
        Some(ObjectInfo {
            path: self.path.clone()?,
            cell_num: self.cell_num,
            min_coords: self.min_coords?,
            max_coords: self.max_coords?,
        })
    }
}

/// Summary of an annotation sent with a batched removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSummary {
    #[serde(rename = "cellNum")]
    pub cell_num: CellNum,
    pub path: String,
    pub min_coords: VoxelCoords,
    pub max_coords: VoxelCoords,
}

// ============================================================================
// Requests
// ============================================================================

/// Request to the segmentation service, one variant per editing action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Open a mask/image pair and mesh every cell
    Load { mask_link: String, image_link: String },
    /// Write the confirmed mask out
    Save { link: String },
    /// Delete cells from the confirmed mask
    Remove {
        #[serde(rename = "remObjects")]
        rem_objects: Vec<AnnotationSummary>,
    },
    /// Drop the unconfirmed split
    Undo {
        #[serde(rename = "cellNums")]
        cell_nums: Vec<CellNum>,
    },
    /// Watershed-split one cell from seed markers
    Split {
        markers: Vec<Marker>,
        curr_cell: CellNum,
        next_cell: CellNum,
    },
    /// Confirm the last split
    CompleteSegment,
    /// Merge cells into the first listed id
    Merge { cell_nums: Vec<CellNum> },
}

impl Action {
    /// Wire name of the action
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Load { .. } => "load",
            Action::Save { .. } => "save",
            Action::Remove { .. } => "remove",
            Action::Undo { .. } => "undo",
            Action::Split { .. } => "split",
            Action::CompleteSegment => "complete_segment",
            Action::Merge { .. } => "merge",
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Plain acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `load`. Extra payload (raw mask, image) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "objPaths", default)]
    pub obj_paths: Vec<ObjectInfo>,
}

/// Reply to `split`; `objects` is null when no split was possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SplitResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub objects: Option<Vec<SplitObject>>,
}

impl SplitResponse {
    /// Kept entries with a usable surface envelope
    pub fn kept(&self) -> Vec<ObjectInfo> {
        self.objects
            .iter()
            .flatten()
            .filter_map(SplitObject::info)
            .collect()
    }
}

/// Reply to `merge`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub object: ObjectInfo,
    /// Echo of the merged ids
    pub cell_nums: Vec<CellNum>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(val: &T) {
        let json = serde_json::to_string(val).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(*val, back);
    }

    fn info(cell: CellNum) -> ObjectInfo {
        ObjectInfo {
            path: format!("./objects/{cell}.obj"),
            cell_num: cell,
            min_coords: VoxelCoords::new(0, 0, 0),
            max_coords: VoxelCoords::new(3, 3, 3),
        }
    }

    // --- Requests ---

    #[test]
    fn test_split_action_wire_shape() {
        let a = Action::Split {
            markers: vec![Marker { x: 1, y: 2, z: 3, remove: true }],
            curr_cell: 5,
            next_cell: 6,
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["action"], "split");
        assert_eq!(v["curr_cell"], 5);
        assert_eq!(v["next_cell"], 6);
        assert_eq!(v["markers"][0]["remove"], true);
        roundtrip(&a);
    }

    #[test]
    fn test_remove_action_uses_camel_case_fields() {
        let a = Action::Remove {
            rem_objects: vec![AnnotationSummary {
                cell_num: 4,
                path: "./objects/4.obj".into(),
                min_coords: VoxelCoords::default(),
                max_coords: VoxelCoords::new(1, 1, 1),
            }],
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["action"], "remove");
        assert_eq!(v["remObjects"][0]["cellNum"], 4);
    }

    #[test]
    fn test_undo_action_uses_cell_nums_key() {
        let v = serde_json::to_value(Action::Undo { cell_nums: vec![5, 6] }).unwrap();
        assert_eq!(v["cellNums"], serde_json::json!([5, 6]));
    }

    #[test]
    fn test_complete_segment_has_no_fields() {
        let json = serde_json::to_string(&Action::CompleteSegment).unwrap();
        assert_eq!(json, r#"{"action":"complete_segment"}"#);
        assert_eq!(Action::CompleteSegment.kind(), "complete_segment");
    }

    #[test]
    fn test_load_and_merge_roundtrip() {
        roundtrip(&Action::Load {
            mask_link: "mask.json".into(),
            image_link: "image.json".into(),
        });
        roundtrip(&Action::Merge { cell_nums: vec![3, 4] });
        roundtrip(&Action::Save { link: "out.json".into() });
    }

    // --- Responses ---

    #[test]
    fn test_load_response_ignores_extra_payload() {
        let json = r#"{
            "message": "Data received successfully.",
            "totalMask": [[[0, 1]]],
            "image": [[[10, 20]]],
            "objPaths": [
                {"path": "./objects/1.obj", "cell_num": 1,
                 "min_coords": {"x": 0, "y": 0, "z": 0},
                 "max_coords": {"x": 2, "y": 3, "z": 4}}
            ]
        }"#;
        let resp: LoadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.obj_paths.len(), 1);
        assert_eq!(resp.obj_paths[0].max_coords, VoxelCoords::new(2, 3, 4));
    }

    #[test]
    fn test_split_response_null_objects() {
        let resp: SplitResponse =
            serde_json::from_str(r#"{"message": "Error", "objects": null}"#).unwrap();
        assert!(resp.objects.is_none());
        assert!(resp.kept().is_empty());
    }

    #[test]
    fn test_split_response_skips_removed_entries() {
        let json = r#"{"objects": [
            {"path": "./objects/5.obj", "cell_num": 5, "remove": false,
             "min_coords": {"x": 0, "y": 0, "z": 0}, "max_coords": {"x": 1, "y": 1, "z": 1}},
            {"cell_num": 6, "remove": true}
        ]}"#;
        let resp: SplitResponse = serde_json::from_str(json).unwrap();
        let kept = resp.kept();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].cell_num, 5);
    }

    #[test]
    fn test_split_object_without_path_is_not_kept() {
        let obj = SplitObject {
            cell_num: 7,
            remove: false,
            path: None,
            min_coords: Some(VoxelCoords::default()),
            max_coords: Some(VoxelCoords::default()),
        };
        assert!(obj.info().is_none());
    }

    #[test]
    fn test_merge_response_serde() {
        let resp = MergeResponse {
            object: info(3),
            cell_nums: vec![3, 4],
        };
        roundtrip(&resp);
    }
}
