//! Conversion between scene (world) positions and voxel-grid indices.
//!
//! The scene is laid out in world units where one voxel spans `voxel_size`.
//! Everything exchanged with the segmentation service is in voxel indices.

use glam::{IVec3, Vec3};
use shared::{Marker, VoxelCoords};

use crate::viewport::picking::Aabb;

/// Fraction of a voxel within which a coordinate snaps to the nearer boundary.
/// Absorbs drift accumulated by repeated scaling.
const SNAP_EPSILON: f32 = 1e-3;

/// Voxel containing a world position (floors toward the containing cell).
pub fn world_to_voxel(position: Vec3, voxel_size: f32) -> IVec3 {
    let scaled = position / voxel_size;
    IVec3::new(
        snap_floor(scaled.x),
        snap_floor(scaled.y),
        snap_floor(scaled.z),
    )
}

/// Reference (minimum) corner of a voxel in world units.
pub fn voxel_to_world(index: IVec3, voxel_size: f32) -> Vec3 {
    index.as_vec3() * voxel_size
}

/// Center of a voxel in world units
pub fn voxel_center(index: IVec3, voxel_size: f32) -> Vec3 {
    (index.as_vec3() + Vec3::splat(0.5)) * voxel_size
}

/// True if two world positions fall into the same voxel
pub fn same_voxel(a: Vec3, b: Vec3, voxel_size: f32) -> bool {
    world_to_voxel(a, voxel_size) == world_to_voxel(b, voxel_size)
}

fn snap_floor(v: f32) -> i32 {
    let nearest = v.round();
    if (v - nearest).abs() < SNAP_EPSILON {
        nearest as i32
    } else {
        v.floor() as i32
    }
}

pub fn to_wire(index: IVec3) -> VoxelCoords {
    VoxelCoords::new(index.x, index.y, index.z)
}

pub fn from_wire(coords: VoxelCoords) -> IVec3 {
    IVec3::new(coords.x, coords.y, coords.z)
}

/// Inclusive voxel-space box owned by one annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRegion {
    pub min: IVec3,
    pub max: IVec3,
}

impl BoundingRegion {
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_wire(min: VoxelCoords, max: VoxelCoords) -> Self {
        Self::new(from_wire(min), from_wire(max))
    }

    pub fn contains(&self, index: IVec3) -> bool {
        index.cmpge(self.min).all() && index.cmple(self.max).all()
    }

    /// World-space box covering every voxel of the region
    pub fn world_aabb(&self, voxel_size: f32) -> Aabb {
        Aabb {
            min: voxel_to_world(self.min, voxel_size),
            max: voxel_to_world(self.max + IVec3::ONE, voxel_size),
        }
    }
}

/// A voxel picked as a split seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    pub voxel: IVec3,
    /// Subtract the region grown from this seed
    pub remove: bool,
}

impl SplitPoint {
    pub fn to_marker(self) -> Marker {
        Marker {
            x: self.voxel.x,
            y: self.voxel.y,
            z: self.voxel.z,
            remove: self.remove,
        }
    }
}
