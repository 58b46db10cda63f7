//! Boundary to the rendering collaborator.
//!
//! Meshes are loaded and drawn elsewhere; the editor only needs opaque
//! handles and a handful of visual properties it can flip.

use std::collections::HashMap;

use glam::Vec3;

use super::picking::Aabb;
use crate::palette::Rgb;

/// Opaque handle to a visual owned by the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// Operations the editor performs on the scene graph
pub trait Scene {
    /// Create a (detached) visual from an externally produced surface asset
    fn spawn_mesh(&mut self, asset: &str, bounds: Aabb) -> VisualHandle;
    /// Create a (detached) cube used as a transient marker
    fn spawn_marker(&mut self, center: Vec3, size: f32, color: Rgb) -> VisualHandle;
    fn attach(&mut self, handle: VisualHandle);
    fn detach(&mut self, handle: VisualHandle);
    /// Detach and free a visual
    fn despawn(&mut self, handle: VisualHandle);
    fn set_color(&mut self, handle: VisualHandle, color: Rgb);
    fn set_opacity(&mut self, handle: VisualHandle, opacity: f32);
    fn set_scale(&mut self, handle: VisualHandle, scale: f32);
    /// World-space bounds used for picking
    fn bounds(&self, handle: VisualHandle) -> Option<Aabb>;
}

/// State of one visual in [`HeadlessScene`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Asset path, or `None` for marker cubes
    pub asset: Option<String>,
    pub bounds: Aabb,
    pub attached: bool,
    pub color: Rgb,
    pub opacity: f32,
    pub scale: f32,
}

/// In-memory scene graph with no rendering
#[derive(Debug, Default)]
pub struct HeadlessScene {
    nodes: HashMap<VisualHandle, SceneNode>,
    next_handle: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: SceneNode) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.nodes.insert(handle, node);
        handle
    }

    pub fn node(&self, handle: VisualHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    pub fn is_attached(&self, handle: VisualHandle) -> bool {
        self.nodes.get(&handle).is_some_and(|n| n.attached)
    }

    /// Number of live visuals, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn attached_count(&self) -> usize {
        self.nodes.values().filter(|n| n.attached).count()
    }

    /// Attached marker cubes (no asset)
    pub fn marker_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.attached && n.asset.is_none())
            .count()
    }
}

impl Scene for HeadlessScene {
    fn spawn_mesh(&mut self, asset: &str, bounds: Aabb) -> VisualHandle {
        self.insert(SceneNode {
            asset: Some(asset.to_string()),
            bounds,
            attached: false,
            color: [255, 255, 255],
            opacity: 1.0,
            scale: 1.0,
        })
    }

    fn spawn_marker(&mut self, center: Vec3, size: f32, color: Rgb) -> VisualHandle {
        self.insert(SceneNode {
            asset: None,
            bounds: Aabb::cube(center, size),
            attached: false,
            color,
            opacity: 1.0,
            scale: 1.0,
        })
    }

    fn attach(&mut self, handle: VisualHandle) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.attached = true;
        }
    }

    fn detach(&mut self, handle: VisualHandle) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.attached = false;
        }
    }

    fn despawn(&mut self, handle: VisualHandle) {
        self.nodes.remove(&handle);
    }

    fn set_color(&mut self, handle: VisualHandle, color: Rgb) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.color = color;
        }
    }

    fn set_opacity(&mut self, handle: VisualHandle, opacity: f32) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.opacity = opacity;
        }
    }

    fn set_scale(&mut self, handle: VisualHandle, scale: f32) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.scale = scale;
        }
    }

    fn bounds(&self, handle: VisualHandle) -> Option<Aabb> {
        self.nodes.get(&handle).map(|n| n.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_visuals_start_detached() {
        let mut scene = HeadlessScene::new();
        let h = scene.spawn_mesh("./objects/1.obj", Aabb::cube(Vec3::ZERO, 1.0));
        assert!(!scene.is_attached(h));
        scene.attach(h);
        assert!(scene.is_attached(h));
        assert_eq!(scene.attached_count(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut scene = HeadlessScene::new();
        let a = scene.spawn_mesh("a", Aabb::cube(Vec3::ZERO, 1.0));
        let b = scene.spawn_marker(Vec3::ONE, 0.1, [0, 0, 0]);
        assert_ne!(a, b);
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn test_despawn_frees_node() {
        let mut scene = HeadlessScene::new();
        let h = scene.spawn_marker(Vec3::ZERO, 0.1, [255, 255, 255]);
        scene.attach(h);
        assert_eq!(scene.marker_count(), 1);
        scene.despawn(h);
        assert!(scene.node(h).is_none());
        assert_eq!(scene.marker_count(), 0);
    }

    #[test]
    fn test_property_setters() {
        let mut scene = HeadlessScene::new();
        let h = scene.spawn_mesh("a", Aabb::cube(Vec3::ZERO, 1.0));
        scene.set_color(h, [1, 2, 3]);
        scene.set_opacity(h, 0.5);
        scene.set_scale(h, 0.1);
        let node = scene.node(h).unwrap();
        assert_eq!(node.color, [1, 2, 3]);
        assert_eq!(node.opacity, 0.5);
        assert_eq!(node.scale, 0.1);
    }
}
