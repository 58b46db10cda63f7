use glam::Vec3;

use super::scene::VisualHandle;

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `origin` passing through `target`
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self {
            origin,
            direction: (target - origin).normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box of edge `size` centered on `center`
    pub fn cube(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
///
/// Axes the ray runs parallel to are tested by containment instead of
/// division, so a ray starting exactly on a face never produces NaN.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    if ray.direction == Vec3::ZERO || !ray.direction.is_finite() {
        return None;
    }

    let origin = ray.origin.to_array();
    let direction = ray.direction.to_array();
    let (min, max) = (aabb.min.to_array(), aabb.max.to_array());

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        if direction[axis] == 0.0 {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction[axis];
        let t1 = (min[axis] - origin[axis]) * inv;
        let t2 = (max[axis] - origin[axis]) * inv;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Pick the nearest visual whose AABB is intersected by the ray.
///
/// Knows nothing about annotations; callers map the handle back themselves.
pub fn pick_nearest<I>(ray: &Ray, candidates: I) -> Option<VisualHandle>
where
    I: IntoIterator<Item = (VisualHandle, Aabb)>,
{
    let mut best: Option<(VisualHandle, f32)> = None;

    for (handle, aabb) in candidates {
        if let Some(dist) = ray_aabb(ray, &aabb) {
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((handle, dist));
            }
        }
    }

    best.map(|(handle, _)| handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::cube(center, 1.0)
    }

    #[test]
    fn test_ray_hits_box_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let dist = ray_aabb(&ray, &unit_box_at(Vec3::ZERO)).unwrap();
        assert!((dist - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray_aabb(&ray, &unit_box_at(Vec3::ZERO)).is_none());
    }

    #[test]
    fn test_ray_from_inside_reports_exit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let dist = ray_aabb(&ray, &unit_box_at(Vec3::ZERO)).unwrap();
        assert!((dist - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_zero_direction_never_hits() {
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert!(ray_aabb(&ray, &unit_box_at(Vec3::ZERO)).is_none());
    }

    #[test]
    fn test_axis_parallel_ray_on_face_plane() {
        let aabb = unit_box_at(Vec3::ZERO);
        let grazing = Ray::new(Vec3::new(-0.5, 0.0, -5.0), Vec3::Z);
        let dist = ray_aabb(&grazing, &aabb).unwrap();
        assert!(dist.is_finite());
        assert!((dist - 4.5).abs() < 1e-5);

        let outside = Ray::new(Vec3::new(-0.6, 0.0, -5.0), Vec3::Z);
        assert!(ray_aabb(&outside, &aabb).is_none());
    }

    #[test]
    fn test_non_finite_direction_never_hits() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 1.0));
        assert!(ray_aabb(&ray, &unit_box_at(Vec3::ZERO)).is_none());
    }

    #[test]
    fn test_pick_nearest_prefers_closer() {
        let near = VisualHandle(1);
        let far = VisualHandle(2);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z);
        let picked = pick_nearest(
            &ray,
            [
                (far, unit_box_at(Vec3::new(0.0, 0.0, 5.0))),
                (near, unit_box_at(Vec3::new(0.0, 0.0, 1.0))),
            ],
        );
        assert_eq!(picked, Some(near));
    }

    #[test]
    fn test_pick_nearest_none_when_missed() {
        let ray = Ray::new(Vec3::new(10.0, 10.0, -10.0), Vec3::Z);
        let picked = pick_nearest(&ray, [(VisualHandle(1), unit_box_at(Vec3::ZERO))]);
        assert!(picked.is_none());
    }

    #[test]
    fn test_ray_towards_normalizes() {
        let ray = Ray::towards(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert!((ray.direction - Vec3::Z).length() < 1e-6);
        assert!((ray.at(2.0) - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-6);
    }
}
