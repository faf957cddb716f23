use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::Transform;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given full `size` centred on `center`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// World-space box enclosing a local box of `half_extents` placed by
    /// `transform` (scale and rotation applied).
    pub fn from_transform(transform: &Transform, half_extents: Vec3) -> Self {
        let scaled = half_extents.abs() * transform.scale.abs();
        let m = Mat3::from_quat(transform.rotation);
        let extent = Vec3::new(
            m.row(0).abs().dot(scaled),
            m.row(1).abs().dot(scaled),
            m.row(2).abs().dot(scaled),
        );
        Self::new(transform.position - extent, transform.position + extent)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Overlap test; touching faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Aabb::from_center_size(Vec3::ZERO, Vec3::splat(2.0));
        let b = Aabb::from_center_size(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(2.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn separated_boxes_do_not_intersect() {
        let a = Aabb::from_center_size(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_size(Vec3::new(0.0, 0.0, 3.0), Vec3::ONE);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn new_orders_corners() {
        let a = Aabb::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(a.min, Vec3::ZERO);
        assert_eq!(a.max, Vec3::ONE);
        assert!(a.contains_point(Vec3::splat(0.5)));
    }

    #[test]
    fn from_transform_applies_rotation_and_scale() {
        let t = Transform {
            position: Vec3::new(3.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let b = Aabb::from_transform(&t, Vec3::new(1.0, 0.5, 0.25));
        // x and z extents swap under a quarter turn about Y.
        assert!((b.max.x - 3.5).abs() < 1e-5);
        assert!((b.max.z - 2.0).abs() < 1e-5);
        assert!((b.max.y - 1.0).abs() < 1e-5);
        assert!((b.center() - t.position).length() < 1e-5);
    }
}
