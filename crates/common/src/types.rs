use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform at `position` with `rotation` and unit scale.
    pub fn from_pose(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Facing direction in world space (local -Z).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Up direction in world space (local +Y).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate along the facing direction. Scale does not affect the distance.
    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    /// Rotate about an axis expressed in local space. Accumulates onto the
    /// current rotation.
    pub fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
    }

    /// Overwrite position and rotation, keeping scale.
    pub fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn entity_id_uniqueness() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(approx(t.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn move_forward_follows_facing() {
        let mut t = Transform::from_pose(Vec3::new(2.0, 0.0, 2.0), Quat::IDENTITY);
        t.move_forward(4.0);
        assert!(approx(t.position, Vec3::new(2.0, 0.0, -2.0)));
    }

    #[test]
    fn positive_turn_swings_towards_negative_x() {
        let mut t = Transform::default();
        t.rotate_local(Vec3::Y, FRAC_PI_2);
        assert!(approx(t.forward(), Vec3::NEG_X));
        t.move_forward(1.0);
        assert!(approx(t.position, Vec3::NEG_X));
    }

    #[test]
    fn rotate_local_uses_local_axes() {
        let mut t = Transform::default();
        // Pitch up first, then yaw about the (now tilted) local up axis.
        t.rotate_local(Vec3::X, FRAC_PI_2);
        let up_before = t.up();
        t.rotate_local(Vec3::Y, FRAC_PI_2);
        assert!(approx(t.up(), up_before));
    }

    #[test]
    fn rotate_about_zero_axis_is_ignored() {
        let mut t = Transform::default();
        t.rotate_local(Vec3::ZERO, 1.0);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn set_pose_keeps_scale() {
        let mut t = Transform {
            scale: Vec3::splat(0.25),
            ..Transform::default()
        };
        t.set_pose(Vec3::X, Quat::from_rotation_y(1.0));
        assert_eq!(t.position, Vec3::X);
        assert_eq!(t.scale, Vec3::splat(0.25));
    }
}
