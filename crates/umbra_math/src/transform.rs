//! Transform component for 3D spatial data

use crate::quaternion::Quat;
use crate::vector::Vec3;

/// Position, rotation, and scale
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create from position only
    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create from position and rotation
    #[inline]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Set position (builder pattern)
    #[inline]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set rotation (builder pattern)
    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotate so forward points along `direction` (builder pattern)
    #[inline]
    pub fn facing(mut self, direction: Vec3) -> Self {
        self.rotation = Quat::facing(direction);
        self
    }

    /// Get the forward direction (-Z in local space)
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (+X in local space)
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (+Y in local space)
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Transform a local point into world space
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (point * self.scale)
    }

    /// Transform a local direction into world space (ignores position)
    #[inline]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// Combine two transforms (`other` expressed in `self`'s space)
    pub fn combine(&self, other: &Transform) -> Self {
        Self {
            position: self.transform_point(other.position),
            rotation: self.rotation * other.rotation,
            scale: self.scale * other.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn identity_point_transform() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_eq(Transform::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn facing_sets_forward() {
        let t = Transform::from_position(Vec3::ZERO).facing(Vec3::X);
        assert_vec_eq(t.forward(), Vec3::X);
    }

    #[test]
    fn right_is_perpendicular_to_forward() {
        let t = Transform::IDENTITY.facing(Vec3::new(1.0, 0.0, -1.0).normalize());
        assert_relative_eq!(t.forward().dot(t.right()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn combine_applies_parent_space() {
        let parent = Transform::from_position(Vec3::new(10.0, 0.0, 0.0)).facing(Vec3::X);
        // A child one unit behind the parent along local forward.
        let child = Transform::from_position(Vec3::new(0.0, 0.0, 1.0));
        let world = parent.combine(&child);
        assert_vec_eq(world.position, Vec3::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn transform_point_scales() {
        let t = Transform::new(Vec3::ZERO, Quat::IDENTITY, Vec3::splat(2.0));
        assert_vec_eq(t.transform_point(Vec3::X), Vec3::new(2.0, 0.0, 0.0));
    }
}
