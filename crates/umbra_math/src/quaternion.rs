//! Quaternion rotations

use crate::vector::Vec3;
use core::ops::Mul;

/// Quaternion representing a 3D rotation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create from axis and angle (radians)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle * 0.5;
        let (sin, cos) = half.sin_cos();
        let axis = axis.normalize();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Create from rotation around the Y (up) axis
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }

    /// Create the rotation taking one direction to another
    pub fn from_rotation_arc(from: Vec3, to: Vec3) -> Self {
        let from = from.normalize();
        let to = to.normalize();
        let dot = from.dot(to);

        if dot > 0.99999 {
            return Self::IDENTITY;
        }
        if dot < -0.99999 {
            // Opposite directions; rotate half a turn around any
            // perpendicular axis.
            let mut axis = Vec3::X.cross(from);
            if axis.is_near_zero() {
                axis = Vec3::Y.cross(from);
            }
            return Self::from_axis_angle(axis.normalize(), core::f32::consts::PI);
        }

        let axis = from.cross(to);
        let s = ((1.0 + dot) * 2.0).sqrt();
        let inv_s = 1.0 / s;
        Self::new(axis.x * inv_s, axis.y * inv_s, axis.z * inv_s, s * 0.5)
    }

    /// Rotation whose forward (-Z) points along `direction`.
    ///
    /// Degenerate directions yield the identity.
    pub fn facing(direction: Vec3) -> Self {
        if direction.is_near_zero() {
            return Self::IDENTITY;
        }
        Self::from_rotation_arc(Vec3::NEG_Z, direction)
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length_squared().sqrt();
        if len > crate::consts::EPSILON {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Inverse rotation (conjugate of a unit quaternion)
    #[inline]
    pub fn inverse(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    /// Rotate a vector
    fn mul(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let uv = u.cross(v);
        let uuv = u.cross(uv);
        v + (uv * self.w + uuv) * 2.0
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
    fn identity_leaves_vectors() {
        assert_vec_eq(Quat::IDENTITY * Vec3::X, Vec3::X);
    }

    #[test]
    fn quarter_turn_around_y() {
        let q = Quat::from_rotation_y(core::f32::consts::FRAC_PI_2);
        assert_vec_eq(q * Vec3::X, Vec3::NEG_Z);
        assert_vec_eq(q * Vec3::NEG_Z, Vec3::NEG_X);
    }

    #[test]
    fn rotation_arc_maps_from_to() {
        let q = Quat::from_rotation_arc(Vec3::NEG_Z, Vec3::X);
        assert_vec_eq(q * Vec3::NEG_Z, Vec3::X);
    }

    #[test]
    fn rotation_arc_opposite() {
        let q = Quat::from_rotation_arc(Vec3::X, Vec3::NEG_X);
        assert_vec_eq(q * Vec3::X, Vec3::NEG_X);
    }

    #[test]
    fn facing_points_forward() {
        let dir = Vec3::new(1.0, 0.0, 1.0).normalize();
        let q = Quat::facing(dir);
        assert_vec_eq(q * Vec3::NEG_Z, dir);
        assert_eq!(Quat::facing(Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn inverse_undoes_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 1.2);
        let v = Vec3::new(3.0, -2.0, 0.5);
        assert_vec_eq(q.inverse() * (q * v), v);
    }
}
