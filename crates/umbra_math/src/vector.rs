//! 2D and 3D vector types

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// 2D vector
///
/// Used for planar weights such as a forward/right offset direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }
}

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);
    pub const NEG_X: Self = Self::new(-1.0, 0.0, 0.0);
    pub const NEG_Y: Self = Self::new(0.0, -1.0, 0.0);
    pub const NEG_Z: Self = Self::new(0.0, 0.0, -1.0);
    /// World up (Y-up convention).
    pub const UP: Self = Self::Y;

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalize, returning [`Vec3::ZERO`] for a near-zero input.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > crate::consts::EPSILON {
            self / len
        } else {
            Self::ZERO
        }
    }

    /// Whether the vector is too short to define a direction.
    #[inline]
    pub fn is_near_zero(self) -> bool {
        self.length_squared() < crate::consts::EPSILON
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// Projection onto the horizontal plane (Y zeroed).
    #[inline]
    pub fn horizontal(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Unsigned angle to another vector, in degrees. Zero-length inputs
    /// yield zero.
    pub fn angle_to_degrees(self, other: Self) -> f32 {
        let a = self.normalize();
        let b = other.normalize();
        if a == Self::ZERO || b == Self::ZERO {
            return 0.0;
        }
        crate::degrees(a.dot(b).clamp(-1.0, 1.0).acos())
    }

    /// Build an orthonormal `(right, up)` pair for this direction, treating
    /// `self` as forward. Falls back to the X axis when the direction is
    /// nearly parallel to world up.
    pub fn orthonormal_basis(self) -> (Vec3, Vec3) {
        let forward = self.normalize();
        let mut right = Self::UP.cross(forward);
        if right.is_near_zero() {
            right = Self::X.cross(forward);
        }
        let right = right.normalize();
        let up = forward.cross(right).normalize();
        (right, up)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Vec3) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl MulAssign<f32> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cross_follows_right_hand_rule() {
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::Y.cross(Vec3::Z), Vec3::X);
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        assert!(Vec3::new(1e-8, 0.0, 0.0).is_near_zero());
    }

    #[test]
    fn angle_between_axes() {
        assert_relative_eq!(Vec3::X.angle_to_degrees(Vec3::Z), 90.0, epsilon = 1e-4);
        assert_relative_eq!(Vec3::X.angle_to_degrees(Vec3::NEG_X), 180.0, epsilon = 1e-4);
        assert_relative_eq!(Vec3::X.angle_to_degrees(Vec3::X), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn basis_is_orthonormal() {
        let forward = Vec3::new(1.0, 2.0, -0.5).normalize();
        let (right, up) = forward.orthonormal_basis();
        assert_relative_eq!(right.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(up.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(right.dot(forward), 0.0, epsilon = 1e-5);
        assert_relative_eq!(up.dot(forward), 0.0, epsilon = 1e-5);
        assert_relative_eq!(right.dot(up), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn basis_handles_vertical_forward() {
        let (right, up) = Vec3::Y.orthonormal_basis();
        assert!(right.length() > 0.9);
        assert!(up.length() > 0.9);
    }

    #[test]
    fn horizontal_drops_height() {
        assert_eq!(Vec3::new(3.0, 9.0, -2.0).horizontal(), Vec3::new(3.0, 0.0, -2.0));
    }
}
