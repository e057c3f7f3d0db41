//! 3D ray used by trace queries

use crate::vector::Vec3;

/// Ray with a normalized direction
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized on construction)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Create a ray from two points
    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Whether the direction is usable (non-zero length)
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.direction.is_near_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn at_walks_the_ray() {
        let ray = Ray::from_points(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert!((ray.at(5.0).z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn zero_direction_is_invalid() {
        assert!(!Ray::new(Vec3::ZERO, Vec3::ZERO).is_valid());
    }
}
