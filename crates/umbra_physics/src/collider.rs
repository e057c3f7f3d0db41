//! Collider shapes and descriptors

use crate::layers::CollisionGroups;
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};
use umbra_math::{Quat, Vec3};

/// Handle to a collider in the query world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

/// Collision shape for static geometry and sweeps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere with radius
    Sphere { radius: f32 },
    /// Box with half-extents
    Cuboid { half_extents: [f32; 3] },
    /// Capsule aligned along Y
    Capsule { half_height: f32, radius: f32 },
    /// Triangle mesh (static geometry)
    TriMesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
}

impl ColliderShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Cuboid {
            half_extents: [hx, hy, hz],
        }
    }

    /// Create a capsule shape (Y-aligned)
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::Capsule {
            half_height,
            radius,
        }
    }

    /// Build the Rapier shape
    pub(crate) fn to_rapier(&self) -> rapier::SharedShape {
        match self {
            Self::Sphere { radius } => rapier::SharedShape::ball(*radius),
            Self::Cuboid { half_extents } => {
                rapier::SharedShape::cuboid(half_extents[0], half_extents[1], half_extents[2])
            }
            Self::Capsule {
                half_height,
                radius,
            } => rapier::SharedShape::capsule_y(*half_height, *radius),
            Self::TriMesh { vertices, indices } => {
                let points: Vec<_> = vertices
                    .iter()
                    .map(|v| rapier::Point::new(v[0], v[1], v[2]))
                    .collect();
                rapier::SharedShape::trimesh(points, indices.clone())
            }
        }
    }
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Cuboid {
            half_extents: [0.5, 0.5, 0.5],
        }
    }
}

/// Description for registering a static collider
#[derive(Debug, Clone)]
pub struct StaticColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Collision groups the collider is registered under
    pub groups: CollisionGroups,
    /// Owning actor, packed to bits (0 = unowned world geometry)
    pub owner_bits: u64,
}

impl StaticColliderDesc {
    /// Create a descriptor at a position with default groups
    pub fn new(shape: ColliderShape, position: Vec3) -> Self {
        Self {
            shape,
            position,
            rotation: Quat::IDENTITY,
            groups: CollisionGroups::world_static(),
            owner_bits: 0,
        }
    }

    /// Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set collision groups
    pub fn with_groups(mut self, groups: CollisionGroups) -> Self {
        self.groups = groups;
        self
    }

    /// Set the owning actor bits
    pub fn with_owner(mut self, owner_bits: u64) -> Self {
        self.owner_bits = owner_bits;
        self
    }

    pub(crate) fn to_rapier_builder(&self) -> rapier::ColliderBuilder {
        rapier::ColliderBuilder::new(self.shape.to_rapier())
            .position(rapier::Isometry::from_parts(
                rapier::Translation::new(self.position.x, self.position.y, self.position.z),
                rapier3d::na::UnitQuaternion::from_quaternion(rapier3d::na::Quaternion::new(
                    self.rotation.w,
                    self.rotation.x,
                    self.rotation.y,
                    self.rotation.z,
                )),
            ))
            .collision_groups(rapier::InteractionGroups::new(
                rapier::Group::from_bits_truncate(self.groups.memberships),
                rapier::Group::from_bits_truncate(self.groups.filter),
            ))
            .user_data(self.owner_bits as u128)
    }
}
