//! # umbra_physics - Static Collision Queries
//!
//! A query-only collision world over Rapier 3D. Gameplay systems in this
//! workspace never simulate dynamics; they only ask questions of world
//! geometry: raycasts with surface normals, and sphere/box/capsule sweeps.
//!
//! Colliders are registered with an `owner` (an actor handle packed to
//! bits) so queries can exclude the actors a trace originates from.

pub mod collider;
pub mod error;
pub mod layers;
pub mod world;

pub use collider::{ColliderHandle, ColliderShape, StaticColliderDesc};
pub use error::{PhysicsError, Result};
pub use layers::{CollisionGroups, TraceChannel};
pub use world::{QueryOptions, QueryWorld, RayHit, SweepHit};
