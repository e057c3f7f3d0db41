//! The query world: static colliders + raycast/sweep queries

use std::collections::HashMap;

use crate::collider::{ColliderHandle, ColliderShape, StaticColliderDesc};
use crate::error::{PhysicsError, Result};
use crate::layers::CollisionGroups;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;
use umbra_math::{Quat, Vec3};

/// Result of a raycast query
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Owner bits of the hit collider (0 for unowned geometry)
    pub owner_bits: u64,
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Result of a shape sweep query
#[derive(Debug, Clone, Copy)]
pub struct SweepHit {
    /// Owner bits of the hit collider
    pub owner_bits: u64,
    /// Swept shape center at the time of impact
    pub point: Vec3,
    /// Surface normal on the hit collider
    pub normal: Vec3,
    /// Distance traveled before impact
    pub distance: f32,
}

/// Options shared by raycast and sweep queries
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Collision groups filter
    pub groups: CollisionGroups,
    /// Owner bits to exclude (the tracing actor and explicit ignores)
    pub exclude_owners: Vec<u64>,
}

impl QueryOptions {
    /// Query with a groups filter
    pub fn with_groups(groups: CollisionGroups) -> Self {
        Self {
            groups,
            exclude_owners: Vec::new(),
        }
    }

    /// Exclude an owner
    pub fn exclude(mut self, owner_bits: u64) -> Self {
        self.exclude_owners.push(owner_bits);
        self
    }
}

/// Static collision world answering ray and sweep queries.
///
/// Call [`QueryWorld::refit`] after registering or removing colliders;
/// queries run against the last refit state.
pub struct QueryWorld {
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    query_pipeline: rapier::QueryPipeline,
    owner_to_colliders: HashMap<u64, Vec<ColliderHandle>>,
}

impl QueryWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            owner_to_colliders: HashMap::new(),
        }
    }

    /// Register a static collider
    pub fn add_static(&mut self, desc: StaticColliderDesc) -> ColliderHandle {
        let handle = ColliderHandle(self.colliders.insert(desc.to_rapier_builder()));
        if desc.owner_bits != 0 {
            self.owner_to_colliders
                .entry(desc.owner_bits)
                .or_default()
                .push(handle);
        }
        handle
    }

    /// Remove a collider
    pub fn remove(&mut self, handle: ColliderHandle) -> Result<()> {
        if self.colliders.get(handle.0).is_none() {
            return Err(PhysicsError::ColliderNotFound(handle));
        }
        let mut islands = rapier::IslandManager::new();
        self.colliders.remove(handle.0, &mut islands, &mut self.bodies, true);
        for colliders in self.owner_to_colliders.values_mut() {
            colliders.retain(|h| *h != handle);
        }
        Ok(())
    }

    /// Remove every collider registered for an owner
    pub fn remove_owner(&mut self, owner_bits: u64) {
        if let Some(handles) = self.owner_to_colliders.remove(&owner_bits) {
            log::debug!(
                "removing {} colliders for owner {owner_bits}",
                handles.len()
            );
            let mut islands = rapier::IslandManager::new();
            for handle in handles {
                self.colliders.remove(handle.0, &mut islands, &mut self.bodies, true);
            }
        }
    }

    /// Rebuild query acceleration structures after collider edits
    pub fn refit(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// Number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn filter<'a, F: Fn(rapier::ColliderHandle, &rapier::Collider) -> bool>(
        &self,
        options: &'a QueryOptions,
        predicate: &'a F,
    ) -> rapier::QueryFilter<'a> {
        rapier::QueryFilter::new()
            .groups(rapier::InteractionGroups::new(
                rapier::Group::from_bits_truncate(options.groups.memberships),
                rapier::Group::from_bits_truncate(options.groups.filter),
            ))
            .predicate(predicate)
    }

    /// Cast a ray and return the first hit with its surface normal
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        options: &QueryOptions,
    ) -> Option<RayHit> {
        let direction = direction.normalize();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }
        let ray = rapier::Ray::new(
            rapier::Point::new(origin.x, origin.y, origin.z),
            rapier::Vector::new(direction.x, direction.y, direction.z),
        );

        let excluded = &options.exclude_owners;
        let predicate = move |_h: rapier::ColliderHandle, c: &rapier::Collider| {
            !excluded.contains(&(c.user_data as u64))
        };
        let filter = self.filter(options, &predicate);

        self.query_pipeline
            .cast_ray_and_get_normal(&self.bodies, &self.colliders, &ray, max_distance, true, filter)
            .map(|(handle, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                let owner = self
                    .colliders
                    .get(handle)
                    .map(|c| c.user_data as u64)
                    .unwrap_or(0);
                RayHit {
                    owner_bits: owner,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                    distance: intersection.time_of_impact,
                }
            })
    }

    /// Sweep a shape and return the first hit
    pub fn shapecast(
        &self,
        shape: &ColliderShape,
        origin: Vec3,
        rotation: Quat,
        direction: Vec3,
        max_distance: f32,
        options: &QueryOptions,
    ) -> Option<SweepHit> {
        let direction = direction.normalize();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }
        let rapier_shape = shape.to_rapier();
        let pos = rapier::Isometry::from_parts(
            rapier::Translation::new(origin.x, origin.y, origin.z),
            UnitQuaternion::from_quaternion(Quaternion::new(
                rotation.w, rotation.x, rotation.y, rotation.z,
            )),
        );
        let vel = rapier::Vector::new(direction.x, direction.y, direction.z);

        let excluded = &options.exclude_owners;
        let predicate = move |_h: rapier::ColliderHandle, c: &rapier::Collider| {
            !excluded.contains(&(c.user_data as u64))
        };
        let filter = self.filter(options, &predicate);

        let cast_options = rapier3d::parry::query::ShapeCastOptions {
            max_time_of_impact: max_distance,
            stop_at_penetration: true,
            ..Default::default()
        };

        self.query_pipeline
            .cast_shape(
                &self.bodies,
                &self.colliders,
                &pos,
                &vel,
                rapier_shape.as_ref(),
                cast_options,
                filter,
            )
            .map(|(handle, hit)| {
                let center = pos.translation.vector + vel * hit.time_of_impact;
                let owner = self
                    .colliders
                    .get(handle)
                    .map(|c| c.user_data as u64)
                    .unwrap_or(0);
                SweepHit {
                    owner_bits: owner,
                    point: Vec3::new(center.x, center.y, center.z),
                    normal: Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z),
                    distance: hit.time_of_impact,
                }
            })
    }
}

impl Default for QueryWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world_with_ground() -> QueryWorld {
        let mut world = QueryWorld::new();
        // A thin ground slab centered at y = -0.5, top face at y = 0.
        world.add_static(StaticColliderDesc::new(
            ColliderShape::cuboid(50.0, 0.5, 50.0),
            Vec3::new(0.0, -0.5, 0.0),
        ));
        world.refit();
        world
    }

    #[test]
    fn raycast_down_hits_ground() {
        let world = world_with_ground();
        let hit = world
            .raycast(
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::NEG_Y,
                100.0,
                &QueryOptions::default(),
            )
            .expect("ray should hit the ground");

        assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-3);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-3);
        assert!(hit.normal.y > 0.9);
        assert_eq!(hit.owner_bits, 0);
    }

    #[test]
    fn raycast_respects_max_distance() {
        let world = world_with_ground();
        let hit = world.raycast(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            5.0,
            &QueryOptions::default(),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn exclusion_by_owner() {
        let mut world = QueryWorld::new();
        world.add_static(
            StaticColliderDesc::new(ColliderShape::sphere(1.0), Vec3::new(0.0, 0.0, -5.0))
                .with_owner(42),
        );
        world.refit();

        let options = QueryOptions::default();
        assert!(world
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 50.0, &options)
            .is_some());

        let options = QueryOptions::default().exclude(42);
        assert!(world
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 50.0, &options)
            .is_none());
    }

    #[test]
    fn sphere_sweep_stops_short_of_surface() {
        let world = world_with_ground();
        let hit = world
            .shapecast(
                &ColliderShape::sphere(0.5),
                Vec3::new(0.0, 10.0, 0.0),
                Quat::IDENTITY,
                Vec3::NEG_Y,
                100.0,
                &QueryOptions::default(),
            )
            .expect("sweep should hit the ground");

        // Sphere center stops one radius above the surface.
        assert_relative_eq!(hit.distance, 9.5, epsilon = 1e-2);
        assert!(hit.normal.y > 0.9);
    }

    #[test]
    fn remove_owner_clears_geometry() {
        let mut world = QueryWorld::new();
        world.add_static(
            StaticColliderDesc::new(ColliderShape::sphere(1.0), Vec3::new(0.0, 0.0, -5.0))
                .with_owner(7),
        );
        world.refit();
        assert_eq!(world.collider_count(), 1);

        world.remove_owner(7);
        world.refit();
        assert_eq!(world.collider_count(), 0);
        assert!(world
            .raycast(Vec3::ZERO, Vec3::NEG_Z, 50.0, &QueryOptions::default())
            .is_none());
    }
}
