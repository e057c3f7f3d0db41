//! TraceWorld adapter for the rapier-backed query world

use crate::request::TraceShape;
use crate::result::TraceHit;
use crate::world::TraceWorld;
use umbra_math::{Quat, Vec3};
use umbra_physics::{ColliderShape, QueryOptions, QueryWorld, TraceChannel};
use umbra_scene::ActorHandle;

/// Smallest sweep dimension; degenerate shapes are clamped up to this.
const MIN_SWEEP_DIMENSION: f32 = 1e-3;

fn query_options(channel: TraceChannel, ignore: &[ActorHandle]) -> QueryOptions {
    let mut options = QueryOptions::with_groups(channel.query_groups());
    for actor in ignore {
        if !actor.is_null() {
            options.exclude_owners.push(actor.to_bits());
        }
    }
    options
}

impl TraceWorld for QueryWorld {
    fn cast(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        shape: &TraceShape,
        channel: TraceChannel,
        ignore: &[ActorHandle],
    ) -> Option<TraceHit> {
        let options = query_options(channel, ignore);
        match shape {
            TraceShape::Line => self
                .raycast(start, direction, distance, &options)
                .map(|hit| TraceHit {
                    actor: ActorHandle::from_bits(hit.owner_bits),
                    position: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                }),
            _ => {
                let collider_shape = match *shape {
                    TraceShape::Sphere { radius } => {
                        ColliderShape::sphere(radius.max(MIN_SWEEP_DIMENSION))
                    }
                    TraceShape::Box { half_extents } => ColliderShape::cuboid(
                        half_extents[0].max(MIN_SWEEP_DIMENSION),
                        half_extents[1].max(MIN_SWEEP_DIMENSION),
                        half_extents[2].max(MIN_SWEEP_DIMENSION),
                    ),
                    TraceShape::Capsule {
                        radius,
                        half_height,
                    } => ColliderShape::capsule(
                        half_height.max(MIN_SWEEP_DIMENSION),
                        radius.max(MIN_SWEEP_DIMENSION),
                    ),
                    TraceShape::Line => unreachable!(),
                };
                self.shapecast(
                    &collider_shape,
                    start,
                    Quat::IDENTITY,
                    direction,
                    distance,
                    &options,
                )
                .map(|hit| TraceHit {
                    actor: ActorHandle::from_bits(hit.owner_bits),
                    position: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_physics::StaticColliderDesc;

    #[test]
    fn line_cast_reports_owner_actor() {
        let mut world = QueryWorld::new();
        let owner = ActorHandle::from_parts(3, 1);
        world.add_static(
            StaticColliderDesc::new(ColliderShape::sphere(1.0), Vec3::new(0.0, 0.0, -10.0))
                .with_owner(owner.to_bits()),
        );
        world.refit();

        let hit = (&world as &dyn TraceWorld)
            .cast(
                Vec3::ZERO,
                Vec3::NEG_Z,
                50.0,
                &TraceShape::Line,
                TraceChannel::Visibility,
                &[],
            )
            .expect("should hit the sphere");
        assert_eq!(hit.actor, owner);
    }

    #[test]
    fn ignored_actor_is_skipped() {
        let mut world = QueryWorld::new();
        let owner = ActorHandle::from_parts(5, 0);
        world.add_static(
            StaticColliderDesc::new(ColliderShape::sphere(1.0), Vec3::new(0.0, 0.0, -10.0))
                .with_owner(owner.to_bits()),
        );
        world.refit();

        let hit = (&world as &dyn TraceWorld).cast(
            Vec3::ZERO,
            Vec3::NEG_Z,
            50.0,
            &TraceShape::Line,
            TraceChannel::Visibility,
            &[owner],
        );
        assert!(hit.is_none());
    }

    #[test]
    fn degenerate_sweep_is_clamped_not_rejected() {
        let mut world = QueryWorld::new();
        world.add_static(StaticColliderDesc::new(
            ColliderShape::cuboid(50.0, 0.5, 50.0),
            Vec3::new(0.0, -0.5, 0.0),
        ));
        world.refit();

        let hit = (&world as &dyn TraceWorld).cast(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            100.0,
            &TraceShape::Sphere { radius: 0.0 },
            TraceChannel::Visibility,
            &[],
        );
        assert!(hit.is_some());
    }
}
