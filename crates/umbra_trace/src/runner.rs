//! The pattern orchestrator
//!
//! Stateless entry points that resolve a request against the scene,
//! generate its rays or path points, execute the traces, and aggregate
//! the results. Safe to call re-entrantly; no state survives a call.

use crate::debug::DebugRecorder;
use crate::path::{generate_world_points, PathConfig};
use crate::pattern::generate_rays;
use crate::request::TraceRequest;
use crate::result::{RayRecord, TraceBatchResult};
use crate::world::TraceWorld;
use umbra_math::{Quat, Transform, Vec3};
use umbra_scene::{ActorHandle, SceneRegistry};

/// Resolved pattern anchor
struct ResolvedOrigin {
    position: Vec3,
    forward: Vec3,
    /// Actor the pattern originates from; always ignored by its rays
    owner: Option<ActorHandle>,
}

/// Resolve the origin with attachment > actor > explicit priority.
///
/// A degenerate forward falls back to the world forward axis.
fn resolve_origin(scene: &SceneRegistry, request: &TraceRequest) -> ResolvedOrigin {
    let origin = &request.origin;

    let (position, forward, owner) = if let Some(attachment) = &origin.attachment {
        match scene.get(attachment.actor) {
            Some(actor) => {
                let world = actor.transform.combine(&attachment.local);
                (world.position, world.forward(), Some(attachment.actor))
            }
            None => (origin.location, origin.rotation * Vec3::NEG_Z, None),
        }
    } else if let Some(actor_handle) = origin.actor {
        match scene.get(actor_handle) {
            Some(actor) => (
                actor.transform.position,
                actor.transform.forward(),
                Some(actor_handle),
            ),
            None => (origin.location, origin.rotation * Vec3::NEG_Z, None),
        }
    } else {
        (origin.location, origin.rotation * Vec3::NEG_Z, None)
    };

    let forward = if forward.is_near_zero() {
        Vec3::NEG_Z
    } else {
        forward.normalize()
    };

    ResolvedOrigin {
        position,
        forward,
        owner,
    }
}

/// Resolve the target location with actor > explicit priority.
fn resolve_target(scene: &SceneRegistry, request: &TraceRequest) -> Option<Vec3> {
    if let Some(actor) = request.target.actor {
        if let Some(location) = scene.location(actor) {
            return Some(location);
        }
    }
    request.target.location
}

fn ignore_list(owner: Option<ActorHandle>, request: &TraceRequest) -> Vec<ActorHandle> {
    let mut ignore = Vec::with_capacity(request.ignore.len() + 1);
    if let Some(owner) = owner {
        ignore.push(owner);
    }
    ignore.extend_from_slice(&request.ignore);
    ignore
}

/// Run a pattern request and aggregate its hits.
pub fn run_pattern(
    world: &dyn TraceWorld,
    scene: &SceneRegistry,
    request: &TraceRequest,
) -> TraceBatchResult {
    run_pattern_with_debug(world, scene, request, None)
}

/// [`run_pattern`] with an optional debug recorder.
pub fn run_pattern_with_debug(
    world: &dyn TraceWorld,
    scene: &SceneRegistry,
    request: &TraceRequest,
    debug: Option<&DebugRecorder>,
) -> TraceBatchResult {
    if request.ray_count == 0 || request.max_distance <= 0.0 {
        log::debug!(
            "run_pattern: degenerate request (rays={}, max_distance={})",
            request.ray_count,
            request.max_distance
        );
        return TraceBatchResult::empty();
    }

    let origin = resolve_origin(scene, request);
    let target = resolve_target(scene, request);
    let ignore = ignore_list(origin.owner, request);
    let rays = generate_rays(request, origin.position, origin.forward, target);

    let mut result = TraceBatchResult::empty();
    for (index, ray) in rays.iter().enumerate() {
        let start = ray.origin_override.unwrap_or(origin.position);
        let end = start + ray.direction * request.max_distance;
        let hit = world.cast(
            start,
            ray.direction,
            request.max_distance,
            &request.shape,
            request.channel,
            &ignore,
        );

        if request.debug.enabled {
            if let Some(recorder) = debug {
                recorder.line(start, end, request.debug.color);
                if request.debug.draw_hit_points {
                    if let Some(hit) = &hit {
                        recorder.point(hit.position, request.debug.color);
                    }
                }
            }
        }

        result.push(
            RayRecord {
                index: index as u32,
                start,
                end,
                hit,
            },
            origin.position,
        );
    }
    result
}

/// Trace from an origin toward each point of a path pattern.
///
/// The `template` supplies the shape, channel, ignore list, and the
/// distance clamp (applied when its `max_distance` is positive).
pub fn run_along_path(
    world: &dyn TraceWorld,
    origin: &Transform,
    config: &PathConfig,
    num_points: u32,
    scale: f32,
    template: &TraceRequest,
) -> TraceBatchResult {
    let points = generate_world_points(origin, config, num_points, scale);

    let mut result = TraceBatchResult::empty();
    for (index, point) in points.iter().enumerate() {
        let to_point = *point - origin.position;
        let full_distance = to_point.length();
        let record = if to_point.is_near_zero() {
            // The point coincides with the origin; nothing to trace.
            RayRecord {
                index: index as u32,
                start: origin.position,
                end: *point,
                hit: None,
            }
        } else {
            let direction = to_point / full_distance;
            let distance = if template.max_distance > 0.0 {
                full_distance.min(template.max_distance)
            } else {
                full_distance
            };
            let hit = world.cast(
                origin.position,
                direction,
                distance,
                &template.shape,
                template.channel,
                &template.ignore,
            );
            RayRecord {
                index: index as u32,
                start: origin.position,
                end: origin.position + direction * distance,
                hit,
            }
        };
        result.push(record, origin.position);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathPattern;
    use crate::request::{
        ForwardVariant, OriginSource, PatternFamily, TargetSource, TraceShape,
    };
    use crate::result::TraceHit;
    use approx::assert_relative_eq;
    use umbra_physics::TraceChannel;
    use umbra_scene::Actor;

    /// Analytic world: a set of spheres that block line traces.
    #[derive(Default)]
    struct SphereWorld {
        spheres: Vec<(Vec3, f32, ActorHandle)>,
    }

    impl SphereWorld {
        fn with_sphere(mut self, center: Vec3, radius: f32) -> Self {
            self.spheres.push((center, radius, ActorHandle::null()));
            self
        }

        fn with_owned_sphere(mut self, center: Vec3, radius: f32, owner: ActorHandle) -> Self {
            self.spheres.push((center, radius, owner));
            self
        }
    }

    impl TraceWorld for SphereWorld {
        fn cast(
            &self,
            start: Vec3,
            direction: Vec3,
            distance: f32,
            _shape: &TraceShape,
            _channel: TraceChannel,
            ignore: &[ActorHandle],
        ) -> Option<TraceHit> {
            let mut best: Option<TraceHit> = None;
            for (center, radius, owner) in &self.spheres {
                if !owner.is_null() && ignore.contains(owner) {
                    continue;
                }
                // Ray/sphere intersection.
                let oc = start - *center;
                let b = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    continue;
                }
                let t = -b - disc.sqrt();
                if t < 0.0 || t > distance {
                    continue;
                }
                let position = start + direction * t;
                if best.map(|h| t < h.distance).unwrap_or(true) {
                    best = Some(TraceHit {
                        actor: *owner,
                        position,
                        normal: (position - *center).normalize(),
                        distance: t,
                    });
                }
            }
            best
        }
    }

    fn scene() -> SceneRegistry {
        SceneRegistry::new()
    }

    #[test]
    fn degenerate_requests_return_empty() {
        let world = SphereWorld::default();
        let scene = scene();

        let request = TraceRequest {
            ray_count: 0,
            ..Default::default()
        };
        let result = run_pattern(&world, &scene, &request);
        assert_eq!(result.total_rays, 0);
        assert!(!result.any_hit);

        let request = TraceRequest {
            max_distance: 0.0,
            ..Default::default()
        };
        let result = run_pattern(&world, &scene, &request);
        assert_eq!(result.total_rays, 0);
        assert!(!result.any_hit);
    }

    #[test]
    fn ray_indices_follow_generation_order() {
        let world = SphereWorld::default();
        let scene = scene();
        let request = TraceRequest {
            forward_variant: ForwardVariant::MultiSpread,
            ray_count: 7,
            spread_degrees: 60.0,
            origin: OriginSource::at(Vec3::ZERO, Quat::facing(Vec3::X)),
            ..Default::default()
        };

        let result = run_pattern(&world, &scene, &request);
        assert_eq!(result.total_rays, 7);
        for (i, ray) in result.rays.iter().enumerate() {
            assert_eq!(ray.index, i as u32);
        }
    }

    #[test]
    fn nearest_hit_wins_regardless_of_order() {
        // A 3-ray 180-degree spread with forward +X fires along +Z, +X,
        // and -Z. The far sphere is hit by the middle ray first; the near
        // sphere by the last ray. First-hit keeps generation order while
        // nearest-hit picks the closer surface.
        let world = SphereWorld::default()
            .with_sphere(Vec3::new(20.0, 0.0, 0.0), 1.0)
            .with_sphere(Vec3::new(0.0, 0.0, -8.0), 1.0);
        let scene = scene();
        let request = TraceRequest {
            family: PatternFamily::Forward,
            forward_variant: ForwardVariant::MultiSpread,
            ray_count: 3,
            spread_degrees: 180.0,
            max_distance: 100.0,
            origin: OriginSource::at(Vec3::ZERO, Quat::facing(Vec3::X)),
            ..Default::default()
        };

        let result = run_pattern(&world, &scene, &request);
        assert!(result.any_hit);
        let first = result.first_blocking_hit.expect("first hit");
        let nearest = result.nearest_hit.expect("nearest hit");
        assert_relative_eq!(first.position.distance(Vec3::ZERO), 19.0, epsilon = 1e-3);
        assert_relative_eq!(nearest.position.distance(Vec3::ZERO), 7.0, epsilon = 1e-3);
    }

    #[test]
    fn origin_actor_is_ignored_by_its_own_rays() {
        let mut scene = SceneRegistry::new();
        let shooter = scene.spawn(Actor::new(
            "shooter",
            Transform::from_position_rotation(Vec3::ZERO, Quat::facing(Vec3::X)),
        ));

        // A sphere owned by the shooter sits right on the ray.
        let world = SphereWorld::default()
            .with_owned_sphere(Vec3::new(2.0, 0.0, 0.0), 1.0, shooter)
            .with_sphere(Vec3::new(20.0, 0.0, 0.0), 1.0);

        let request = TraceRequest {
            origin: OriginSource::actor(shooter),
            max_distance: 100.0,
            ..Default::default()
        };

        let result = run_pattern(&world, &scene, &request);
        let hit = result.first_blocking_hit.expect("should pass through own geometry");
        assert_relative_eq!(hit.position.x, 19.0, epsilon = 1e-3);
    }

    #[test]
    fn orbit_rays_report_ring_starts() {
        let world = SphereWorld::default();
        let scene = scene();
        let center = Vec3::new(5.0, 0.0, 5.0);
        let request = TraceRequest {
            family: PatternFamily::Orbit,
            ray_count: 6,
            orbit_radius: 25.0,
            target: TargetSource::at(center),
            max_distance: 50.0,
            ..Default::default()
        };

        let result = run_pattern(&world, &scene, &request);
        assert_eq!(result.total_rays, 6);
        for ray in &result.rays {
            assert_relative_eq!(ray.start.distance(center), 25.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn path_trace_clamps_to_template_distance() {
        let world =
            SphereWorld::default().with_sphere(Vec3::new(0.0, 0.0, -40.0), 1.0);
        let origin = Transform::IDENTITY; // forward -Z
        let template = TraceRequest {
            max_distance: 20.0,
            ..Default::default()
        };

        // Line path reaches 100 units out, but traces clamp at 20 and
        // stop short of the sphere at 39.
        let result = run_along_path(
            &world,
            &origin,
            &PathConfig::new(PathPattern::Line),
            4,
            100.0,
            &template,
        );
        assert_eq!(result.total_rays, 4);
        assert!(!result.any_hit);

        let template = TraceRequest {
            max_distance: 0.0,
            ..Default::default()
        };
        let result = run_along_path(
            &world,
            &origin,
            &PathConfig::new(PathPattern::Line),
            4,
            100.0,
            &template,
        );
        assert!(result.any_hit);
    }

    #[test]
    fn debug_recorder_captures_rays_when_enabled() {
        let world = SphereWorld::default().with_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let scene = scene();
        let recorder = DebugRecorder::new();
        let mut request = TraceRequest::default();
        request.debug.enabled = true;

        run_pattern_with_debug(&world, &scene, &request, Some(&recorder));
        // One ray line plus one hit point.
        assert_eq!(recorder.len(), 2);

        request.debug.enabled = false;
        run_pattern_with_debug(&world, &scene, &request, Some(&recorder));
        assert_eq!(recorder.len(), 2);
    }
}
