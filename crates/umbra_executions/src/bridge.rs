//! OmniTrace bridge
//!
//! Turns a relative-position probe into a concrete spatial query and a
//! refined helper spawn transform: ground-relative probes fan a cone of
//! traces along the desired offset direction and keep the best
//! ground-like hit; vertical probes run a single up/down trace. Every
//! path has a deterministic fallback, so refinement degrades instead of
//! failing.

use umbra_core::Tag;
use umbra_math::{Quat, Transform, Vec2, Vec3};
use umbra_scene::{ActorHandle, SceneRegistry};
use umbra_trace::{
    run_pattern, ForwardVariant, OriginSource, PatternFamily, PatternPreset, TraceRequest,
    TraceWorld,
};

use crate::config::AutoPositionThresholds;
use crate::context::ExecutionContext;
use crate::debug::{BridgeDebugRecord, BridgeProbeMode, WorldDebugSlot};
use crate::definition::{position, ExecutionDefinition, PatternTuning};
use crate::presets::PositionProbe;

/// Minimum upward normal component for a hit to count as ground
const GROUND_NORMAL_MIN_Y: f32 = 0.5;
/// Minimum alignment between a hit offset and the desired direction
const GROUND_DIRECTION_MIN_DOT: f32 = 0.25;
/// Cap on the straight-offset fallback distance
const FALLBACK_OFFSET_CAP: f32 = 200.0;
/// Vertical probes start this far along the probe direction to clear the
/// target's own geometry
const VERTICAL_START_OFFSET: f32 = 20.0;

/// A named transform handed to the motion-warp system
#[derive(Debug, Clone)]
pub struct WarpRuntimeTarget {
    /// Warp point name the montage binds to
    pub name: String,
    /// World transform to align toward
    pub transform: Transform,
}

/// Output of one bridge probe
#[derive(Debug, Clone, Default)]
pub struct OmniTraceWarpResult {
    /// Refined helper spawn transform
    pub helper_transform: Option<Transform>,
    /// Runtime warp targets, named by the definition's authored points
    pub warp_targets: Vec<WarpRuntimeTarget>,
    /// Whether a qualifying surface hit produced the transform
    pub from_qualified_hit: bool,
}

/// Run the probe for a spawn execution and produce its warp result.
///
/// Returns `None` when the target handle is stale.
#[allow(clippy::too_many_arguments)]
pub fn compute_warp_for_spawn_execution(
    world: &dyn TraceWorld,
    scene: &SceneRegistry,
    definition: &ExecutionDefinition,
    target: ActorHandle,
    probe: &PositionProbe,
    preset: Option<&PatternPreset>,
    tuning: Option<&PatternTuning>,
    debug_slot: Option<&WorldDebugSlot>,
) -> Option<OmniTraceWarpResult> {
    let target_actor = scene.get(target)?;
    let sample_location = target_actor.transform.position;
    let target_forward = target_actor.transform.forward();

    let (helper_transform, from_qualified_hit, mode) = match probe {
        PositionProbe::GroundRelative {
            local_dir,
            trace_distance,
        } => {
            let (transform, qualified) = compute_ground_relative_helper_transform(
                world,
                scene,
                target,
                sample_location,
                *local_dir,
                preset,
                tuning,
                *trace_distance,
            );
            (transform, qualified, BridgeProbeMode::GroundRelative)
        }
        PositionProbe::Vertical {
            above,
            trace_distance,
        } => {
            let (transform, qualified) = compute_vertical_helper_transform(
                world,
                sample_location,
                *above,
                *trace_distance,
                target_forward,
                &[target],
            );
            (transform, qualified, BridgeProbeMode::Vertical)
        }
    };

    let warp_targets = definition
        .warp_points
        .first()
        .map(|wp| {
            vec![WarpRuntimeTarget {
                name: wp.name.clone(),
                transform: helper_transform,
            }]
        })
        .unwrap_or_default();

    if let Some(slot) = debug_slot {
        slot.store(BridgeDebugRecord {
            execution_tag: definition.execution_tag.clone(),
            mode,
            sample_location,
            helper_transform,
            from_qualified_hit,
        });
    }

    Some(OmniTraceWarpResult {
        helper_transform: Some(helper_transform),
        warp_targets,
        from_qualified_hit,
    })
}

/// Probe the ground around the target along a local offset direction.
///
/// Returns the refined transform and whether a qualifying hit produced
/// it. Qualifying hits are reasonably flat (`normal.y >= 0.5`) and at
/// least roughly along the desired direction; the closest one wins.
/// With no qualifying hit the nearest hit of any kind is used, and with
/// no hit at all a straight offset point at half the trace distance
/// (capped at 200 units).
#[allow(clippy::too_many_arguments)]
pub fn compute_ground_relative_helper_transform(
    world: &dyn TraceWorld,
    scene: &SceneRegistry,
    target: ActorHandle,
    sample_location: Vec3,
    local_dir: Vec2,
    preset: Option<&PatternPreset>,
    tuning: Option<&PatternTuning>,
    trace_distance: f32,
) -> (Transform, bool) {
    let (target_forward, target_right) = scene
        .get(target)
        .map(|a| (a.transform.forward(), a.transform.right()))
        .unwrap_or((Vec3::NEG_Z, Vec3::X));

    let mut desired = (target_forward * local_dir.x + target_right * local_dir.y).horizontal();
    if desired.is_near_zero() {
        desired = -target_forward.horizontal();
    }
    let desired = desired.normalize();

    let request = probe_request(desired, sample_location, preset, tuning, trace_distance, target);
    let result = run_pattern(world, scene, &request);

    // Closest hit that looks like walkable ground along the offset.
    let qualified = result
        .rays
        .iter()
        .filter_map(|ray| ray.hit)
        .filter(|hit| {
            if hit.normal.y < GROUND_NORMAL_MIN_Y {
                return false;
            }
            let to_hit = (hit.position - sample_location).normalize();
            to_hit.dot(desired) >= GROUND_DIRECTION_MIN_DOT
        })
        .min_by(|a, b| {
            let da = a.position.distance_squared(sample_location);
            let db = b.position.distance_squared(sample_location);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

    let (position, from_qualified) = match qualified {
        Some(hit) => (hit.position, true),
        None => match result.nearest_hit {
            Some(hit) => (hit.position, false),
            None => {
                let offset = (trace_distance * 0.5).min(FALLBACK_OFFSET_CAP);
                (sample_location + desired * offset, false)
            }
        },
    };

    // Pure-rear offsets keep facing away from the target; everything
    // else turns back toward the sample point.
    let pure_rear = local_dir.x < 0.0 && local_dir.y.abs() < umbra_math::consts::EPSILON;
    let facing = if pure_rear {
        desired
    } else {
        let back = (sample_location - position).horizontal();
        if back.is_near_zero() {
            desired
        } else {
            back.normalize()
        }
    };

    (
        Transform::from_position_rotation(position, Quat::facing(facing)),
        from_qualified,
    )
}

/// Probe straight up or down from an offset start point.
///
/// Falls back to a point at the full trace distance when nothing is hit.
/// The helper keeps the target's horizontal facing.
pub fn compute_vertical_helper_transform(
    world: &dyn TraceWorld,
    sample_location: Vec3,
    above: bool,
    trace_distance: f32,
    facing_hint: Vec3,
    ignore: &[ActorHandle],
) -> (Transform, bool) {
    let direction = if above { Vec3::UP } else { -Vec3::UP };
    let start = sample_location + direction * VERTICAL_START_OFFSET;

    let hit = world.cast(
        start,
        direction,
        trace_distance,
        &umbra_trace::TraceShape::Line,
        umbra_trace::TraceChannel::Visibility,
        ignore,
    );

    let (position, qualified) = match hit {
        Some(hit) => (hit.position, true),
        None => (sample_location + direction * trace_distance, false),
    };

    let facing = facing_hint.horizontal();
    let rotation = if facing.is_near_zero() {
        Quat::IDENTITY
    } else {
        Quat::facing(facing.normalize())
    };

    (Transform::from_position_rotation(position, rotation), qualified)
}

/// Build the probe cone request: the preset's request when provided,
/// otherwise an 11-ray 45-degree forward cone, with tuning overrides on
/// top.
fn probe_request(
    desired: Vec3,
    sample_location: Vec3,
    preset: Option<&PatternPreset>,
    tuning: Option<&PatternTuning>,
    trace_distance: f32,
    target: ActorHandle,
) -> TraceRequest {
    let mut request = preset
        .map(|p| p.request.clone())
        .unwrap_or_else(|| TraceRequest {
            family: PatternFamily::Forward,
            forward_variant: ForwardVariant::MultiSpread,
            ray_count: 11,
            spread_degrees: 45.0,
            ..Default::default()
        });

    if let Some(tuning) = tuning {
        request.ray_count = tuning.ray_count;
        request.spread_degrees = tuning.cone_angle_degrees;
    }

    request.origin = OriginSource::at(sample_location, Quat::facing(desired));
    request.max_distance = trace_distance;
    request.ignore.push(target);
    request
}

/// Derive the canonical position tag for a request's geometry.
///
/// Vertical separation beyond the threshold wins; otherwise the
/// instigator's bearing in the target's frame picks rear, front, left,
/// or right.
pub fn auto_position_tag(context: &ExecutionContext, thresholds: &AutoPositionThresholds) -> Tag {
    if context.height_delta <= -thresholds.vertical_height_threshold {
        return Tag::new(position::VERTICAL_ABOVE);
    }
    if context.height_delta >= thresholds.vertical_height_threshold {
        return Tag::new(position::VERTICAL_BELOW);
    }

    let to_instigator = (context.instigator_location - context.target_location).horizontal();
    if to_instigator.is_near_zero() {
        return Tag::new(position::GROUND_REAR);
    }
    let to_instigator = to_instigator.normalize();
    let forward = context.target_forward.horizontal().normalize();
    let angle = forward.angle_to_degrees(to_instigator);

    if angle >= 180.0 - thresholds.rear_half_angle_degrees {
        Tag::new(position::GROUND_REAR)
    } else if angle <= thresholds.front_half_angle_degrees {
        Tag::new(position::GROUND_FRONT)
    } else {
        let right = forward.cross(Vec3::UP);
        if to_instigator.dot(right) < 0.0 {
            Tag::new(position::GROUND_LEFT)
        } else {
            Tag::new(position::GROUND_RIGHT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{CasConfig, ExecutionBackend, WarpOffsetConfig, WarpPoint};
    use approx::assert_relative_eq;
    use umbra_core::TagSet;
    use umbra_physics::TraceChannel;
    use umbra_trace::{TraceHit, TraceShape};

    /// World where nothing is ever hit.
    struct EmptyWorld;

    impl TraceWorld for EmptyWorld {
        fn cast(
            &self,
            _start: Vec3,
            _direction: Vec3,
            _distance: f32,
            _shape: &TraceShape,
            _channel: TraceChannel,
            _ignore: &[ActorHandle],
        ) -> Option<TraceHit> {
            None
        }
    }

    /// World that returns a hit at a fixed distance with a fixed normal.
    struct UniformWorld {
        distance: f32,
        normal: Vec3,
    }

    impl TraceWorld for UniformWorld {
        fn cast(
            &self,
            start: Vec3,
            direction: Vec3,
            distance: f32,
            _shape: &TraceShape,
            _channel: TraceChannel,
            _ignore: &[ActorHandle],
        ) -> Option<TraceHit> {
            if self.distance > distance {
                return None;
            }
            Some(TraceHit {
                actor: ActorHandle::null(),
                position: start + direction * self.distance,
                normal: self.normal,
                distance: self.distance,
            })
        }
    }

    fn scene_with_target(position: Vec3, facing: Vec3) -> (SceneRegistry, ActorHandle) {
        let mut scene = SceneRegistry::new();
        let target = scene.spawn(umbra_scene::Actor::new(
            "guard",
            Transform::from_position_rotation(position, Quat::facing(facing)),
        ));
        (scene, target)
    }

    #[test]
    fn no_hits_falls_back_to_straight_offset() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        let world = EmptyWorld;

        // Rear offset: desired direction is -forward = -X.
        let (transform, qualified) = compute_ground_relative_helper_transform(
            &world,
            &scene,
            target,
            Vec3::ZERO,
            Vec2::new(-1.0, 0.0),
            None,
            None,
            180.0,
        );

        assert!(!qualified);
        // Offset = min(180 * 0.5, 200) = 90 along -X.
        assert_relative_eq!(transform.position.x, -90.0, epsilon = 1e-3);
        // Pure rear faces away from the target.
        assert_relative_eq!((transform.forward() - (-Vec3::X)).length(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn fallback_offset_is_capped() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        let world = EmptyWorld;

        let (transform, _) = compute_ground_relative_helper_transform(
            &world,
            &scene,
            target,
            Vec3::ZERO,
            Vec2::new(-1.0, 0.0),
            None,
            None,
            1000.0,
        );
        assert_relative_eq!(transform.position.distance(Vec3::ZERO), 200.0, epsilon = 1e-3);
    }

    #[test]
    fn qualifying_ground_hit_wins() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        let world = UniformWorld {
            distance: 60.0,
            normal: Vec3::UP,
        };

        let (transform, qualified) = compute_ground_relative_helper_transform(
            &world,
            &scene,
            target,
            Vec3::ZERO,
            Vec2::new(-1.0, 0.0),
            None,
            None,
            180.0,
        );

        assert!(qualified);
        assert_relative_eq!(transform.position.distance(Vec3::ZERO), 60.0, epsilon = 1e-2);
    }

    #[test]
    fn steep_normals_fall_back_to_nearest_hit() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        // Wall-like normal: fails the ground filter but still counts as
        // the nearest hit.
        let world = UniformWorld {
            distance: 40.0,
            normal: Vec3::X,
        };

        let (transform, qualified) = compute_ground_relative_helper_transform(
            &world,
            &scene,
            target,
            Vec3::ZERO,
            Vec2::new(-1.0, 0.0),
            None,
            None,
            180.0,
        );

        assert!(!qualified);
        assert_relative_eq!(transform.position.distance(Vec3::ZERO), 40.0, epsilon = 1e-2);
    }

    #[test]
    fn side_offset_faces_back_to_the_sample() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        let world = EmptyWorld;

        let (transform, _) = compute_ground_relative_helper_transform(
            &world,
            &scene,
            target,
            Vec3::ZERO,
            Vec2::new(0.0, 1.0),
            None,
            None,
            100.0,
        );

        let back = (Vec3::ZERO - transform.position).normalize();
        assert_relative_eq!((transform.forward() - back).length(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn vertical_probe_hits_and_falls_back() {
        let world = UniformWorld {
            distance: 30.0,
            normal: -Vec3::UP,
        };
        let (transform, qualified) = compute_vertical_helper_transform(
            &world,
            Vec3::ZERO,
            true,
            400.0,
            Vec3::X,
            &[],
        );
        assert!(qualified);
        assert_relative_eq!(transform.position.y, VERTICAL_START_OFFSET + 30.0, epsilon = 1e-3);

        let empty = EmptyWorld;
        let (transform, qualified) =
            compute_vertical_helper_transform(&empty, Vec3::ZERO, false, 400.0, Vec3::X, &[]);
        assert!(!qualified);
        assert_relative_eq!(transform.position.y, -400.0, epsilon = 1e-3);
    }

    #[test]
    fn warp_result_names_the_first_authored_point() {
        let (scene, target) = scene_with_target(Vec3::ZERO, Vec3::X);
        let world = EmptyWorld;
        let slot = WorldDebugSlot::new();

        let mut definition = ExecutionDefinition::new(
            "Execution.Takedown.Rear",
            ExecutionBackend::Cas(CasConfig {
                scene: crate::content::AssetId::new("Scenes/Rear"),
                section: "Default".into(),
                min_distance: 0.0,
                max_distance: 200.0,
                max_facing_angle_degrees: 60.0,
                offset: WarpOffsetConfig::default(),
            }),
        );
        definition.warp_points.push(WarpPoint {
            name: "ExecutionEntry".into(),
            frame: crate::definition::WarpFrame::Target,
            local_offset: Transform::IDENTITY,
            max_warp_distance: 300.0,
        });

        let probe = PositionProbe::GroundRelative {
            local_dir: Vec2::new(-1.0, 0.0),
            trace_distance: 180.0,
        };
        let result = compute_warp_for_spawn_execution(
            &world,
            &scene,
            &definition,
            target,
            &probe,
            None,
            None,
            Some(&slot),
        )
        .expect("target is live");

        assert!(result.helper_transform.is_some());
        assert_eq!(result.warp_targets.len(), 1);
        assert_eq!(result.warp_targets[0].name, "ExecutionEntry");
        assert!(slot.load().is_some());
    }

    #[test]
    fn auto_position_tag_picks_quadrants() {
        let mut scene = SceneRegistry::new();
        let target = scene.spawn(umbra_scene::Actor::new(
            "guard",
            Transform::from_position_rotation(Vec3::ZERO, Quat::facing(Vec3::X)),
        ));
        let thresholds = AutoPositionThresholds::default();

        let mut capture = |instigator_position: Vec3, height: f32| {
            let instigator = scene.spawn(umbra_scene::Actor::new(
                "player",
                Transform::from_position_rotation(
                    instigator_position + Vec3::new(0.0, height, 0.0),
                    Quat::facing(Vec3::X),
                ),
            ));
            ExecutionContext::capture(
                &scene,
                &crate::stealth::FixedStealthProvider::default(),
                instigator,
                target,
                TagSet::new(),
            )
            .unwrap()
        };

        // Behind the target (target faces +X).
        let rear = capture(Vec3::new(-100.0, 0.0, 0.0), 0.0);
        assert_eq!(auto_position_tag(&rear, &thresholds).path(), position::GROUND_REAR);

        // Ahead of the target.
        let front = capture(Vec3::new(100.0, 0.0, 0.0), 0.0);
        assert_eq!(auto_position_tag(&front, &thresholds).path(), position::GROUND_FRONT);

        // Far above the target.
        let above = capture(Vec3::new(10.0, 0.0, 0.0), 200.0);
        assert_eq!(
            auto_position_tag(&above, &thresholds).path(),
            position::VERTICAL_ABOVE
        );
    }
}
