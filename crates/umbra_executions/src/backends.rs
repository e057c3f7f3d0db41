//! Backend-specific evaluation checks and the spawn-actor dispatch
//!
//! Each backend contributes one ordered check to candidate evaluation;
//! only the spawn-actor backend has nontrivial dispatch logic (probe
//! refinement, helper instantiation, motion-warp handoff). CAS, sequence,
//! and AI-script dispatch reduce to chosen-event broadcasts owned by the
//! manager.

use umbra_math::Transform;
use umbra_scene::{Actor, SceneRegistry};
use umbra_trace::{PatternLibrary, TraceWorld};

use crate::bridge::{compute_warp_for_spawn_execution, OmniTraceWarpResult};
use crate::content::{AssetId, ContentRegistry};
use crate::context::ExecutionContext;
use crate::debug::WorldDebugSlot;
use crate::definition::{
    AiScriptConfig, CasConfig, ExecutionDefinition, PatternTuning, SequenceConfig,
    SpawnActorConfig,
};
use crate::error::{ExecutionError, RejectReason, Result};
use crate::helper::ExecutionHelper;
use crate::presets::{KemPresetLibrary, PositionProbe};

/// Resolved CAS selection payload, filled when the geometric checks pass
#[derive(Debug, Clone)]
pub struct CasQueryResult {
    /// Scene asset
    pub scene: AssetId,
    /// Section to start in
    pub section: String,
    /// Role names from the scene
    pub instigator_role: String,
    /// Role names from the scene
    pub target_role: String,
    /// Instigator entry transform in world space
    pub instigator_entry: Transform,
    /// Target entry transform in world space
    pub target_entry: Transform,
    /// Warp target the instigator aligns to
    pub warp_target: Transform,
}

/// Rejection from a backend check: reason code plus diagnostic
pub type BackendReject = (RejectReason, String);

/// CAS backend check: scene resolves, height within the same-plane
/// threshold, distance within band, facing alignment within the angle,
/// and the instigator within warp reach of the computed entry point.
pub fn evaluate_cas(
    definition: &ExecutionDefinition,
    config: &CasConfig,
    context: &ExecutionContext,
    content: &ContentRegistry,
    scene: &SceneRegistry,
) -> std::result::Result<CasQueryResult, BackendReject> {
    let anim_scene = content.resolve_scene(&config.scene).map_err(|e| {
        (
            RejectReason::DataIncomplete,
            format!("CAS scene unresolved: {e}"),
        )
    })?;

    if context.height_delta.abs() > definition.same_plane_height_delta {
        return Err((
            RejectReason::HeightModeMismatch,
            format!(
                "height delta {:.1} exceeds CAS limit {:.1}",
                context.height_delta, definition.same_plane_height_delta
            ),
        ));
    }

    let distance_sq = context.distance_squared();
    let min_sq = config.min_distance * config.min_distance;
    let max_sq = config.max_distance * config.max_distance;
    if distance_sq < min_sq || distance_sq > max_sq {
        return Err((
            RejectReason::DistanceOutOfRange,
            format!(
                "distance {:.1} outside [{:.1}, {:.1}]",
                distance_sq.sqrt(),
                config.min_distance,
                config.max_distance
            ),
        ));
    }

    let facing = context.facing_alignment_degrees();
    if facing > config.max_facing_angle_degrees {
        return Err((
            RejectReason::AngleOutOfRange,
            format!(
                "facing alignment {:.1} deg exceeds {:.1}",
                facing, config.max_facing_angle_degrees
            ),
        ));
    }

    let target_transform = scene
        .get(context.target)
        .map(|a| a.transform)
        .unwrap_or_else(|| Transform::from_position(context.target_location));
    let warp_target = target_transform.combine(&config.offset.local_offset);

    let warp_distance = context.instigator_location.distance(warp_target.position);
    if warp_distance > config.offset.max_warp_distance {
        return Err((
            RejectReason::DistanceOutOfRange,
            format!(
                "warp target {:.1} beyond max warp distance {:.1}",
                warp_distance, config.offset.max_warp_distance
            ),
        ));
    }

    Ok(CasQueryResult {
        scene: config.scene.clone(),
        section: config.section.clone(),
        instigator_role: anim_scene.instigator_role.clone(),
        target_role: anim_scene.target_role.clone(),
        instigator_entry: target_transform.combine(&anim_scene.instigator_entry),
        target_entry: target_transform.combine(&anim_scene.target_entry),
        warp_target,
    })
}

/// Level-sequence backend check: the asset exists.
pub fn evaluate_sequence(
    config: &SequenceConfig,
    content: &ContentRegistry,
) -> std::result::Result<(), BackendReject> {
    content.resolve_sequence(&config.sequence).map_err(|e| {
        (
            RejectReason::DataIncomplete,
            format!("sequence unresolved: {e}"),
        )
    })?;
    Ok(())
}

/// Retired AI-script backend check: the behavior tag is set.
pub fn evaluate_ai_script(config: &AiScriptConfig) -> std::result::Result<(), BackendReject> {
    if config.behavior_tag.is_none() {
        return Err((
            RejectReason::DataIncomplete,
            "AI-script backend has no behavior tag".to_string(),
        ));
    }
    Ok(())
}

/// Spawn-actor backend check: helper class, execution data, and the
/// instigator montage all resolve; authored warp points resolve by name
/// (existence probe, distance bypassed).
pub fn evaluate_spawn_actor(
    definition: &ExecutionDefinition,
    config: &SpawnActorConfig,
    context: &ExecutionContext,
    content: &ContentRegistry,
    scene: &SceneRegistry,
) -> std::result::Result<(), BackendReject> {
    content.resolve_helper_class(&config.helper_class).map_err(|e| {
        (
            RejectReason::DataIncomplete,
            format!("helper class unresolved: {e}"),
        )
    })?;

    let data = content
        .resolve_execution_data(&config.execution_data)
        .map_err(|e| {
            (
                RejectReason::DataIncomplete,
                format!("execution data unresolved: {e}"),
            )
        })?;

    let montage_id = data.instigator_montage.as_ref().ok_or_else(|| {
        (
            RejectReason::DataIncomplete,
            "execution data has no instigator montage".to_string(),
        )
    })?;
    content.resolve_montage(montage_id).map_err(|e| {
        (
            RejectReason::DataIncomplete,
            format!("instigator montage unresolved: {e}"),
        )
    })?;

    if let Some(first) = definition.warp_points.first() {
        let resolved = definition.resolve_warp_point_by_name(
            &first.name,
            scene,
            context.instigator,
            context.target,
            false,
        );
        if resolved.is_none() {
            return Err((
                RejectReason::WarpPointMissing,
                format!("warp point '{}' does not resolve", first.name),
            ));
        }
    }

    Ok(())
}

/// Outcome of a spawn-actor dispatch
#[derive(Debug)]
pub enum SpawnOutcome {
    /// A helper is live and will finish after its lifespan
    Active(ExecutionHelper),
    /// Neither montage had positive length; the execution ended
    /// immediately as a failure
    EndedImmediately,
}

/// Everything the spawn-actor dispatch needs besides the definition.
pub struct SpawnEnv<'a> {
    pub scene: &'a mut SceneRegistry,
    pub world: &'a dyn TraceWorld,
    pub content: &'a ContentRegistry,
    pub trace_presets: &'a PatternLibrary,
    pub kem_presets: &'a KemPresetLibrary,
    pub debug_slot: Option<&'a WorldDebugSlot>,
}

/// Dispatch the spawn-actor backend.
///
/// Computes the spawn transform (anchor, else target, optionally refined
/// by the bridge probe), spawns and initializes the helper, and pushes
/// the first runtime warp target onto the instigator.
pub fn execute_spawn_actor(
    env: &mut SpawnEnv<'_>,
    definition: &ExecutionDefinition,
    config: &SpawnActorConfig,
    context: &ExecutionContext,
    anchor_transform: Option<Transform>,
) -> Result<(SpawnOutcome, bool)> {
    let target_transform = env
        .scene
        .get(context.target)
        .map(|a| a.transform)
        .ok_or_else(|| ExecutionError::ActorInvalid("target despawned before dispatch".into()))?;

    let base_transform = anchor_transform.unwrap_or(target_transform);

    let mut used_omnitrace = false;
    let warp_result: Option<OmniTraceWarpResult> = if config.use_omnitrace_warp {
        resolve_probe(env, config, definition).and_then(|(probe, preset_id, tuning)| {
            let preset = preset_id.and_then(|id| env.trace_presets.find(&id));
            compute_warp_for_spawn_execution(
                env.world,
                env.scene,
                definition,
                context.target,
                &probe,
                preset,
                tuning.as_ref(),
                env.debug_slot,
            )
        })
    } else {
        None
    };

    let spawn_transform = warp_result
        .as_ref()
        .and_then(|w| {
            used_omnitrace = w.helper_transform.is_some();
            w.helper_transform
        })
        .unwrap_or(base_transform);

    let class = env
        .content
        .resolve_helper_class(&config.helper_class)
        .map_err(|e| ExecutionError::ContentMissing(e.to_string()))?;
    let data = env
        .content
        .resolve_execution_data(&config.execution_data)
        .map_err(|e| ExecutionError::ContentMissing(e.to_string()))?;

    let helper_actor = env.scene.spawn(Actor::new(
        format!("{}_helper", class.name),
        spawn_transform,
    ));

    if let Some(warp) = warp_result.as_ref().and_then(|w| w.warp_targets.first()) {
        env.scene
            .set_warp_target(context.instigator, warp.name.clone(), warp.transform);
    }

    // Target montage only plays while the target is still live.
    let instigator_length = env.content.montage_length(data.instigator_montage.as_ref());
    let target_length = if env.scene.is_valid(context.target) {
        env.content.montage_length(data.target_montage.as_ref())
    } else {
        0.0
    };
    let montage_length = instigator_length.max(target_length);

    if montage_length <= 0.0 {
        log::warn!(
            "spawn execution '{}': no positive montage length, ending immediately",
            definition.display_name()
        );
        env.scene.despawn(helper_actor);
        return Ok((SpawnOutcome::EndedImmediately, used_omnitrace));
    }

    let mut helper = ExecutionHelper::new(
        helper_actor,
        context.instigator,
        context.target,
        definition.execution_tag.clone(),
        montage_length,
    );
    if let Some(id) = data.instigator_montage.as_ref() {
        helper.montages.push(id.to_string());
    }
    if let Some(id) = data.target_montage.as_ref() {
        helper.montages.push(id.to_string());
    }

    log::debug!(
        "spawn execution '{}': helper up for {:.2}s at {:?}",
        definition.display_name(),
        helper.remaining(),
        spawn_transform.position
    );

    Ok((SpawnOutcome::Active(helper), used_omnitrace))
}

/// Resolve which probe a spawn config runs: preset entry, then legacy
/// tag, then the definition's position tag.
fn resolve_probe(
    env: &SpawnEnv<'_>,
    config: &SpawnActorConfig,
    definition: &ExecutionDefinition,
) -> Option<(PositionProbe, Option<String>, Option<PatternTuning>)> {
    if let Some(entry_id) = &config.pattern_entry {
        if let Some(entry) = env.kem_presets.find(entry_id) {
            let tuning = config.pattern_tuning.or(entry.tuning);
            return Some((entry.probe, entry.trace_preset.clone(), tuning));
        }
        log::warn!(
            "spawn execution '{}': pattern entry '{}' not found, falling back",
            definition.display_name(),
            entry_id
        );
    }
    if let Some(legacy) = &config.legacy_pattern_tag {
        if let Some(probe) = PositionProbe::for_legacy_tag(legacy) {
            return Some((probe, None, config.pattern_tuning));
        }
    }
    definition
        .position_tag
        .as_ref()
        .and_then(PositionProbe::for_position_tag)
        .map(|probe| (probe, None, config.pattern_tuning))
}
