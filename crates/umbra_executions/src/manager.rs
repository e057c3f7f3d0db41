//! The execution manager
//!
//! One manager owns the per-session selection state: the definition
//! registry, anchors, observers, the Ready/Executing/cooldown state
//! machine, and the debug side channels. A request is accepted only in
//! `Ready`; evaluation walks every candidate through the ordered checks,
//! the best strictly-greater score wins, and the winner's backend is
//! dispatched before the state moves to `Executing`.

use std::collections::HashMap;
use std::sync::Arc;

use umbra_core::{Tag, TagSet};
use umbra_scene::{ActorHandle, SceneRegistry};
use umbra_trace::{PatternLibrary, TraceWorld};

use crate::ability::{AbilityEvaluator, TagAbilityEvaluator};
use crate::anchor::{best_bonus, discover_nearby, AnchorMarker, NearbyAnchor};
use crate::backends::{
    evaluate_ai_script, evaluate_cas, evaluate_sequence, evaluate_spawn_actor,
    execute_spawn_actor, CasQueryResult, SpawnEnv, SpawnOutcome,
};
use crate::config::KemSettings;
use crate::content::{AssetId, ContentRegistry};
use crate::context::ExecutionContext;
use crate::debug::{
    CandidateDebugRecord, SelectionHistory, SelectionSnapshot, WorldDebugSlot,
};
use crate::definition::{AbilityGate, ExecutionBackend, ExecutionDefinition, HeightMode};
use crate::error::RejectReason;
use crate::events::{
    AiScriptChosen, CasChosen, DecisionStep, ExecutionEvent, ExecutionEventKind,
    ExecutionObserver, FxDispatcher, SequenceChosen, TelemetryRecord,
};
use crate::helper::ExecutionHelper;
use crate::presets::KemPresetLibrary;
use crate::stealth::{FixedStealthProvider, StealthProvider};

/// Selection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Accepting requests
    Ready,
    /// An execution is running
    Executing,
    /// Post-success cooldown
    SuccessCooldown,
    /// Post-failure cooldown
    FailureCooldown,
}

/// Outcome of evaluating one definition against a context
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    /// Whether the definition may compete for selection
    pub accepted: bool,
    /// Score before any anchor bonus; zero when rejected
    pub score: f32,
    /// Resolved CAS payload when the backend check filled one
    pub cas: Option<CasQueryResult>,
    /// Reject reason; the `None` variant when accepted
    pub reject: RejectReason,
    /// Diagnostic string for the rejection
    pub reason: String,
    /// Named decision steps for telemetry
    pub steps: Vec<DecisionStep>,
}

/// Registered definition: preloaded, or a soft reference resolved per
/// request through the content registry.
enum DefinitionSource {
    Loaded(Arc<ExecutionDefinition>),
    Asset(AssetId),
}

/// External collaborators a request runs against.
pub struct RequestEnv<'a> {
    /// The live scene; mutated when the spawn backend runs
    pub scene: &'a mut SceneRegistry,
    /// Collision-query world for bridge probes
    pub world: &'a dyn TraceWorld,
    /// Loaded content
    pub content: &'a ContentRegistry,
}

/// The execution selection/orchestration engine. One per game session.
pub struct ExecutionManager {
    settings: KemSettings,
    trace_presets: PatternLibrary,
    kem_presets: KemPresetLibrary,
    definitions: Vec<DefinitionSource>,
    registry: HashMap<Tag, Arc<ExecutionDefinition>>,
    anchors: Vec<(ActorHandle, AnchorMarker)>,
    observers: Vec<Arc<dyn ExecutionObserver>>,
    fx: Option<Arc<dyn FxDispatcher>>,
    ability_evaluator: Box<dyn AbilityEvaluator>,
    stealth: Box<dyn StealthProvider>,
    debug_slot: WorldDebugSlot,
    state: ExecutionState,
    cooldown_remaining: f32,
    active_tag: Option<Tag>,
    active_helper: Option<ExecutionHelper>,
    history: SelectionHistory,
    last_selection: Option<SelectionSnapshot>,
    anchor_debug: bool,
}

impl ExecutionManager {
    /// Create a manager with the given settings and default collaborators.
    pub fn new(settings: KemSettings) -> Self {
        Self {
            settings,
            trace_presets: PatternLibrary::with_builtins(),
            kem_presets: KemPresetLibrary::with_builtins(),
            definitions: Vec::new(),
            registry: HashMap::new(),
            anchors: Vec::new(),
            observers: Vec::new(),
            fx: None,
            ability_evaluator: Box::new(TagAbilityEvaluator),
            stealth: Box::new(FixedStealthProvider::default()),
            debug_slot: WorldDebugSlot::new(),
            state: ExecutionState::Ready,
            cooldown_remaining: 0.0,
            active_tag: None,
            active_helper: None,
            history: SelectionHistory::new(),
            last_selection: None,
            anchor_debug: false,
        }
    }

    // ==================== Registration ====================

    /// Register a preloaded definition.
    pub fn register_definition(&mut self, definition: Arc<ExecutionDefinition>) {
        self.registry
            .insert(definition.execution_tag.clone(), definition.clone());
        self.definitions.push(DefinitionSource::Loaded(definition));
    }

    /// Register a definition by asset reference; resolved on every
    /// request.
    pub fn register_definition_asset(&mut self, id: AssetId) {
        self.definitions.push(DefinitionSource::Asset(id));
    }

    /// Look up a loaded definition by its execution tag.
    pub fn find_definition(&self, tag: &Tag) -> Option<&Arc<ExecutionDefinition>> {
        self.registry.get(tag)
    }

    /// Number of registered definitions (loaded and soft-referenced).
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Register an anchor marker against a scene actor.
    pub fn register_anchor(&mut self, actor: ActorHandle, marker: AnchorMarker) {
        self.anchors.push((actor, marker));
    }

    /// Remove every registered anchor.
    pub fn clear_anchors(&mut self) {
        self.anchors.clear();
    }

    /// Add an observer; broadcasts reach observers in registration order.
    pub fn add_observer(&mut self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }

    /// Set the FX dispatcher.
    pub fn set_fx_dispatcher(&mut self, fx: Arc<dyn FxDispatcher>) {
        self.fx = Some(fx);
    }

    /// Replace the ability evaluator.
    pub fn set_ability_evaluator(&mut self, evaluator: Box<dyn AbilityEvaluator>) {
        self.ability_evaluator = evaluator;
    }

    /// Replace the stealth provider.
    pub fn set_stealth_provider(&mut self, provider: Box<dyn StealthProvider>) {
        self.stealth = provider;
    }

    /// Replace the trace-engine preset library.
    pub fn set_trace_presets(&mut self, presets: PatternLibrary) {
        self.trace_presets = presets;
    }

    /// Replace the execution preset library.
    pub fn set_kem_presets(&mut self, presets: KemPresetLibrary) {
        self.kem_presets = presets;
    }

    // ==================== Accessors ====================

    /// Current state.
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Whether a request would be accepted right now.
    pub fn is_ready(&self) -> bool {
        self.state == ExecutionState::Ready
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> &KemSettings {
        &self.settings
    }

    /// Replace the settings; takes effect on the next request.
    pub fn set_settings(&mut self, settings: KemSettings) {
        self.settings = settings;
    }

    /// The last selection's candidate records.
    pub fn last_selection(&self) -> Option<&SelectionSnapshot> {
        self.last_selection.as_ref()
    }

    /// Rolling history of recent selections.
    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    /// Per-world bridge debug slot.
    pub fn debug_slot(&self) -> &WorldDebugSlot {
        &self.debug_slot
    }

    /// Whether anchor discovery logging is on.
    pub fn anchor_debug_enabled(&self) -> bool {
        self.anchor_debug
    }

    /// Resolve every registered definition, keeping unresolved asset
    /// names as errors. Used by the console commands.
    pub(crate) fn resolved_definitions(
        &self,
        content: &ContentRegistry,
    ) -> Vec<std::result::Result<Arc<ExecutionDefinition>, String>> {
        self.definitions
            .iter()
            .map(|source| match source {
                DefinitionSource::Loaded(def) => Ok(def.clone()),
                DefinitionSource::Asset(id) => content
                    .resolve_definition(id)
                    .map_err(|_| id.to_string()),
            })
            .collect()
    }

    // ==================== Requests ====================

    /// Request an execution for an instigator/target pair.
    ///
    /// Accepted only in `Ready` with both handles live. Returns whether a
    /// candidate was selected and dispatched.
    pub fn request_execution(
        &mut self,
        env: &mut RequestEnv<'_>,
        instigator: ActorHandle,
        target: ActorHandle,
        context_tags: TagSet,
        override_definition: Option<Arc<ExecutionDefinition>>,
        source_label: &str,
    ) -> bool {
        if self.state != ExecutionState::Ready {
            log::debug!(
                "request '{}' ignored: state is {:?}",
                source_label,
                self.state
            );
            return false;
        }

        let Some(context) = ExecutionContext::capture(
            env.scene,
            self.stealth.as_ref(),
            instigator,
            target,
            context_tags,
        ) else {
            log::warn!(
                "request '{}' ignored: instigator or target is not a live actor",
                source_label
            );
            return false;
        };

        if self.settings.debug_verbosity >= 1 {
            log::info!(
                "execution request '{}': distance {:.1}, height {:.1}, {} candidates",
                source_label,
                context.distance(),
                context.height_delta,
                self.definitions.len() + override_definition.is_some() as usize
            );
        }

        // Candidate pool: the override first, then every registered
        // definition except the override itself. Soft references resolve
        // now; failures become MissingDefinition records.
        let mut candidates: Vec<Result<Arc<ExecutionDefinition>, String>> = Vec::new();
        if let Some(over) = &override_definition {
            candidates.push(Ok(over.clone()));
        }
        for source in &self.definitions {
            match source {
                DefinitionSource::Loaded(def) => {
                    let is_override = override_definition
                        .as_ref()
                        .map(|o| o.execution_tag == def.execution_tag)
                        .unwrap_or(false);
                    if !is_override {
                        candidates.push(Ok(def.clone()));
                    }
                }
                DefinitionSource::Asset(id) => match env.content.resolve_definition(id) {
                    Ok(def) => {
                        let is_override = override_definition
                            .as_ref()
                            .map(|o| o.execution_tag == def.execution_tag)
                            .unwrap_or(false);
                        if !is_override {
                            candidates.push(Ok(def));
                        }
                    }
                    Err(_) => candidates.push(Err(id.to_string())),
                },
            }
        }

        let nearby = discover_nearby(
            env.scene,
            &self.anchors,
            context.instigator_location,
            context.target_location,
            &self.settings,
        );
        if self.anchor_debug && !nearby.is_empty() {
            log::info!(
                "request '{}': {} anchors in range",
                source_label,
                nearby.len()
            );
        }

        // Evaluate every candidate; the best strictly-greater accepted
        // score wins, so ties keep the earlier candidate.
        let mut evaluated: Vec<Evaluated> = Vec::new();
        let mut records: Vec<CandidateDebugRecord> = Vec::new();
        let mut best: Option<usize> = None;

        for candidate in candidates {
            match candidate {
                Ok(definition) => {
                    let outcome =
                        self.evaluate_definition(&definition, &context, env.content, env.scene);
                    let (bonus, anchor) = best_bonus(&definition, &nearby, &self.settings);
                    let final_score = outcome.score + bonus;
                    let anchor_index = anchor
                        .map(|a| nearby.iter().position(|n| n.actor == a.actor).unwrap_or(0));

                    if self.settings.debug_verbosity >= 2 {
                        log::info!(
                            "  candidate '{}': accepted={}, score={:.2} (+{:.2} anchor), {:?}",
                            definition.display_name(),
                            outcome.accepted,
                            outcome.score,
                            bonus,
                            outcome.reject
                        );
                    }

                    records.push(CandidateDebugRecord {
                        name: definition.display_name().to_string(),
                        score: final_score,
                        selected: false,
                        reject_reason: outcome.reject,
                        failure_reason: outcome.reason.clone(),
                        distance: context.distance(),
                        facing_angle_degrees: context.facing_alignment_degrees(),
                        height_delta: context.height_delta,
                    });

                    let index = evaluated.len();
                    let accepted = outcome.accepted;
                    evaluated.push(Evaluated {
                        definition,
                        outcome,
                        final_score,
                        anchor_index,
                    });
                    if accepted {
                        let is_better = match best {
                            Some(current) => final_score > evaluated[current].final_score,
                            None => true,
                        };
                        if is_better {
                            best = Some(index);
                        }
                    }
                }
                Err(asset_name) => {
                    records.push(CandidateDebugRecord {
                        name: asset_name.clone(),
                        score: 0.0,
                        selected: false,
                        reject_reason: RejectReason::MissingDefinition,
                        failure_reason: format!("definition asset '{asset_name}' unresolved"),
                        distance: context.distance(),
                        facing_angle_degrees: context.facing_alignment_degrees(),
                        height_delta: context.height_delta,
                    });
                }
            }
        }

        let Some(winner_index) = best else {
            self.finish_no_candidate(&context, records, source_label, &evaluated);
            return false;
        };

        // Mark the winner in the debug records. Record index matches the
        // evaluated index offset by the unresolved-asset records before
        // it, so find it by name instead.
        let winner = &evaluated[winner_index];
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.name == winner.definition.display_name())
        {
            record.selected = true;
        }
        let snapshot = SelectionSnapshot {
            source_label: source_label.to_string(),
            selected_tag: Some(winner.definition.execution_tag.clone()),
            candidates: records,
        };
        self.last_selection = Some(snapshot.clone());
        self.history.push(snapshot);

        // Lifecycle: Started fires before dispatch, and the state flips
        // to Executing; a failed spawn dispatch reverts it below.
        self.broadcast_event(
            ExecutionEventKind::Started,
            Some(winner.definition.execution_tag.clone()),
            instigator,
            target,
            source_label,
        );
        if let (Some(fx), Some(tag)) = (&self.fx, &winner.definition.fx_tag) {
            fx.trigger(tag, context.instigator_location);
        }
        self.state = ExecutionState::Executing;
        self.active_tag = Some(winner.definition.execution_tag.clone());

        let anchor = winner.anchor_index.map(|i| &nearby[i]);
        let used_anchor = anchor.is_some();
        let definition = winner.definition.clone();
        let outcome = winner.outcome.clone();
        let steps = outcome.steps.clone();

        match self.dispatch_backend(env, &definition, &context, outcome, anchor, source_label) {
            Ok(used_omnitrace) => {
                self.emit_telemetry(
                    &context,
                    source_label,
                    true,
                    Some(definition.execution_tag.clone()),
                    used_anchor,
                    used_omnitrace,
                    steps,
                );
                true
            }
            Err(message) => {
                // Backend dispatch failed after the state transition;
                // revert instead of stranding the machine in Executing.
                log::warn!(
                    "execution '{}' dispatch failed: {message}; reverting to Ready",
                    definition.display_name()
                );
                self.state = ExecutionState::Ready;
                self.active_tag = None;
                self.broadcast_event(
                    ExecutionEventKind::Failed,
                    Some(definition.execution_tag.clone()),
                    instigator,
                    target,
                    source_label,
                );
                self.emit_telemetry(
                    &context,
                    source_label,
                    false,
                    Some(definition.execution_tag.clone()),
                    used_anchor,
                    false,
                    steps,
                );
                false
            }
        }
    }

    /// Evaluate one definition against a context.
    ///
    /// Checks run in order and short-circuit on the first failure: tag
    /// gate, height mode, backend-specific, ability gate, stealth gate,
    /// then score assembly.
    pub fn evaluate_definition(
        &self,
        definition: &ExecutionDefinition,
        context: &ExecutionContext,
        content: &ContentRegistry,
        scene: &SceneRegistry,
    ) -> EvaluationOutcome {
        let mut steps = Vec::new();
        let reject = |reason: RejectReason, message: String, steps: Vec<DecisionStep>| {
            EvaluationOutcome {
                accepted: false,
                score: 0.0,
                cas: None,
                reject: reason,
                reason: message,
                steps,
            }
        };

        // 1. Context tags.
        let tags_ok = context
            .context_tags
            .has_all(&definition.required_context_tags)
            && !context
                .context_tags
                .has_any(&definition.blocked_context_tags);
        steps.push(DecisionStep {
            name: "tags",
            passed: tags_ok,
            value: context.context_tags.len() as f32,
        });
        if !tags_ok {
            return reject(
                RejectReason::MissionTagMismatch,
                "context tags do not satisfy required/blocked sets".to_string(),
                steps,
            );
        }

        // 2. Height mode.
        let height = context.height_delta.abs();
        let height_ok = match definition.height_mode {
            HeightMode::SamePlaneOnly => height <= definition.same_plane_height_delta,
            HeightMode::VerticalOnly => height >= definition.same_plane_height_delta,
            HeightMode::Any => true,
        };
        steps.push(DecisionStep {
            name: "height",
            passed: height_ok,
            value: context.height_delta,
        });
        if !height_ok {
            return reject(
                RejectReason::HeightModeMismatch,
                format!(
                    "height delta {:.1} incompatible with {:?}",
                    context.height_delta, definition.height_mode
                ),
                steps,
            );
        }

        // 3. Backend-specific.
        let mut cas_result = None;
        let backend_check = match &definition.backend {
            ExecutionBackend::Cas(config) => {
                evaluate_cas(definition, config, context, content, scene).map(|result| {
                    cas_result = Some(result);
                })
            }
            ExecutionBackend::LevelSequence(config) => evaluate_sequence(config, content),
            ExecutionBackend::AiScript(config) => evaluate_ai_script(config),
            ExecutionBackend::SpawnActor(config) => {
                evaluate_spawn_actor(definition, config, context, content, scene)
            }
        };
        steps.push(DecisionStep {
            name: "backend",
            passed: backend_check.is_ok(),
            value: context.distance(),
        });
        if let Err((reason, message)) = backend_check {
            return reject(reason, message, steps);
        }

        // 4. Ability gate.
        if let Some(gate) = &definition.ability_gate {
            let ability_result: Result<bool, String> = match gate {
                AbilityGate::Inline(required) => Ok(self.ability_evaluator.has_abilities(
                    scene,
                    context.instigator,
                    required,
                )),
                AbilityGate::Library(id) => match content.resolve_ability_set(id) {
                    Ok(required) => Ok(self.ability_evaluator.has_abilities(
                        scene,
                        context.instigator,
                        required,
                    )),
                    Err(e) => Err(e.to_string()),
                },
            };
            match ability_result {
                Ok(passed) => {
                    steps.push(DecisionStep {
                        name: "ability",
                        passed,
                        value: 0.0,
                    });
                    if !passed {
                        return reject(
                            RejectReason::AbilityRequirementFailed,
                            "instigator lacks a required ability".to_string(),
                            steps,
                        );
                    }
                }
                Err(message) => {
                    steps.push(DecisionStep {
                        name: "ability",
                        passed: false,
                        value: 0.0,
                    });
                    return reject(
                        RejectReason::DataIncomplete,
                        format!("ability set unresolved: {message}"),
                        steps,
                    );
                }
            }
        }

        // 5. Stealth gate, with a small tolerance against float drift.
        let stealth_ok = context.stealth.score01
            <= definition.max_global_stealth_score01 + umbra_math::consts::EPSILON;
        steps.push(DecisionStep {
            name: "stealth",
            passed: stealth_ok,
            value: context.stealth.score01,
        });
        if !stealth_ok {
            return reject(
                RejectReason::StealthBlocked,
                format!(
                    "stealth score {:.2} exceeds {:.2}",
                    context.stealth.score01, definition.max_global_stealth_score01
                ),
                steps,
            );
        }

        // 6. Score assembly.
        let mut score = definition.base_score;
        if context.stealth.shadow_level01 > definition.min_shadow_level01 {
            score += ((context.stealth.shadow_level01 - definition.min_shadow_level01) * 0.5)
                .max(0.0);
        }
        if context
            .context_tags
            .same_set(&definition.required_context_tags)
        {
            score += 1.0;
        } else {
            let extra = context
                .context_tags
                .iter()
                .filter(|t| !definition.required_context_tags.contains_exact(t))
                .count();
            if extra > 0 {
                score -= (0.1 * extra as f32).clamp(0.0, 1.0);
            }
        }

        EvaluationOutcome {
            accepted: true,
            score,
            cas: cas_result,
            reject: RejectReason::None,
            reason: String::new(),
            steps,
        }
    }

    // ==================== Lifecycle ====================

    /// Signal that the running execution finished.
    ///
    /// Moves to the matching cooldown; a zero-duration cooldown snaps
    /// straight back to `Ready`.
    pub fn notify_execution_ended(&mut self, scene: &mut SceneRegistry, success: bool) {
        if self.state != ExecutionState::Executing {
            log::debug!(
                "notify_execution_ended({success}) ignored in state {:?}",
                self.state
            );
            return;
        }

        if let Some(helper) = self.active_helper.take() {
            scene.despawn(helper.actor);
        }

        let tag = self.active_tag.take();
        let kind = if success {
            ExecutionEventKind::Succeeded
        } else {
            ExecutionEventKind::Failed
        };
        self.broadcast_event(kind, tag, ActorHandle::null(), ActorHandle::null(), "engine");

        let duration = if success {
            self.settings.success_cooldown
        } else {
            self.settings.failure_cooldown
        };
        if duration <= 0.0 {
            self.state = ExecutionState::Ready;
            self.cooldown_remaining = 0.0;
        } else {
            self.state = if success {
                ExecutionState::SuccessCooldown
            } else {
                ExecutionState::FailureCooldown
            };
            self.cooldown_remaining = duration;
        }
    }

    /// Advance cooldowns and the active helper.
    pub fn update(&mut self, scene: &mut SceneRegistry, dt: f32) {
        match self.state {
            ExecutionState::SuccessCooldown | ExecutionState::FailureCooldown => {
                self.cooldown_remaining -= dt;
                if self.cooldown_remaining <= 0.0 {
                    self.cooldown_remaining = 0.0;
                    self.state = ExecutionState::Ready;
                    log::debug!("cooldown elapsed, ready");
                }
            }
            ExecutionState::Executing => {
                let finished = self
                    .active_helper
                    .as_mut()
                    .map(|helper| helper.update(dt))
                    .unwrap_or(false);
                if finished {
                    self.notify_execution_ended(scene, true);
                }
            }
            ExecutionState::Ready => {}
        }
    }

    /// Escape hatch: drop any running execution and pending cooldown.
    pub fn force_reset_state(&mut self, scene: &mut SceneRegistry) {
        if let Some(helper) = self.active_helper.take() {
            scene.despawn(helper.actor);
        }
        if self.state != ExecutionState::Ready {
            log::info!("force reset from {:?}", self.state);
        }
        self.state = ExecutionState::Ready;
        self.cooldown_remaining = 0.0;
        self.active_tag = None;
    }

    /// Flip anchor-discovery logging.
    pub fn toggle_anchor_debug(&mut self) -> bool {
        self.anchor_debug = !self.anchor_debug;
        log::info!(
            "anchor debug {}",
            if self.anchor_debug { "on" } else { "off" }
        );
        self.anchor_debug
    }

    // ==================== Internals ====================

    fn dispatch_backend(
        &mut self,
        env: &mut RequestEnv<'_>,
        definition: &Arc<ExecutionDefinition>,
        context: &ExecutionContext,
        outcome: EvaluationOutcome,
        anchor: Option<&NearbyAnchor>,
        _source_label: &str,
    ) -> Result<bool, String> {
        match &definition.backend {
            ExecutionBackend::Cas(_) => {
                let cas = outcome
                    .cas
                    .ok_or_else(|| "CAS evaluation produced no payload".to_string())?;
                let chosen = CasChosen {
                    execution_tag: definition.execution_tag.clone(),
                    scene: cas.scene,
                    section: cas.section,
                    instigator_role: cas.instigator_role,
                    target_role: cas.target_role,
                    instigator_entry: cas.instigator_entry,
                    target_entry: cas.target_entry,
                    warp_target: cas.warp_target,
                    instigator: context.instigator,
                    target: context.target,
                };
                for observer in &self.observers {
                    observer.on_cas_chosen(&chosen);
                }
                Ok(false)
            }
            ExecutionBackend::LevelSequence(config) => {
                let chosen = SequenceChosen {
                    execution_tag: definition.execution_tag.clone(),
                    sequence: config.sequence.clone(),
                    instigator: context.instigator,
                    target: context.target,
                };
                for observer in &self.observers {
                    observer.on_sequence_chosen(&chosen);
                }
                Ok(false)
            }
            ExecutionBackend::AiScript(config) => {
                let behavior_tag = config
                    .behavior_tag
                    .clone()
                    .ok_or_else(|| "AI-script backend lost its behavior tag".to_string())?;
                let chosen = AiScriptChosen {
                    execution_tag: definition.execution_tag.clone(),
                    behavior_tag,
                    instigator: context.instigator,
                    target: context.target,
                };
                for observer in &self.observers {
                    observer.on_ai_script_chosen(&chosen);
                }
                Ok(false)
            }
            ExecutionBackend::SpawnActor(config) => {
                let mut spawn_env = SpawnEnv {
                    scene: &mut *env.scene,
                    world: env.world,
                    content: env.content,
                    trace_presets: &self.trace_presets,
                    kem_presets: &self.kem_presets,
                    debug_slot: Some(&self.debug_slot),
                };
                let (outcome, used_omnitrace) = execute_spawn_actor(
                    &mut spawn_env,
                    definition,
                    config,
                    context,
                    anchor.map(|a| a.transform),
                )
                .map_err(|e| e.to_string())?;
                match outcome {
                    SpawnOutcome::Active(helper) => {
                        self.active_helper = Some(helper);
                    }
                    SpawnOutcome::EndedImmediately => {
                        self.notify_execution_ended(env.scene, false);
                    }
                }
                Ok(used_omnitrace)
            }
        }
    }

    fn finish_no_candidate(
        &mut self,
        context: &ExecutionContext,
        records: Vec<CandidateDebugRecord>,
        source_label: &str,
        evaluated: &[Evaluated],
    ) {
        log::debug!(
            "request '{}': no accepted candidate out of {}",
            source_label,
            records.len()
        );

        // Distance-gated fallback montage.
        if let Some(montage) = &self.settings.fallback_montage {
            if context.distance() <= self.settings.fallback_trigger_distance {
                for observer in &self.observers {
                    observer.on_fallback_montage(context.instigator, montage);
                }
            }
        }

        let snapshot = SelectionSnapshot {
            source_label: source_label.to_string(),
            selected_tag: None,
            candidates: records,
        };
        self.last_selection = Some(snapshot.clone());
        self.history.push(snapshot);

        self.broadcast_event(
            ExecutionEventKind::Failed,
            None,
            context.instigator,
            context.target,
            source_label,
        );

        // Telemetry carries the steps of the best-scoring rejected
        // candidate, ties keeping the earlier one.
        let steps = evaluated
            .iter()
            .max_by(|a, b| {
                a.final_score
                    .partial_cmp(&b.final_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.outcome.steps.clone())
            .unwrap_or_default();
        self.emit_telemetry(context, source_label, false, None, false, false, steps);
    }

    fn broadcast_event(
        &self,
        kind: ExecutionEventKind,
        execution_tag: Option<Tag>,
        instigator: ActorHandle,
        target: ActorHandle,
        source_label: &str,
    ) {
        let event = ExecutionEvent {
            kind,
            execution_tag,
            instigator,
            target,
            source_label: source_label.to_string(),
        };
        for observer in &self.observers {
            observer.on_execution_event(&event);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_telemetry(
        &self,
        context: &ExecutionContext,
        source_label: &str,
        accepted: bool,
        chosen_tag: Option<Tag>,
        used_anchor: bool,
        used_omnitrace: bool,
        steps: Vec<DecisionStep>,
    ) {
        if !self.settings.telemetry_enabled {
            return;
        }
        let record = TelemetryRecord {
            source_label: source_label.to_string(),
            accepted,
            chosen_tag,
            distance: context.distance(),
            facing_angle_degrees: context.facing_alignment_degrees(),
            height_delta: context.height_delta,
            stealth_tier: context.stealth.tier,
            used_anchor,
            used_omnitrace,
            steps,
        };
        for observer in &self.observers {
            observer.on_telemetry(&record);
        }
    }
}

/// One candidate after evaluation, with its anchor bonus applied.
struct Evaluated {
    definition: Arc<ExecutionDefinition>,
    outcome: EvaluationOutcome,
    final_score: f32,
    anchor_index: Option<usize>,
}
