//! Lifecycle events, chosen-backend records, and telemetry
//!
//! Observers register with the manager and receive every broadcast in
//! registration order, synchronously, with no suspension. All observer
//! methods default to no-ops so listeners implement only what they
//! consume (the mission director, for one, only cares about
//! `on_execution_event`).

use umbra_core::Tag;
use umbra_math::{Transform, Vec3};
use umbra_scene::ActorHandle;

use crate::content::AssetId;
use crate::stealth::StealthTier;

/// Lifecycle stage of an execution request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEventKind {
    /// A candidate was selected and dispatch began
    Started,
    /// The execution finished successfully
    Succeeded,
    /// The execution failed or no candidate was accepted
    Failed,
}

/// A lifecycle event broadcast to observers
#[derive(Debug, Clone)]
pub struct ExecutionEvent {
    /// Lifecycle stage
    pub kind: ExecutionEventKind,
    /// Tag of the execution involved, when one was selected
    pub execution_tag: Option<Tag>,
    /// Requesting actor
    pub instigator: ActorHandle,
    /// Target actor
    pub target: ActorHandle,
    /// Free-form label identifying the requester
    pub source_label: String,
}

/// Payload when a CAS execution is chosen.
///
/// Playback is the consumer's responsibility; the engine only selects
/// and resolves.
#[derive(Debug, Clone)]
pub struct CasChosen {
    /// Tag of the chosen execution
    pub execution_tag: Tag,
    /// Resolved scene asset
    pub scene: AssetId,
    /// Section to start playback in
    pub section: String,
    /// Role the instigator binds to
    pub instigator_role: String,
    /// Role the target binds to
    pub target_role: String,
    /// Authored instigator entry transform, world space
    pub instigator_entry: Transform,
    /// Authored target entry transform, world space
    pub target_entry: Transform,
    /// Computed warp target the instigator aligns to
    pub warp_target: Transform,
    /// Actors involved
    pub instigator: ActorHandle,
    pub target: ActorHandle,
}

/// Payload when a level-sequence execution is chosen
#[derive(Debug, Clone)]
pub struct SequenceChosen {
    pub execution_tag: Tag,
    pub sequence: AssetId,
    pub instigator: ActorHandle,
    pub target: ActorHandle,
}

/// Payload when a retired AI-script execution is chosen
#[derive(Debug, Clone)]
pub struct AiScriptChosen {
    pub execution_tag: Tag,
    pub behavior_tag: Tag,
    pub instigator: ActorHandle,
    pub target: ActorHandle,
}

/// One named check inside a telemetry record
#[derive(Debug, Clone)]
pub struct DecisionStep {
    /// Step name ("tags", "height", "backend", "ability", "stealth")
    pub name: &'static str,
    /// Whether the step passed
    pub passed: bool,
    /// Numeric value the step measured, when meaningful
    pub value: f32,
}

/// Structured per-request decision record
#[derive(Debug, Clone)]
pub struct TelemetryRecord {
    /// Label identifying the requester
    pub source_label: String,
    /// Whether a candidate was dispatched
    pub accepted: bool,
    /// Tag of the chosen execution
    pub chosen_tag: Option<Tag>,
    /// Instigator-target distance at request time
    pub distance: f32,
    /// Facing alignment angle at request time, degrees
    pub facing_angle_degrees: f32,
    /// Height delta at request time
    pub height_delta: f32,
    /// Stealth tier at request time
    pub stealth_tier: StealthTier,
    /// Whether an anchor contributed to the chosen candidate
    pub used_anchor: bool,
    /// Whether a spatial probe refined the spawn transform
    pub used_omnitrace: bool,
    /// Named decision steps for the decisive candidate
    pub steps: Vec<DecisionStep>,
}

/// Observer interface for everything the engine broadcasts.
pub trait ExecutionObserver: Send + Sync {
    /// Lifecycle events (started / succeeded / failed)
    fn on_execution_event(&self, _event: &ExecutionEvent) {}
    /// A CAS execution was chosen
    fn on_cas_chosen(&self, _chosen: &CasChosen) {}
    /// A level-sequence execution was chosen
    fn on_sequence_chosen(&self, _chosen: &SequenceChosen) {}
    /// A retired AI-script execution was chosen
    fn on_ai_script_chosen(&self, _chosen: &AiScriptChosen) {}
    /// No candidate was accepted and the fallback montage triggered
    fn on_fallback_montage(&self, _instigator: ActorHandle, _montage: &AssetId) {}
    /// A structured decision record was emitted
    fn on_telemetry(&self, _record: &TelemetryRecord) {}
}

/// Dispatcher for tag-addressed gameplay effects.
pub trait FxDispatcher: Send + Sync {
    /// Trigger an effect by tag at a world location
    fn trigger(&self, tag: &Tag, location: Vec3);
}
