//! Execution definitions
//!
//! An [`ExecutionDefinition`] is authored content describing one selectable
//! kill execution: the constraints gating it, the backend that plays it,
//! and the warp points that align the actors. Definitions are immutable
//! once registered; the selection engine only ever reads them.

use serde::{Deserialize, Serialize};
use umbra_core::{Tag, TagSet};
use umbra_math::{Transform, Vec2};
use umbra_scene::{ActorHandle, SceneRegistry};

use crate::content::AssetId;

/// Canonical relative-position tags.
pub mod position {
    use umbra_core::Tag;

    pub const GROUND_REAR: &str = "Execution.Position.Ground.Rear";
    pub const GROUND_FRONT: &str = "Execution.Position.Ground.Front";
    pub const GROUND_LEFT: &str = "Execution.Position.Ground.Left";
    pub const GROUND_RIGHT: &str = "Execution.Position.Ground.Right";
    pub const VERTICAL_ABOVE: &str = "Execution.Position.Vertical.Above";
    pub const VERTICAL_BELOW: &str = "Execution.Position.Vertical.Below";
    pub const CORNER_LEFT: &str = "Execution.Position.Corner.Left";
    pub const CORNER_RIGHT: &str = "Execution.Position.Corner.Right";
    pub const SPECIAL: &str = "Execution.Position.Special";

    /// All canonical position tags, for coverage reporting.
    pub fn all() -> Vec<Tag> {
        [
            GROUND_REAR,
            GROUND_FRONT,
            GROUND_LEFT,
            GROUND_RIGHT,
            VERTICAL_ABOVE,
            VERTICAL_BELOW,
            CORNER_LEFT,
            CORNER_RIGHT,
            SPECIAL,
        ]
        .iter()
        .map(Tag::new)
        .collect()
    }
}

/// Spatial family of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionFamily {
    GroundRear,
    GroundFront,
    GroundLeft,
    GroundRight,
    VerticalAbove,
    VerticalBelow,
    CornerLeft,
    CornerRight,
    Special,
    Unknown,
}

impl ExecutionFamily {
    /// The canonical position tag for this family, when one exists.
    pub fn position_tag(&self) -> Option<Tag> {
        let path = match self {
            Self::GroundRear => position::GROUND_REAR,
            Self::GroundFront => position::GROUND_FRONT,
            Self::GroundLeft => position::GROUND_LEFT,
            Self::GroundRight => position::GROUND_RIGHT,
            Self::VerticalAbove => position::VERTICAL_ABOVE,
            Self::VerticalBelow => position::VERTICAL_BELOW,
            Self::CornerLeft => position::CORNER_LEFT,
            Self::CornerRight => position::CORNER_RIGHT,
            Self::Special => position::SPECIAL,
            Self::Unknown => return None,
        };
        Some(Tag::new(path))
    }
}

impl Default for ExecutionFamily {
    fn default() -> Self {
        Self::Unknown
    }
}

/// How the height delta between instigator and target is gated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightMode {
    /// `|height delta|` must stay within the same-plane threshold
    SamePlaneOnly,
    /// `|height delta|` must reach at least the same-plane threshold
    VerticalOnly,
    /// No height constraint
    Any,
}

impl Default for HeightMode {
    fn default() -> Self {
        Self::Any
    }
}

/// Authored warp-offset applied relative to the target's transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpOffsetConfig {
    /// Offset local to the target's transform
    pub local_offset: Transform,
    /// Maximum distance the instigator may warp to reach the target point
    pub max_warp_distance: f32,
}

impl Default for WarpOffsetConfig {
    fn default() -> Self {
        Self {
            local_offset: Transform::IDENTITY,
            max_warp_distance: 250.0,
        }
    }
}

/// Contextual-animation-scene backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasConfig {
    /// The animation scene to play
    pub scene: AssetId,
    /// Scene section to start in
    pub section: String,
    /// Minimum instigator-target distance
    pub min_distance: f32,
    /// Maximum instigator-target distance
    pub max_distance: f32,
    /// Maximum alignment angle between the actors' forwards, degrees
    pub max_facing_angle_degrees: f32,
    /// Warp offset used to compute the instigator entry point
    pub offset: WarpOffsetConfig,
}

/// Level-sequence backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// The sequence asset to play
    pub sequence: AssetId,
}

/// Retired AI-script backend parameters. Kept for content compatibility;
/// only the existence of the behavior tag is validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiScriptConfig {
    /// Behavior tag the retired backend used to dispatch on
    pub behavior_tag: Option<Tag>,
}

/// Tuning overrides for the spawn-actor spatial probe
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatternTuning {
    /// Rays in the probe cone
    pub ray_count: u32,
    /// Full cone angle in degrees
    pub cone_angle_degrees: f32,
}

impl Default for PatternTuning {
    fn default() -> Self {
        Self {
            ray_count: 11,
            cone_angle_degrees: 45.0,
        }
    }
}

/// Spawn-actor backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnActorConfig {
    /// Helper template to instantiate
    pub helper_class: AssetId,
    /// Montage pair the helper plays
    pub execution_data: AssetId,
    /// Refine the spawn transform with a spatial probe
    pub use_omnitrace_warp: bool,
    /// Preset-library entry driving the probe, when set
    pub pattern_entry: Option<String>,
    /// Probe tuning overrides
    pub pattern_tuning: Option<PatternTuning>,
    /// Free-form pattern tag for content predating the preset library;
    /// mapped by substring matching
    pub legacy_pattern_tag: Option<String>,
}

/// Backend an execution dispatches to, with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionBackend {
    /// Two-actor synchronized animation scene
    Cas(CasConfig),
    /// Cinematic sequence
    LevelSequence(SequenceConfig),
    /// Spawned helper actor driving montages
    SpawnActor(SpawnActorConfig),
    /// Retired scripted backend
    AiScript(AiScriptConfig),
}

impl ExecutionBackend {
    /// Short name for logs and coverage reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Cas(_) => "CAS",
            Self::LevelSequence(_) => "LevelSequence",
            Self::SpawnActor(_) => "SpawnActor",
            Self::AiScript(_) => "AiScript",
        }
    }
}

/// Which actor's transform a warp point is authored relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarpFrame {
    Instigator,
    Target,
}

/// An authored warp point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpPoint {
    /// Name the motion-warp system binds to
    pub name: String,
    /// Reference frame
    pub frame: WarpFrame,
    /// Offset local to the frame actor's transform
    pub local_offset: Transform,
    /// Maximum distance the instigator may warp to reach this point
    pub max_warp_distance: f32,
}

/// Ability requirements gating a definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AbilityGate {
    /// Inline list of required ability tags
    Inline(Vec<Tag>),
    /// A named requirement set resolved through the content registry
    Library(AssetId),
}

/// One selectable kill execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDefinition {
    /// Unique semantic id
    pub execution_tag: Tag,
    /// Context tags the request must carry
    pub required_context_tags: TagSet,
    /// Context tags that disqualify the request
    pub blocked_context_tags: TagSet,
    /// Spatial family
    pub family: ExecutionFamily,
    /// Primary position tag
    pub position_tag: Option<Tag>,
    /// Additional position tags this execution also satisfies
    pub additional_position_tags: TagSet,
    /// Height gating mode
    pub height_mode: HeightMode,
    /// Threshold separating same-plane from vertical, in world units
    pub same_plane_height_delta: f32,
    /// Base selection score
    pub base_score: f32,
    /// Backend and its parameters
    pub backend: ExecutionBackend,
    /// Optional ability gate
    pub ability_gate: Option<AbilityGate>,
    /// Reject when the global stealth score exceeds this
    pub max_global_stealth_score01: f32,
    /// Shadow level where the shadow score bonus starts
    pub min_shadow_level01: f32,
    /// FX tag broadcast when this execution starts
    pub fx_tag: Option<Tag>,
    /// Authored warp points
    pub warp_points: Vec<WarpPoint>,
}

impl ExecutionDefinition {
    /// A minimal definition for the given tag and backend. Authored
    /// content overrides the rest field by field.
    pub fn new(execution_tag: impl Into<Tag>, backend: ExecutionBackend) -> Self {
        Self {
            execution_tag: execution_tag.into(),
            required_context_tags: TagSet::new(),
            blocked_context_tags: TagSet::new(),
            family: ExecutionFamily::Unknown,
            position_tag: None,
            additional_position_tags: TagSet::new(),
            height_mode: HeightMode::Any,
            same_plane_height_delta: 40.0,
            base_score: 1.0,
            backend,
            ability_gate: None,
            max_global_stealth_score01: 1.0,
            min_shadow_level01: 0.0,
            fx_tag: None,
            warp_points: Vec::new(),
        }
    }

    /// Short display name for debug records
    pub fn display_name(&self) -> &str {
        self.execution_tag.path()
    }

    /// Every position tag this definition satisfies, primary first.
    pub fn position_tags(&self) -> impl Iterator<Item = &Tag> {
        self.position_tag
            .iter()
            .chain(self.additional_position_tags.iter())
    }

    /// Resolve an authored warp point into a world transform.
    ///
    /// `enforce_distance` applies the warp point's distance gate against
    /// the instigator; existence probes pass `false`.
    pub fn resolve_warp_point_by_name(
        &self,
        name: &str,
        scene: &SceneRegistry,
        instigator: ActorHandle,
        target: ActorHandle,
        enforce_distance: bool,
    ) -> Option<Transform> {
        let point = self.warp_points.iter().find(|wp| wp.name == name)?;
        let frame_actor = match point.frame {
            WarpFrame::Instigator => instigator,
            WarpFrame::Target => target,
        };
        let frame = scene.get(frame_actor)?.transform;
        let world = frame.combine(&point.local_offset);

        if enforce_distance {
            let instigator_location = scene.location(instigator)?;
            if instigator_location.distance(world.position) > point.max_warp_distance {
                return None;
            }
        }
        Some(world)
    }
}

/// Derive a ground-relative offset direction from a position tag.
///
/// The pair weights the target's forward (x) and right (y) axes:
/// rear is `(-1, 0)`, front `(1, 0)`, left `(0, -1)`, right `(0, 1)`.
pub fn ground_offset_for_tag(tag: &Tag) -> Option<Vec2> {
    match tag.path() {
        position::GROUND_REAR => Some(Vec2::new(-1.0, 0.0)),
        position::GROUND_FRONT => Some(Vec2::new(1.0, 0.0)),
        position::GROUND_LEFT => Some(Vec2::new(0.0, -1.0)),
        position::GROUND_RIGHT => Some(Vec2::new(0.0, 1.0)),
        position::CORNER_LEFT => Some(Vec2::new(-1.0, -1.0)),
        position::CORNER_RIGHT => Some(Vec2::new(-1.0, 1.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_math::{Quat, Vec3};
    use umbra_scene::Actor;

    fn spawn_actor(scene: &mut SceneRegistry, position: Vec3, facing: Vec3) -> ActorHandle {
        scene.spawn(Actor::new(
            "actor",
            Transform::from_position_rotation(position, Quat::facing(facing)),
        ))
    }

    fn cas_definition() -> ExecutionDefinition {
        ExecutionDefinition::new(
            "Execution.Takedown.Rear",
            ExecutionBackend::Cas(CasConfig {
                scene: AssetId::new("Scenes/Takedown_Rear"),
                section: "Default".into(),
                min_distance: 0.0,
                max_distance: 200.0,
                max_facing_angle_degrees: 60.0,
                offset: WarpOffsetConfig::default(),
            }),
        )
    }

    #[test]
    fn family_maps_to_canonical_tags() {
        assert_eq!(
            ExecutionFamily::GroundRear.position_tag().unwrap().path(),
            position::GROUND_REAR
        );
        assert!(ExecutionFamily::Unknown.position_tag().is_none());
    }

    #[test]
    fn warp_point_resolves_in_target_frame() {
        let mut scene = SceneRegistry::new();
        let instigator = spawn_actor(&mut scene, Vec3::ZERO, Vec3::X);
        let target = spawn_actor(&mut scene, Vec3::new(100.0, 0.0, 0.0), Vec3::X);

        let mut definition = cas_definition();
        definition.warp_points.push(WarpPoint {
            name: "Entry".into(),
            frame: WarpFrame::Target,
            // One unit behind the target along its forward.
            local_offset: Transform::from_position(Vec3::new(0.0, 0.0, 1.0)),
            max_warp_distance: 500.0,
        });

        let resolved = definition
            .resolve_warp_point_by_name("Entry", &scene, instigator, target, true)
            .expect("warp point resolves");
        // Target faces +X, so local +Z (behind) lands at x = 99.
        assert!((resolved.position.x - 99.0).abs() < 1e-3);
    }

    #[test]
    fn warp_point_distance_gate() {
        let mut scene = SceneRegistry::new();
        let instigator = spawn_actor(&mut scene, Vec3::ZERO, Vec3::X);
        let target = spawn_actor(&mut scene, Vec3::new(1000.0, 0.0, 0.0), Vec3::X);

        let mut definition = cas_definition();
        definition.warp_points.push(WarpPoint {
            name: "Entry".into(),
            frame: WarpFrame::Target,
            local_offset: Transform::IDENTITY,
            max_warp_distance: 100.0,
        });

        assert!(definition
            .resolve_warp_point_by_name("Entry", &scene, instigator, target, true)
            .is_none());
        // Existence probe bypasses the gate.
        assert!(definition
            .resolve_warp_point_by_name("Entry", &scene, instigator, target, false)
            .is_some());
    }

    #[test]
    fn unknown_warp_point_is_none() {
        let mut scene = SceneRegistry::new();
        let instigator = spawn_actor(&mut scene, Vec3::ZERO, Vec3::X);
        let target = spawn_actor(&mut scene, Vec3::new(10.0, 0.0, 0.0), Vec3::X);
        let definition = cas_definition();

        assert!(definition
            .resolve_warp_point_by_name("Missing", &scene, instigator, target, false)
            .is_none());
    }

    #[test]
    fn ground_offsets_for_canonical_tags() {
        assert_eq!(
            ground_offset_for_tag(&Tag::new(position::GROUND_REAR)),
            Some(Vec2::new(-1.0, 0.0))
        );
        assert_eq!(
            ground_offset_for_tag(&Tag::new(position::GROUND_RIGHT)),
            Some(Vec2::new(0.0, 1.0))
        );
        assert_eq!(ground_offset_for_tag(&Tag::new(position::VERTICAL_ABOVE)), None);
    }

    #[test]
    fn definition_round_trips_through_json() {
        let definition = cas_definition();
        let json = serde_json::to_string(&definition).unwrap();
        let back: ExecutionDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.execution_tag, definition.execution_tag);
        assert_eq!(back.backend.kind_name(), "CAS");
    }
}
