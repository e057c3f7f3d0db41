//! Content registry
//!
//! Authored assets are registered once at load time under interned ids
//! and are immutable afterwards. Resolution returns a `Result`; a missing
//! asset is an ordinary candidate-rejection condition for the selection
//! engine, never a panic.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use umbra_core::Tag;
use umbra_math::Transform;

use crate::definition::ExecutionDefinition;

/// Interned asset identifier (FNV hash of the authored name).
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AssetId {
    name: Arc<str>,
    hash: u64,
}

impl AssetId {
    /// Intern an asset name.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let mut hash = 0xcbf29ce484222325u64;
        for byte in name.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        Self {
            name: Arc::from(name),
            hash,
        }
    }

    /// The authored name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for AssetId {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for AssetId {}

impl Hash for AssetId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.name)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<String> for AssetId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.name.to_string()
    }
}

impl From<&str> for AssetId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Content resolution failure
#[derive(Debug, Error)]
pub enum ContentError {
    /// No asset of the requested kind under this id
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Result type for content resolution
pub type ContentResult<T> = std::result::Result<T, ContentError>;

/// A two-actor synchronized animation scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimScene {
    /// Scene name
    pub name: String,
    /// Named playback sections
    pub sections: Vec<String>,
    /// Role name the instigator binds to
    pub instigator_role: String,
    /// Role name the target binds to
    pub target_role: String,
    /// Authored instigator entry transform, local to the scene pivot
    pub instigator_entry: Transform,
    /// Authored target entry transform, local to the scene pivot
    pub target_entry: Transform,
}

/// A single-actor animation montage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Montage {
    /// Montage name
    pub name: String,
    /// Playback length in seconds
    pub length_seconds: f32,
}

/// A cinematic level sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSequence {
    /// Sequence name
    pub name: String,
    /// Playback duration in seconds
    pub duration_seconds: f32,
}

/// Montage pair a spawn-actor execution plays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionData {
    /// Montage played on the instigator; required for a valid execution
    pub instigator_montage: Option<AssetId>,
    /// Montage played on the target; optional
    pub target_montage: Option<AssetId>,
}

/// Template the spawn-actor backend instantiates its helper from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperClass {
    /// Class name; helper actors are named after it
    pub name: String,
}

/// Registry of loaded content, keyed by [`AssetId`].
#[derive(Default)]
pub struct ContentRegistry {
    scenes: HashMap<AssetId, AnimScene>,
    montages: HashMap<AssetId, Montage>,
    sequences: HashMap<AssetId, LevelSequence>,
    execution_data: HashMap<AssetId, ExecutionData>,
    helper_classes: HashMap<AssetId, HelperClass>,
    definitions: HashMap<AssetId, Arc<ExecutionDefinition>>,
    ability_sets: HashMap<AssetId, Vec<Tag>>,
}

impl ContentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an animation scene
    pub fn register_scene(&mut self, id: AssetId, scene: AnimScene) {
        self.scenes.insert(id, scene);
    }

    /// Register a montage
    pub fn register_montage(&mut self, id: AssetId, montage: Montage) {
        self.montages.insert(id, montage);
    }

    /// Register a level sequence
    pub fn register_sequence(&mut self, id: AssetId, sequence: LevelSequence) {
        self.sequences.insert(id, sequence);
    }

    /// Register execution data
    pub fn register_execution_data(&mut self, id: AssetId, data: ExecutionData) {
        self.execution_data.insert(id, data);
    }

    /// Register a helper class
    pub fn register_helper_class(&mut self, id: AssetId, class: HelperClass) {
        self.helper_classes.insert(id, class);
    }

    /// Register a soft-referenced execution definition
    pub fn register_definition(&mut self, id: AssetId, definition: Arc<ExecutionDefinition>) {
        self.definitions.insert(id, definition);
    }

    /// Register a named ability-requirement set
    pub fn register_ability_set(&mut self, id: AssetId, abilities: Vec<Tag>) {
        self.ability_sets.insert(id, abilities);
    }

    /// Resolve an animation scene
    pub fn resolve_scene(&self, id: &AssetId) -> ContentResult<&AnimScene> {
        self.scenes.get(id).ok_or_else(|| ContentError::NotFound {
            kind: "AnimScene",
            id: id.to_string(),
        })
    }

    /// Resolve a montage
    pub fn resolve_montage(&self, id: &AssetId) -> ContentResult<&Montage> {
        self.montages.get(id).ok_or_else(|| ContentError::NotFound {
            kind: "Montage",
            id: id.to_string(),
        })
    }

    /// Resolve a level sequence
    pub fn resolve_sequence(&self, id: &AssetId) -> ContentResult<&LevelSequence> {
        self.sequences
            .get(id)
            .ok_or_else(|| ContentError::NotFound {
                kind: "LevelSequence",
                id: id.to_string(),
            })
    }

    /// Resolve execution data
    pub fn resolve_execution_data(&self, id: &AssetId) -> ContentResult<&ExecutionData> {
        self.execution_data
            .get(id)
            .ok_or_else(|| ContentError::NotFound {
                kind: "ExecutionData",
                id: id.to_string(),
            })
    }

    /// Resolve a helper class
    pub fn resolve_helper_class(&self, id: &AssetId) -> ContentResult<&HelperClass> {
        self.helper_classes
            .get(id)
            .ok_or_else(|| ContentError::NotFound {
                kind: "HelperClass",
                id: id.to_string(),
            })
    }

    /// Resolve a soft-referenced definition
    pub fn resolve_definition(&self, id: &AssetId) -> ContentResult<Arc<ExecutionDefinition>> {
        self.definitions
            .get(id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                kind: "ExecutionDefinition",
                id: id.to_string(),
            })
    }

    /// Resolve an ability-requirement set
    pub fn resolve_ability_set(&self, id: &AssetId) -> ContentResult<&[Tag]> {
        self.ability_sets
            .get(id)
            .map(|v| v.as_slice())
            .ok_or_else(|| ContentError::NotFound {
                kind: "AbilitySet",
                id: id.to_string(),
            })
    }

    /// Montage length in seconds, or 0 when the reference is unset or
    /// unresolved.
    pub fn montage_length(&self, id: Option<&AssetId>) -> f32 {
        id.and_then(|id| self.montages.get(id))
            .map(|m| m.length_seconds)
            .unwrap_or(0.0)
    }
}
