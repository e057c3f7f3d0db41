//! Actors and the scene registry

use std::collections::HashMap;

use umbra_core::{Handle, HandleMap, TagSet};
use umbra_math::{Transform, Vec3};

/// Handle to an actor in a [`SceneRegistry`].
pub type ActorHandle = Handle<Actor>;

/// A world object: transform, tags, and motion-warp target slots.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    /// Display name, used by debug records.
    pub name: String,
    /// World transform.
    pub transform: Transform,
    /// Gameplay tags carried by this actor.
    pub tags: TagSet,
    /// Named motion-warp targets set by execution backends and consumed
    /// by animation playback.
    pub warp_targets: HashMap<String, Transform>,
}

impl Actor {
    /// Create a named actor at a transform.
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            tags: TagSet::new(),
            warp_targets: HashMap::new(),
        }
    }

    /// Add a tag (builder pattern).
    pub fn with_tag(mut self, tag: impl Into<umbra_core::Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// Registry of live actors.
#[derive(Default)]
pub struct SceneRegistry {
    actors: HandleMap<Actor>,
}

impl SceneRegistry {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            actors: HandleMap::new(),
        }
    }

    /// Spawn an actor, returning its handle.
    pub fn spawn(&mut self, actor: Actor) -> ActorHandle {
        self.actors.insert(actor)
    }

    /// Despawn an actor. Stale handles are ignored.
    pub fn despawn(&mut self, handle: ActorHandle) -> Option<Actor> {
        self.actors.remove(handle)
    }

    /// Whether the handle refers to a live actor.
    pub fn is_valid(&self, handle: ActorHandle) -> bool {
        self.actors.contains(handle)
    }

    /// Borrow an actor.
    pub fn get(&self, handle: ActorHandle) -> Option<&Actor> {
        self.actors.get(handle)
    }

    /// Mutably borrow an actor.
    pub fn get_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        self.actors.get_mut(handle)
    }

    /// World location of an actor, if live.
    pub fn location(&self, handle: ActorHandle) -> Option<Vec3> {
        self.get(handle).map(|a| a.transform.position)
    }

    /// Forward vector of an actor, if live.
    pub fn forward(&self, handle: ActorHandle) -> Option<Vec3> {
        self.get(handle).map(|a| a.transform.forward())
    }

    /// Set a named motion-warp target on an actor.
    ///
    /// Returns false when the handle is stale.
    pub fn set_warp_target(
        &mut self,
        handle: ActorHandle,
        name: impl Into<String>,
        target: Transform,
    ) -> bool {
        match self.get_mut(handle) {
            Some(actor) => {
                actor.warp_targets.insert(name.into(), target);
                true
            }
            None => false,
        }
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Iterate live actors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ActorHandle, &Actor)> {
        self.actors.iter()
    }
}
