//! Per-request execution context

use umbra_core::TagSet;
use umbra_math::Vec3;
use umbra_scene::{ActorHandle, SceneRegistry};

use crate::stealth::{StealthProvider, StealthSnapshot};

/// Ephemeral snapshot of everything evaluation needs for one request.
///
/// Built fresh per request and discarded afterwards; definitions are
/// evaluated against this copy, not against the live scene.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Requesting actor
    pub instigator: ActorHandle,
    /// Target actor
    pub target: ActorHandle,
    /// Context tags supplied with the request
    pub context_tags: TagSet,
    /// Instigator world location at capture time
    pub instigator_location: Vec3,
    /// Instigator forward at capture time
    pub instigator_forward: Vec3,
    /// Target world location at capture time
    pub target_location: Vec3,
    /// Target forward at capture time
    pub target_forward: Vec3,
    /// `target.y - instigator.y`
    pub height_delta: f32,
    /// Copied global stealth state
    pub stealth: StealthSnapshot,
}

impl ExecutionContext {
    /// Capture a context for an instigator/target pair.
    ///
    /// Returns `None` when either handle is stale.
    pub fn capture(
        scene: &SceneRegistry,
        stealth: &dyn StealthProvider,
        instigator: ActorHandle,
        target: ActorHandle,
        context_tags: TagSet,
    ) -> Option<Self> {
        let instigator_actor = scene.get(instigator)?;
        let target_actor = scene.get(target)?;

        let instigator_location = instigator_actor.transform.position;
        let target_location = target_actor.transform.position;

        Some(Self {
            instigator,
            target,
            context_tags,
            instigator_location,
            instigator_forward: instigator_actor.transform.forward(),
            target_location,
            target_forward: target_actor.transform.forward(),
            height_delta: target_location.y - instigator_location.y,
            stealth: stealth.snapshot(),
        })
    }

    /// Instigator-target distance
    pub fn distance(&self) -> f32 {
        self.instigator_location.distance(self.target_location)
    }

    /// Squared instigator-target distance
    pub fn distance_squared(&self) -> f32 {
        self.instigator_location.distance_squared(self.target_location)
    }

    /// Alignment angle between the two actors' forwards, degrees
    pub fn facing_alignment_degrees(&self) -> f32 {
        self.instigator_forward
            .angle_to_degrees(self.target_forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stealth::FixedStealthProvider;
    use umbra_math::{Quat, Transform};
    use umbra_scene::Actor;

    #[test]
    fn capture_snapshots_geometry() {
        let mut scene = SceneRegistry::new();
        let instigator = scene.spawn(Actor::new(
            "player",
            Transform::from_position_rotation(Vec3::ZERO, Quat::facing(Vec3::X)),
        ));
        let target = scene.spawn(Actor::new(
            "guard",
            Transform::from_position_rotation(Vec3::new(100.0, 30.0, 0.0), Quat::facing(Vec3::X)),
        ));

        let context = ExecutionContext::capture(
            &scene,
            &FixedStealthProvider::default(),
            instigator,
            target,
            TagSet::new(),
        )
        .expect("both actors live");

        assert!((context.distance() - 104.403).abs() < 0.01);
        assert!((context.height_delta - 30.0).abs() < 1e-4);
        assert!(context.facing_alignment_degrees() < 1e-3);
    }

    #[test]
    fn capture_fails_on_stale_handles() {
        let mut scene = SceneRegistry::new();
        let instigator = scene.spawn(Actor::new("player", Transform::IDENTITY));
        let target = scene.spawn(Actor::new("guard", Transform::IDENTITY));
        scene.despawn(target);

        assert!(ExecutionContext::capture(
            &scene,
            &FixedStealthProvider::default(),
            instigator,
            target,
            TagSet::new(),
        )
        .is_none());
    }
}
