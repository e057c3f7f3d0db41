//! Ability-requirement evaluation

use umbra_core::Tag;
use umbra_scene::{ActorHandle, SceneRegistry};

/// Evaluates whether an actor satisfies a set of required ability tags.
///
/// The live game wires its ability system in here; the default
/// implementation reads the actor's tag set.
pub trait AbilityEvaluator: Send + Sync {
    /// Whether `actor` has every ability in `required`
    fn has_abilities(&self, scene: &SceneRegistry, actor: ActorHandle, required: &[Tag]) -> bool;
}

/// Default evaluator: an actor has an ability when its tag set contains
/// the ability tag (hierarchically).
#[derive(Debug, Default, Clone, Copy)]
pub struct TagAbilityEvaluator;

impl AbilityEvaluator for TagAbilityEvaluator {
    fn has_abilities(&self, scene: &SceneRegistry, actor: ActorHandle, required: &[Tag]) -> bool {
        let Some(actor) = scene.get(actor) else {
            return false;
        };
        required.iter().all(|tag| actor.tags.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_math::Transform;
    use umbra_scene::Actor;

    #[test]
    fn tag_evaluator_reads_actor_tags() {
        let mut scene = SceneRegistry::new();
        let actor = scene.spawn(
            Actor::new("player", Transform::IDENTITY)
                .with_tag("Ability.Takedown.Silent")
                .with_tag("Ability.Climb"),
        );

        let evaluator = TagAbilityEvaluator;
        assert!(evaluator.has_abilities(
            &scene,
            actor,
            &[Tag::new("Ability.Takedown.Silent")]
        ));
        // Hierarchical containment counts.
        assert!(evaluator.has_abilities(&scene, actor, &[Tag::new("Ability.Takedown")]));
        assert!(!evaluator.has_abilities(&scene, actor, &[Tag::new("Ability.Vanish")]));
    }

    #[test]
    fn stale_actor_has_no_abilities() {
        let mut scene = SceneRegistry::new();
        let actor = scene.spawn(Actor::new("player", Transform::IDENTITY));
        scene.despawn(actor);
        assert!(!TagAbilityEvaluator.has_abilities(&scene, actor, &[]));
    }
}
