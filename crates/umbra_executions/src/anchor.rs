//! Execution anchors
//!
//! Anchors are placed world markers that bias selection toward a family
//! or position and give the spawn-actor backend a hand-placed transform
//! to anchor on. They are registered against scene actors; discovery
//! applies the radius rules per request.

use serde::{Deserialize, Serialize};
use umbra_core::Tag;
use umbra_math::{Transform, Vec3};
use umbra_scene::{ActorHandle, SceneRegistry};

use crate::config::KemSettings;
use crate::definition::ExecutionDefinition;

/// Marker data registered against an anchor actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorMarker {
    /// Position tag this anchor represents
    pub position_tag: Option<Tag>,
    /// Execution family this anchor represents
    pub family: crate::definition::ExecutionFamily,
    /// Usable radius around the anchor
    pub radius: f32,
}

impl AnchorMarker {
    /// Marker for a family with a usable radius
    pub fn for_family(family: crate::definition::ExecutionFamily, radius: f32) -> Self {
        Self {
            position_tag: family.position_tag(),
            family,
            radius,
        }
    }
}

/// An anchor found near the current request
#[derive(Debug, Clone)]
pub struct NearbyAnchor {
    /// Anchor actor
    pub actor: ActorHandle,
    /// Marker data
    pub marker: AnchorMarker,
    /// Anchor world transform at discovery time
    pub transform: Transform,
}

/// Find anchors usable for a request.
///
/// An anchor qualifies when it sits within the configured search radius
/// of the instigator or the target, and the nearer of the two is inside
/// the anchor's own usable radius.
pub fn discover_nearby(
    scene: &SceneRegistry,
    anchors: &[(ActorHandle, AnchorMarker)],
    instigator_location: Vec3,
    target_location: Vec3,
    settings: &KemSettings,
) -> Vec<NearbyAnchor> {
    let mut nearby = Vec::new();
    for (handle, marker) in anchors {
        let Some(actor) = scene.get(*handle) else {
            continue;
        };
        let position = actor.transform.position;
        let closest = position
            .distance(instigator_location)
            .min(position.distance(target_location));
        if closest <= settings.anchor_search_radius && closest <= marker.radius {
            nearby.push(NearbyAnchor {
                actor: *handle,
                marker: marker.clone(),
                transform: actor.transform,
            });
        }
    }
    nearby
}

/// Score bonus an anchor set grants a definition.
///
/// Exact position-tag match beats family match; the best bonus across
/// all nearby anchors wins, and the matching anchor rides along to the
/// backend dispatch.
pub fn best_bonus<'a>(
    definition: &ExecutionDefinition,
    nearby: &'a [NearbyAnchor],
    settings: &KemSettings,
) -> (f32, Option<&'a NearbyAnchor>) {
    let mut best = 0.0f32;
    let mut best_anchor = None;
    for anchor in nearby {
        let bonus = anchor_bonus(definition, anchor, settings);
        if bonus > best {
            best = bonus;
            best_anchor = Some(anchor);
        }
    }
    (best, best_anchor)
}

fn anchor_bonus(
    definition: &ExecutionDefinition,
    anchor: &NearbyAnchor,
    settings: &KemSettings,
) -> f32 {
    if let (Some(anchor_tag), Some(definition_tag)) =
        (&anchor.marker.position_tag, &definition.position_tag)
    {
        if anchor_tag == definition_tag {
            return settings.anchor_tag_bonus;
        }
    }
    if anchor.marker.family == definition.family
        && definition.family != crate::definition::ExecutionFamily::Unknown
    {
        return settings.anchor_family_bonus;
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AiScriptConfig, ExecutionBackend, ExecutionFamily};
    use umbra_scene::Actor;

    fn definition_with_family(family: ExecutionFamily) -> ExecutionDefinition {
        let mut definition = ExecutionDefinition::new(
            "Execution.Test",
            ExecutionBackend::AiScript(AiScriptConfig {
                behavior_tag: Some(Tag::new("Behavior.Test")),
            }),
        );
        definition.family = family;
        definition.position_tag = family.position_tag();
        definition
    }

    fn anchor_at(
        scene: &mut SceneRegistry,
        position: Vec3,
        family: ExecutionFamily,
        radius: f32,
    ) -> (ActorHandle, AnchorMarker) {
        let handle = scene.spawn(Actor::new("anchor", Transform::from_position(position)));
        (handle, AnchorMarker::for_family(family, radius))
    }

    #[test]
    fn discovery_respects_both_radii() {
        let mut scene = SceneRegistry::new();
        let settings = KemSettings::default();
        let anchors = vec![
            anchor_at(&mut scene, Vec3::new(50.0, 0.0, 0.0), ExecutionFamily::GroundRear, 300.0),
            // Inside the search radius but outside its own usable radius.
            anchor_at(&mut scene, Vec3::new(80.0, 0.0, 0.0), ExecutionFamily::GroundFront, 10.0),
            // Outside the search radius.
            anchor_at(
                &mut scene,
                Vec3::new(5000.0, 0.0, 0.0),
                ExecutionFamily::GroundLeft,
                1000.0,
            ),
        ];

        let nearby = discover_nearby(
            &scene,
            &anchors,
            Vec3::ZERO,
            Vec3::new(100.0, 0.0, 0.0),
            &settings,
        );
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].marker.family, ExecutionFamily::GroundRear);
    }

    #[test]
    fn exact_tag_beats_family_match() {
        let mut scene = SceneRegistry::new();
        let settings = KemSettings::default();
        let anchors = vec![
            anchor_at(&mut scene, Vec3::new(10.0, 0.0, 0.0), ExecutionFamily::GroundRear, 500.0),
        ];
        let nearby = discover_nearby(&scene, &anchors, Vec3::ZERO, Vec3::ZERO, &settings);

        let rear = definition_with_family(ExecutionFamily::GroundRear);
        let (bonus, anchor) = best_bonus(&rear, &nearby, &settings);
        assert_eq!(bonus, settings.anchor_tag_bonus);
        assert!(anchor.is_some());

        // Same family but a different position tag: family bonus only.
        let mut rear_variant = definition_with_family(ExecutionFamily::GroundRear);
        rear_variant.position_tag = Some(Tag::new("Execution.Position.Custom"));
        let (bonus, _) = best_bonus(&rear_variant, &nearby, &settings);
        assert_eq!(bonus, settings.anchor_family_bonus);

        // Unrelated definition: no bonus, no anchor.
        let front = definition_with_family(ExecutionFamily::GroundFront);
        let (bonus, anchor) = best_bonus(&front, &nearby, &settings);
        assert_eq!(bonus, 0.0);
        assert!(anchor.is_none());
    }

    #[test]
    fn stale_anchor_actors_are_skipped() {
        let mut scene = SceneRegistry::new();
        let settings = KemSettings::default();
        let (handle, marker) =
            anchor_at(&mut scene, Vec3::ZERO, ExecutionFamily::GroundRear, 500.0);
        scene.despawn(handle);

        let nearby = discover_nearby(
            &scene,
            &[(handle, marker)],
            Vec3::ZERO,
            Vec3::ZERO,
            &settings,
        );
        assert!(nearby.is_empty());
    }
}
