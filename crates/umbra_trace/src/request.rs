//! Trace request description
//!
//! A [`TraceRequest`] fully describes one pattern run: which geometric
//! family generates the rays, what shape each ray traces with, where the
//! pattern is anchored, and what it should ignore. Requests are plain
//! data; presets serialize them without the runtime actor fields.

use serde::{Deserialize, Serialize};
use umbra_math::{Quat, Transform, Vec3};
use umbra_physics::TraceChannel;
use umbra_scene::ActorHandle;

/// Geometric family of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternFamily {
    /// Rays fanned around the origin's forward direction
    Forward,
    /// Rays fanned across an arc toward a target
    Target,
    /// Rays fired outward from a ring around the center
    Orbit,
    /// Near-uniform directions over the full sphere
    Radial3D,
}

impl Default for PatternFamily {
    fn default() -> Self {
        Self::Forward
    }
}

/// Variant for the Forward family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardVariant {
    /// A single ray along forward
    SingleRay,
    /// `ray_count` rays spread across `spread_degrees`
    MultiSpread,
}

impl Default for ForwardVariant {
    fn default() -> Self {
        Self::SingleRay
    }
}

/// Shape each ray traces with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceShape {
    /// Zero-width ray
    Line,
    /// Swept sphere
    Sphere { radius: f32 },
    /// Swept box
    Box { half_extents: [f32; 3] },
    /// Swept capsule (Y-aligned)
    Capsule { radius: f32, half_height: f32 },
}

impl Default for TraceShape {
    fn default() -> Self {
        Self::Line
    }
}

/// Attachment origin: an actor plus a local offset transform
#[derive(Debug, Clone, Copy)]
pub struct Attachment {
    pub actor: ActorHandle,
    pub local: Transform,
}

/// Where a pattern is anchored.
///
/// Resolution priority: attachment, then actor, then the explicit
/// location/rotation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OriginSource {
    /// Attachment point on an actor (highest priority; runtime only)
    #[serde(skip, default)]
    pub attachment: Option<Attachment>,
    /// Origin actor (runtime only)
    #[serde(skip, default)]
    pub actor: Option<ActorHandle>,
    /// Explicit world location (lowest priority)
    pub location: Vec3,
    /// Explicit rotation used with the explicit location
    pub rotation: Quat,
}

impl OriginSource {
    /// Origin at an explicit location and rotation
    pub fn at(location: Vec3, rotation: Quat) -> Self {
        Self {
            attachment: None,
            actor: None,
            location,
            rotation,
        }
    }

    /// Origin at an actor
    pub fn actor(actor: ActorHandle) -> Self {
        Self {
            attachment: None,
            actor: Some(actor),
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    /// Origin attached to an actor with a local offset
    pub fn attached(actor: ActorHandle, local: Transform) -> Self {
        Self {
            attachment: Some(Attachment { actor, local }),
            actor: None,
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Optional pattern target.
///
/// Resolution priority: actor, then the explicit location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetSource {
    /// Target actor (runtime only)
    #[serde(skip, default)]
    pub actor: Option<ActorHandle>,
    /// Explicit target location
    pub location: Option<Vec3>,
}

impl TargetSource {
    /// No target
    pub fn none() -> Self {
        Self::default()
    }

    /// Target an actor
    pub fn actor(actor: ActorHandle) -> Self {
        Self {
            actor: Some(actor),
            location: None,
        }
    }

    /// Target an explicit location
    pub fn at(location: Vec3) -> Self {
        Self {
            actor: None,
            location: Some(location),
        }
    }

    /// Whether any target is set
    pub fn is_set(&self) -> bool {
        self.actor.is_some() || self.location.is_some()
    }
}

/// Debug-draw options for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugOptions {
    /// Record debug shapes for this request
    pub enabled: bool,
    /// Line/point color (RGBA)
    pub color: [f32; 4],
    /// Draw hit points as well as rays
    pub draw_hit_points: bool,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            color: [0.0, 1.0, 0.2, 1.0],
            draw_hit_points: true,
        }
    }
}

/// A complete pattern trace request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRequest {
    /// Pattern family
    pub family: PatternFamily,
    /// Forward-family variant
    pub forward_variant: ForwardVariant,
    /// Shape each ray traces with
    pub shape: TraceShape,
    /// Collision channel
    pub channel: TraceChannel,
    /// Ray length in world units; non-positive requests produce empty
    /// results
    pub max_distance: f32,
    /// Number of rays; zero produces an empty result
    pub ray_count: u32,
    /// Full spread for Forward/MultiSpread, in degrees
    pub spread_degrees: f32,
    /// Full arc for the Target family, in degrees
    pub arc_degrees: f32,
    /// Ring radius for the Orbit family
    pub orbit_radius: f32,
    /// Pattern anchor
    pub origin: OriginSource,
    /// Optional pattern target
    pub target: TargetSource,
    /// Actors every ray should ignore (runtime only)
    #[serde(skip, default)]
    pub ignore: Vec<ActorHandle>,
    /// Debug-draw options
    pub debug: DebugOptions,
}

impl Default for TraceRequest {
    fn default() -> Self {
        Self {
            family: PatternFamily::Forward,
            forward_variant: ForwardVariant::SingleRay,
            shape: TraceShape::Line,
            channel: TraceChannel::Visibility,
            max_distance: 1000.0,
            ray_count: 1,
            spread_degrees: 45.0,
            arc_degrees: 90.0,
            orbit_radius: 100.0,
            origin: OriginSource::default(),
            target: TargetSource::none(),
            ignore: Vec::new(),
            debug: DebugOptions::default(),
        }
    }
}

impl TraceRequest {
    /// A single forward ray from an explicit origin
    pub fn forward_ray(location: Vec3, rotation: Quat, max_distance: f32) -> Self {
        Self {
            origin: OriginSource::at(location, rotation),
            max_distance,
            ..Default::default()
        }
    }

    /// A forward cone of `ray_count` rays across `spread_degrees`
    pub fn forward_cone(ray_count: u32, spread_degrees: f32) -> Self {
        Self {
            forward_variant: ForwardVariant::MultiSpread,
            ray_count,
            spread_degrees,
            ..Default::default()
        }
    }

    /// Set the family (builder pattern)
    pub fn with_family(mut self, family: PatternFamily) -> Self {
        self.family = family;
        self
    }

    /// Set the shape (builder pattern)
    pub fn with_shape(mut self, shape: TraceShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the channel (builder pattern)
    pub fn with_channel(mut self, channel: TraceChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the origin (builder pattern)
    pub fn with_origin(mut self, origin: OriginSource) -> Self {
        self.origin = origin;
        self
    }

    /// Set the target (builder pattern)
    pub fn with_target(mut self, target: TargetSource) -> Self {
        self.target = target;
        self
    }

    /// Set the max distance (builder pattern)
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Add an actor to the ignore list (builder pattern)
    pub fn ignoring(mut self, actor: ActorHandle) -> Self {
        self.ignore.push(actor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_single_forward_ray() {
        let request = TraceRequest::default();
        assert_eq!(request.family, PatternFamily::Forward);
        assert_eq!(request.forward_variant, ForwardVariant::SingleRay);
        assert_eq!(request.ray_count, 1);
    }

    #[test]
    fn preset_serde_skips_runtime_fields() {
        let request = TraceRequest::forward_cone(11, 45.0);
        let json = serde_json::to_string(&request).unwrap();
        let back: TraceRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ray_count, 11);
        assert!(back.origin.actor.is_none());
        assert!(back.ignore.is_empty());
    }
}
