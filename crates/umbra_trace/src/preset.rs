//! Named pattern presets and preset libraries
//!
//! Presets are authored content: a display name, a category, and a full
//! [`TraceRequest`] minus its runtime actor fields. The builtin table
//! covers the patterns gameplay code reaches for most; asset-based
//! libraries extend it.

use crate::request::{ForwardVariant, PatternFamily, TraceRequest, TraceShape};
use serde::{Deserialize, Serialize};

/// A named, reusable trace request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternPreset {
    /// Stable identifier
    pub id: String,
    /// Content version, bumped when the authored request changes shape
    pub version: u32,
    /// Human-readable name
    pub display_name: String,
    /// One-line description
    pub description: String,
    /// Grouping category for tooling
    pub category: String,
    /// Family color for visualization (RGBA)
    pub color: [f32; 4],
    /// The request this preset expands to
    pub request: TraceRequest,
}

impl PatternPreset {
    /// Create a preset wrapping a request
    pub fn new(id: impl Into<String>, request: TraceRequest) -> Self {
        let id = id.into();
        Self {
            version: 1,
            display_name: id.clone(),
            description: String::new(),
            category: "General".to_string(),
            color: [1.0, 1.0, 1.0, 1.0],
            id,
            request,
        }
    }

    /// Set the display name (builder pattern)
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the category (builder pattern)
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the color (builder pattern)
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// The compile-time preset table.
pub fn builtin_presets() -> Vec<PatternPreset> {
    vec![
        PatternPreset::new(
            "forward.single",
            TraceRequest {
                family: PatternFamily::Forward,
                forward_variant: ForwardVariant::SingleRay,
                max_distance: 1000.0,
                ..Default::default()
            },
        )
        .with_display_name("Forward Ray")
        .with_category("Forward")
        .with_color([0.2, 1.0, 0.2, 1.0]),
        PatternPreset::new(
            "forward.cone",
            TraceRequest {
                family: PatternFamily::Forward,
                forward_variant: ForwardVariant::MultiSpread,
                ray_count: 11,
                spread_degrees: 45.0,
                max_distance: 500.0,
                ..Default::default()
            },
        )
        .with_display_name("Forward Cone")
        .with_category("Forward")
        .with_color([0.2, 1.0, 0.2, 1.0]),
        PatternPreset::new(
            "target.arc",
            TraceRequest {
                family: PatternFamily::Target,
                ray_count: 9,
                arc_degrees: 90.0,
                max_distance: 800.0,
                ..Default::default()
            },
        )
        .with_display_name("Target Arc")
        .with_category("Target")
        .with_color([1.0, 0.8, 0.2, 1.0]),
        PatternPreset::new(
            "orbit.ring",
            TraceRequest {
                family: PatternFamily::Orbit,
                ray_count: 16,
                orbit_radius: 150.0,
                max_distance: 300.0,
                ..Default::default()
            },
        )
        .with_display_name("Orbit Ring")
        .with_category("Orbit")
        .with_color([0.4, 0.6, 1.0, 1.0]),
        PatternPreset::new(
            "radial.sphere",
            TraceRequest {
                family: PatternFamily::Radial3D,
                ray_count: 32,
                max_distance: 400.0,
                ..Default::default()
            },
        )
        .with_display_name("Radial Burst")
        .with_category("Radial")
        .with_color([1.0, 0.4, 0.8, 1.0]),
        PatternPreset::new(
            "pawn.sweep",
            TraceRequest {
                family: PatternFamily::Forward,
                forward_variant: ForwardVariant::MultiSpread,
                ray_count: 5,
                spread_degrees: 30.0,
                shape: TraceShape::Sphere { radius: 20.0 },
                max_distance: 250.0,
                ..Default::default()
            },
        )
        .with_display_name("Pawn Sweep")
        .with_category("Forward")
        .with_color([0.2, 1.0, 0.2, 1.0]),
    ]
}

/// Ordered collection of `(id, preset)` pairs with linear id lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternLibrary {
    entries: Vec<(String, PatternPreset)>,
}

impl PatternLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library seeded with the builtin presets
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        for preset in builtin_presets() {
            library.add(preset);
        }
        library
    }

    /// Add a preset under its own id
    pub fn add(&mut self, preset: PatternPreset) {
        self.add_as(preset.id.clone(), preset);
    }

    /// Add a preset under an explicit id
    pub fn add_as(&mut self, id: impl Into<String>, preset: PatternPreset) {
        self.entries.push((id.into(), preset));
    }

    /// Find a preset by id
    pub fn find(&self, id: &str) -> Option<&PatternPreset> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, preset)| preset)
    }

    /// Find a preset by id, erroring when absent
    pub fn require(&self, id: &str) -> crate::error::Result<&PatternPreset> {
        self.find(id)
            .ok_or_else(|| crate::error::TraceError::PresetNotFound(id.to_string()))
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(id, preset)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternPreset)> {
        self.entries.iter().map(|(id, p)| (id.as_str(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let presets = builtin_presets();
        for (i, a) in presets.iter().enumerate() {
            for b in presets.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn library_lookup_by_id() {
        let library = PatternLibrary::with_builtins();
        let preset = library.find("forward.cone").expect("builtin preset");
        assert_eq!(preset.request.ray_count, 11);
        assert!(library.find("missing").is_none());
        assert!(library.require("missing").is_err());
    }

    #[test]
    fn add_as_overrides_the_id() {
        let mut library = PatternLibrary::new();
        let preset = PatternPreset::new("original", TraceRequest::default());
        library.add_as("alias", preset);
        assert!(library.find("alias").is_some());
        assert!(library.find("original").is_none());
    }

    #[test]
    fn library_round_trips_through_json() {
        let library = PatternLibrary::with_builtins();
        let json = serde_json::to_string(&library).unwrap();
        let back: PatternLibrary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), library.len());
        assert!(back.find("orbit.ring").is_some());
    }
}
