//! Execution-side pattern preset library
//!
//! Entries map a relative position to a concrete spatial probe: a
//! ground-relative direction in the target's local frame, or a vertical
//! probe, each with a trace distance and optional tuning. The builtin
//! table covers the canonical position tags; asset libraries extend it.

use serde::{Deserialize, Serialize};
use umbra_core::Tag;
use umbra_math::Vec2;

use crate::definition::{ground_offset_for_tag, position, PatternTuning};

/// A spatial probe an execution's spawn refinement runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionProbe {
    /// Probe outward in the target's horizontal frame.
    ///
    /// `local_dir` weights the target's forward (x) and right (y) axes.
    GroundRelative { local_dir: Vec2, trace_distance: f32 },
    /// Probe straight up or down from the sample point
    Vertical { above: bool, trace_distance: f32 },
}

impl PositionProbe {
    /// Default ground probe reach
    pub const DEFAULT_GROUND_DISTANCE: f32 = 180.0;
    /// Default vertical probe reach
    pub const DEFAULT_VERTICAL_DISTANCE: f32 = 400.0;

    /// Probe for a canonical position tag, when one maps
    pub fn for_position_tag(tag: &Tag) -> Option<Self> {
        if let Some(local_dir) = ground_offset_for_tag(tag) {
            return Some(Self::GroundRelative {
                local_dir,
                trace_distance: Self::DEFAULT_GROUND_DISTANCE,
            });
        }
        match tag.path() {
            position::VERTICAL_ABOVE => Some(Self::Vertical {
                above: true,
                trace_distance: Self::DEFAULT_VERTICAL_DISTANCE,
            }),
            position::VERTICAL_BELOW => Some(Self::Vertical {
                above: false,
                trace_distance: Self::DEFAULT_VERTICAL_DISTANCE,
            }),
            _ => None,
        }
    }

    /// Probe for a free-form pattern tag from legacy content, matched by
    /// substring.
    pub fn for_legacy_tag(tag: &str) -> Option<Self> {
        let lower = tag.to_ascii_lowercase();
        let local_dir = if lower.contains("rear") || lower.contains("behind") {
            Vec2::new(-1.0, 0.0)
        } else if lower.contains("front") {
            Vec2::new(1.0, 0.0)
        } else if lower.contains("left") {
            Vec2::new(0.0, -1.0)
        } else if lower.contains("right") {
            Vec2::new(0.0, 1.0)
        } else {
            return None;
        };
        Some(Self::GroundRelative {
            local_dir,
            trace_distance: Self::DEFAULT_GROUND_DISTANCE,
        })
    }
}

/// A named probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KemPatternEntry {
    /// Stable identifier
    pub id: String,
    /// The probe to run
    pub probe: PositionProbe,
    /// Optional trace-engine preset id overriding the default probe cone
    pub trace_preset: Option<String>,
    /// Optional tuning overrides applied on top of the preset
    pub tuning: Option<PatternTuning>,
}

/// Ordered entry collection with linear id lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KemPresetLibrary {
    entries: Vec<KemPatternEntry>,
}

impl KemPresetLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library seeded with entries for the canonical position tags
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        for (id, tag) in [
            ("position.ground.rear", position::GROUND_REAR),
            ("position.ground.front", position::GROUND_FRONT),
            ("position.ground.left", position::GROUND_LEFT),
            ("position.ground.right", position::GROUND_RIGHT),
            ("position.vertical.above", position::VERTICAL_ABOVE),
            ("position.vertical.below", position::VERTICAL_BELOW),
        ] {
            if let Some(probe) = PositionProbe::for_position_tag(&Tag::new(tag)) {
                library.add(KemPatternEntry {
                    id: id.to_string(),
                    probe,
                    trace_preset: None,
                    tuning: None,
                });
            }
        }
        library
    }

    /// Add an entry
    pub fn add(&mut self, entry: KemPatternEntry) {
        self.entries.push(entry);
    }

    /// Find an entry by id
    pub fn find(&self, id: &str) -> Option<&KemPatternEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &KemPatternEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tags_map_to_probes() {
        let rear = PositionProbe::for_position_tag(&Tag::new(position::GROUND_REAR)).unwrap();
        assert_eq!(
            rear,
            PositionProbe::GroundRelative {
                local_dir: Vec2::new(-1.0, 0.0),
                trace_distance: PositionProbe::DEFAULT_GROUND_DISTANCE,
            }
        );

        let above = PositionProbe::for_position_tag(&Tag::new(position::VERTICAL_ABOVE)).unwrap();
        assert!(matches!(above, PositionProbe::Vertical { above: true, .. }));

        assert!(PositionProbe::for_position_tag(&Tag::new("Some.Other.Tag")).is_none());
    }

    #[test]
    fn legacy_tags_match_by_substring() {
        let probe = PositionProbe::for_legacy_tag("Takedown_FromRear_Silent").unwrap();
        assert!(matches!(
            probe,
            PositionProbe::GroundRelative { local_dir, .. } if local_dir.x < 0.0
        ));
        assert!(PositionProbe::for_legacy_tag("Takedown_Generic").is_none());
    }

    #[test]
    fn builtin_library_covers_ground_and_vertical() {
        let library = KemPresetLibrary::with_builtins();
        assert_eq!(library.len(), 6);
        assert!(library.find("position.ground.rear").is_some());
        assert!(library.find("position.vertical.below").is_some());
        assert!(library.find("position.corner.left").is_none());
    }
}
