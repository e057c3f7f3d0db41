//! Selection debug records
//!
//! Pure side channels for UI widgets and tooling: a per-candidate record
//! of every evaluation, a bounded rolling history of recent selections,
//! and a per-world slot holding the last bridge probe. None of this
//! feeds back into selection.

use std::collections::VecDeque;

use parking_lot::Mutex;
use umbra_core::Tag;
use umbra_math::{Transform, Vec3};

use crate::error::RejectReason;

/// How a single candidate fared during one request
#[derive(Debug, Clone)]
pub struct CandidateDebugRecord {
    /// Definition display name
    pub name: String,
    /// Final score including any anchor bonus
    pub score: f32,
    /// Whether this candidate won the selection
    pub selected: bool,
    /// Reject reason; `None` variant when accepted
    pub reject_reason: RejectReason,
    /// Human-readable diagnostic for the rejection
    pub failure_reason: String,
    /// Instigator-target distance at evaluation time
    pub distance: f32,
    /// Facing alignment angle at evaluation time, degrees
    pub facing_angle_degrees: f32,
    /// Height delta at evaluation time
    pub height_delta: f32,
}

/// Snapshot of one full selection pass
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    /// Label identifying the requester
    pub source_label: String,
    /// Tag of the winning definition, if any
    pub selected_tag: Option<Tag>,
    /// Per-candidate records in evaluation order
    pub candidates: Vec<CandidateDebugRecord>,
}

impl SelectionSnapshot {
    /// The record of the winning candidate, if any
    pub fn selected(&self) -> Option<&CandidateDebugRecord> {
        self.candidates.iter().find(|c| c.selected)
    }

    /// Count of rejected candidates
    pub fn rejected_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| !c.reject_reason.is_accepted())
            .count()
    }
}

/// Bounded rolling history of selection snapshots.
#[derive(Debug, Default)]
pub struct SelectionHistory {
    entries: VecDeque<SelectionSnapshot>,
}

impl SelectionHistory {
    /// Snapshots retained before the oldest is dropped
    pub const CAPACITY: usize = 10;

    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a snapshot, evicting the oldest past capacity
    pub fn push(&mut self, snapshot: SelectionSnapshot) {
        if self.entries.len() == Self::CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Number of retained snapshots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate snapshots oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SelectionSnapshot> {
        self.entries.iter()
    }

    /// The most recent snapshot
    pub fn latest(&self) -> Option<&SelectionSnapshot> {
        self.entries.back()
    }
}

/// Which probe mode produced a bridge record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeProbeMode {
    GroundRelative,
    Vertical,
    LegacyTag,
}

/// Record of the last bridge spatial probe, for visualization
#[derive(Debug, Clone)]
pub struct BridgeDebugRecord {
    /// Execution the probe ran for
    pub execution_tag: Tag,
    /// Probe mode
    pub mode: BridgeProbeMode,
    /// Point the probe sampled around
    pub sample_location: Vec3,
    /// Resulting helper transform
    pub helper_transform: Transform,
    /// Whether a qualifying surface hit produced the transform (false
    /// means a fallback point was used)
    pub from_qualified_hit: bool,
}

/// Per-world slot holding the most recent bridge probe record.
#[derive(Default)]
pub struct WorldDebugSlot {
    record: Mutex<Option<BridgeDebugRecord>>,
}

impl WorldDebugSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing the previous one
    pub fn store(&self, record: BridgeDebugRecord) {
        *self.record.lock() = Some(record);
    }

    /// Copy out the current record
    pub fn load(&self) -> Option<BridgeDebugRecord> {
        self.record.lock().clone()
    }

    /// Clear the slot
    pub fn clear(&self) {
        *self.record.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(label: &str) -> SelectionSnapshot {
        SelectionSnapshot {
            source_label: label.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn history_is_bounded() {
        let mut history = SelectionHistory::new();
        for i in 0..15 {
            history.push(snapshot(&format!("request-{i}")));
        }
        assert_eq!(history.len(), SelectionHistory::CAPACITY);
        // Oldest entries were evicted.
        assert_eq!(history.iter().next().unwrap().source_label, "request-5");
        assert_eq!(history.latest().unwrap().source_label, "request-14");
    }

    #[test]
    fn world_slot_replaces_and_clears() {
        let slot = WorldDebugSlot::new();
        assert!(slot.load().is_none());

        slot.store(BridgeDebugRecord {
            execution_tag: Tag::new("Execution.Test"),
            mode: BridgeProbeMode::GroundRelative,
            sample_location: Vec3::ZERO,
            helper_transform: Transform::IDENTITY,
            from_qualified_hit: true,
        });
        assert!(slot.load().is_some());

        slot.clear();
        assert!(slot.load().is_none());
    }
}
