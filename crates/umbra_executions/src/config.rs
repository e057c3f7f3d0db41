//! Engine settings
//!
//! Read-only at evaluation time; changes take effect on the next request.

use serde::{Deserialize, Serialize};

use crate::content::AssetId;
use crate::error::{ExecutionError, Result};

/// Thresholds for deriving a position tag from request geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutoPositionThresholds {
    /// Half-angle of the rear cone behind the target, degrees
    pub rear_half_angle_degrees: f32,
    /// Half-angle of the front cone ahead of the target, degrees
    pub front_half_angle_degrees: f32,
    /// `|height delta|` beyond which the pair counts as vertical
    pub vertical_height_threshold: f32,
}

impl Default for AutoPositionThresholds {
    fn default() -> Self {
        Self {
            rear_half_angle_degrees: 60.0,
            front_half_angle_degrees: 60.0,
            vertical_height_threshold: 120.0,
        }
    }
}

/// Settings for the execution manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KemSettings {
    /// 0 = quiet, 1 = per-request logs, 2 = per-candidate logs
    pub debug_verbosity: u8,
    /// Emit telemetry records to observers
    pub telemetry_enabled: bool,
    /// Cooldown after a successful execution, seconds; zero snaps
    /// straight back to ready
    pub success_cooldown: f32,
    /// Cooldown after a failed execution, seconds
    pub failure_cooldown: f32,
    /// Play the fallback montage when no candidate is accepted and the
    /// target is within this distance
    pub fallback_trigger_distance: f32,
    /// Montage to play on fallback
    pub fallback_montage: Option<AssetId>,
    /// Radius around instigator/target searched for anchors
    pub anchor_search_radius: f32,
    /// Bonus for an exact anchor position-tag match
    pub anchor_tag_bonus: f32,
    /// Bonus for an anchor family match
    pub anchor_family_bonus: f32,
    /// Thresholds for automatic position-tag derivation
    pub auto_position: AutoPositionThresholds,
}

impl Default for KemSettings {
    fn default() -> Self {
        Self {
            debug_verbosity: 0,
            telemetry_enabled: true,
            success_cooldown: 1.5,
            failure_cooldown: 0.75,
            fallback_trigger_distance: 250.0,
            fallback_montage: None,
            anchor_search_radius: 600.0,
            anchor_tag_bonus: 1.0,
            anchor_family_bonus: 0.75,
            auto_position: AutoPositionThresholds::default(),
        }
    }
}

impl KemSettings {
    /// Settings with no cooldowns, for tests and tooling
    pub fn no_cooldowns() -> Self {
        Self {
            success_cooldown: 0.0,
            failure_cooldown: 0.0,
            ..Default::default()
        }
    }

    /// Set cooldown durations (builder pattern)
    pub fn with_cooldowns(mut self, success: f32, failure: f32) -> Self {
        self.success_cooldown = success;
        self.failure_cooldown = failure;
        self
    }

    /// Set the fallback montage and trigger distance (builder pattern)
    pub fn with_fallback(mut self, montage: AssetId, trigger_distance: f32) -> Self {
        self.fallback_montage = Some(montage);
        self.fallback_trigger_distance = trigger_distance;
        self
    }

    /// Set the anchor search radius (builder pattern)
    pub fn with_anchor_search_radius(mut self, radius: f32) -> Self {
        self.anchor_search_radius = radius;
        self
    }

    /// Set the debug verbosity (builder pattern)
    pub fn with_debug_verbosity(mut self, verbosity: u8) -> Self {
        self.debug_verbosity = verbosity;
        self
    }

    /// Parse settings from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExecutionError::InvalidSettings(e.to_string()))
    }
}
