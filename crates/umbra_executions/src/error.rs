//! Error types and the candidate reject taxonomy

use thiserror::Error;

/// Engine-level errors.
///
/// Candidate rejection is not an error; see [`RejectReason`].
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A content reference failed to resolve during dispatch
    #[error("Missing content during dispatch: {0}")]
    ContentMissing(String),

    /// An actor handle went stale mid-operation
    #[error("Actor is no longer valid: {0}")]
    ActorInvalid(String),

    /// Settings content failed to parse
    #[error("Failed to parse settings: {0}")]
    InvalidSettings(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Why a candidate definition was rejected during evaluation.
///
/// Every rejection carries one of these plus a free-text diagnostic; both
/// land in the per-request candidate debug records. `None` is the success
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RejectReason {
    /// Accepted; no rejection
    None,
    /// The definition or one of its soft references did not resolve
    MissingDefinition,
    /// The ability-requirement gate failed
    AbilityRequirementFailed,
    /// Global stealth score exceeds the definition's maximum
    StealthBlocked,
    /// Required/blocked context tags did not match
    MissionTagMismatch,
    /// Instigator-target distance outside the allowed band
    DistanceOutOfRange,
    /// Facing alignment outside the allowed angle
    AngleOutOfRange,
    /// Height delta incompatible with the definition's height mode
    HeightModeMismatch,
    /// A spatial probe found no usable result
    OmniTraceFailed,
    /// An authored warp point could not be resolved
    WarpPointMissing,
    /// Backend configuration is missing required pieces
    DataIncomplete,
    /// Anything else
    Other,
}

impl RejectReason {
    /// Whether this is the success sentinel
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Default for RejectReason {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_the_success_sentinel() {
        assert!(RejectReason::None.is_accepted());
        assert!(!RejectReason::StealthBlocked.is_accepted());
    }
}
