//! Global stealth snapshot provider

use serde::{Deserialize, Serialize};

/// Coarse stealth tier derived from the global score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StealthTier {
    /// Fully visible to the world
    Exposed,
    /// Partially concealed
    Concealed,
    /// Effectively unseen
    Hidden,
}

impl Default for StealthTier {
    fn default() -> Self {
        Self::Exposed
    }
}

/// Point-in-time copy of the global stealth state.
///
/// Captured once per execution request; evaluation reads the copy, never
/// the live system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StealthSnapshot {
    /// Global stealth score in `[0, 1]`; higher means more exposed
    pub score01: f32,
    /// Shadow coverage at the instigator in `[0, 1]`
    pub shadow_level01: f32,
    /// Coarse tier
    pub tier: StealthTier,
}

impl Default for StealthSnapshot {
    fn default() -> Self {
        Self {
            score01: 0.0,
            shadow_level01: 0.0,
            tier: StealthTier::Exposed,
        }
    }
}

/// Source of stealth snapshots (the live stealth system in game code).
pub trait StealthProvider {
    /// Capture the current global stealth state
    fn snapshot(&self) -> StealthSnapshot;
}

/// A provider that always returns the same snapshot. Useful as the
/// default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStealthProvider(pub StealthSnapshot);

impl StealthProvider for FixedStealthProvider {
    fn snapshot(&self) -> StealthSnapshot {
        self.0
    }
}
