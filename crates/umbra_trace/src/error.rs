//! Error types for the pattern engine

use thiserror::Error;

/// Pattern engine errors
#[derive(Debug, Error)]
pub enum TraceError {
    /// Preset id not present in a library
    #[error("Pattern preset not found: {0}")]
    PresetNotFound(String),

    /// Preset content failed to parse
    #[error("Failed to parse preset content: {0}")]
    InvalidPreset(String),
}

/// Result type for pattern-engine operations
pub type Result<T> = std::result::Result<T, TraceError>;
