//! Error types for the query world

use thiserror::Error;

/// Collision-world errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Collider not found
    #[error("Collider not found: {0:?}")]
    ColliderNotFound(crate::collider::ColliderHandle),

    /// Shape parameters describe a degenerate shape
    #[error("Invalid collision shape: {0}")]
    InvalidShape(String),
}

/// Result type for query-world operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
