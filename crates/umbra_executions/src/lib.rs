//! # umbra_executions - Kill Execution Manager
//!
//! Rule-driven selection and orchestration of context-sensitive
//! finishing-move executions:
//!
//! - Authored [`definition::ExecutionDefinition`]s describe candidates:
//!   tag/height/stealth constraints, a backend (CAS scene, level
//!   sequence, spawned helper, retired AI script), and warp points
//! - The [`manager::ExecutionManager`] gathers candidates per request,
//!   walks each through ordered short-circuit checks, scores the
//!   survivors (plus anchor bonuses), dispatches the winner's backend,
//!   and runs the Ready/Executing/cooldown state machine
//! - The [`bridge`] refines spawn transforms through OmniTrace spatial
//!   probes and feeds the motion-warp system
//! - Observers receive lifecycle events, chosen-backend payloads, and
//!   structured telemetry; debug records trace every selection
//!
//! External systems are collaborator traits: stealth snapshots, ability
//! checks, FX dispatch, and the collision world.

pub mod ability;
pub mod anchor;
pub mod backends;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod content;
pub mod context;
pub mod debug;
pub mod definition;
pub mod error;
pub mod events;
pub mod helper;
pub mod manager;
pub mod presets;
pub mod stealth;

pub mod prelude {
    pub use crate::ability::{AbilityEvaluator, TagAbilityEvaluator};
    pub use crate::anchor::AnchorMarker;
    pub use crate::config::KemSettings;
    pub use crate::content::{AssetId, ContentRegistry};
    pub use crate::context::ExecutionContext;
    pub use crate::definition::{
        ExecutionBackend, ExecutionDefinition, ExecutionFamily, HeightMode,
    };
    pub use crate::error::{ExecutionError, RejectReason};
    pub use crate::events::{ExecutionEvent, ExecutionEventKind, ExecutionObserver};
    pub use crate::manager::{ExecutionManager, ExecutionState, RequestEnv};
    pub use crate::stealth::{StealthProvider, StealthSnapshot, StealthTier};
}

pub use prelude::*;
