//! # umbra_trace - OmniTrace Pattern Engine
//!
//! Declarative ray-pattern generation and collision querying:
//!
//! - Pattern families: forward cone, target arc, orbit ring, 3D radial
//!   burst; plus world-point path patterns (line, arc, grid, noise walk,
//!   scatter, volume, ...)
//! - Trace shapes: line, sphere/box/capsule sweep
//! - A stateless orchestrator that runs every ray of a request and
//!   aggregates first/nearest hits
//! - Named, reusable pattern presets and preset libraries
//!
//! Collision queries go through the [`TraceWorld`] trait; an adapter for
//! `umbra_physics::QueryWorld` is provided, and tests can substitute an
//! analytic mock world.

pub mod adapter;
pub mod debug;
pub mod error;
pub mod path;
pub mod pattern;
pub mod preset;
pub mod request;
pub mod result;
pub mod runner;
pub mod world;

pub use debug::{DebugRecorder, DebugShape};
pub use error::{Result, TraceError};
pub use path::{PathConfig, PathPattern};
pub use pattern::PatternRay;
pub use preset::{builtin_presets, PatternLibrary, PatternPreset};
pub use request::{
    DebugOptions, ForwardVariant, OriginSource, PatternFamily, TargetSource, TraceRequest,
    TraceShape,
};
pub use result::{RayRecord, TraceBatchResult, TraceHit};
pub use runner::{run_along_path, run_pattern, run_pattern_with_debug};
pub use world::TraceWorld;

pub use umbra_physics::TraceChannel;
