//! # umbra_scene - Actor Registry
//!
//! A minimal world representation for the gameplay systems: named actors
//! with a transform, a tag set, and motion-warp target slots, addressed by
//! generation-checked handles. Systems hold [`ActorHandle`]s, never
//! references; a despawned actor's handles go stale rather than dangle.

pub mod actor;

pub use actor::{Actor, ActorHandle, SceneRegistry};
