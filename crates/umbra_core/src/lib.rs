//! # umbra_core - Core Primitives for Umbra Gameplay Systems
//!
//! Shared building blocks used by every Umbra crate:
//!
//! - Generation-checked handles for referencing actors and other
//!   registry-owned objects without dangling pointers
//! - Hierarchical gameplay tags (dot-separated paths) with interned
//!   hashes for cheap equality and prefix matching

pub mod handle;
pub mod tags;

pub use handle::{Handle, HandleMap};
pub use tags::{Tag, TagSet};
