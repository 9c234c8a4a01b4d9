//! Merkle-path trace gadget.
//!
//! Records membership checks and leaf updates during VM execution, then
//! expands the log into constraint rows, one per tree level.

pub mod finalize;
pub mod walk;

pub use walk::{LEVEL_CAPACITY, MerkleTraceBuilder, WalkRecord};
