//! Merkle-path trace gadget for a zkVM proving pipeline.
//!
//! Converts runtime Merkle membership checks and leaf updates into algebraic
//! constraint rows: one row per tree level, with selector, latch and
//! inverse-witness columns so the downstream polynomial constraint system
//! never sees data-dependent control flow.

use sha2::{Digest, Sha256};

pub mod constraints;
pub mod gadget;
pub mod hash;
pub mod trace;

pub fn digest_sha2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
