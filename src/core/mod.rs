//! Core deterministic primitives.
//!
//! Hash types and domain-separated hashing shared by the proof layer and the
//! game rules.

pub mod hash;

// Re-export core types
pub use hash::{Hash32, StateHasher, EMPTY, FILLED};
