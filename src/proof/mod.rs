//! Authenticated Structures
//!
//! The only state the core holds is a handful of roots; everything else is
//! proven on every call through:
//! - Fixed-depth Merkle tree witnesses (planet details)
//! - Depth-256 sparse map witnesses (nullifiers)
//! - Canonical commitments over records and fleets
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF LAYER                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  merkle.rs     - Witnesses, fixed-depth tree, pair update   │
//! │  nullifier.rs  - Sparse absence/fill map (depth 256)        │
//! │  commitment.rs - Record / fleet / location hashes           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod merkle;
pub mod nullifier;
pub mod commitment;

// Re-export key types
pub use merkle::{AuthenticatedTree, LeafUpdate, MerkleError, MerkleWitness};
pub use nullifier::{AuthenticatedMap, NullifierKind};
pub use commitment::{Commitment, location_hash, birth_difficulty};
