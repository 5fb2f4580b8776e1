//! Nullifier Maps
//!
//! Sparse authenticated key → value maps of depth 256, used only to record
//! that a key has been consumed. A key's position in the map is its 256-bit
//! value, so one witness both proves what is stored at the key and which key
//! it is. Entries move from [`EMPTY`] to [`FILLED`] once and never back.

use serde::{Serialize, Deserialize};

use crate::core::hash::{Hash32, EMPTY, FILLED};
use crate::proof::merkle::{empty_root, MerkleError, MerkleWitness, MAX_DEPTH};

/// Which uniqueness set a nullifier belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NullifierKind {
    /// One planet per location hash.
    Location,
    /// One home planet per player.
    Player,
}

/// Depth-256 sparse Merkle map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthenticatedMap;

impl AuthenticatedMap {
    /// Depth of every nullifier map.
    pub const DEPTH: usize = MAX_DEPTH;

    /// Create a map descriptor.
    pub fn new() -> Self {
        Self
    }

    /// Root of a map with no filled keys.
    pub fn empty_root(&self) -> Hash32 {
        empty_root(Self::DEPTH)
    }

    /// Root and key implied by `value` at the witnessed position.
    pub fn compute_root_and_key(&self, witness: &MerkleWitness, value: &Hash32) -> (Hash32, Hash32) {
        (witness.calculate_root(value), witness.calculate_key())
    }

    /// Root and key implied by the witnessed key being empty.
    ///
    /// The caller must compare both against what it expects; see
    /// [`AuthenticatedMap::prove_absent`] for the checked form.
    pub fn verify_absence(&self, witness: &MerkleWitness) -> (Hash32, Hash32) {
        self.compute_root_and_key(witness, &EMPTY)
    }

    /// Check that `key` is currently empty under `root`.
    pub fn prove_absent(&self, root: &Hash32, key: &Hash32, witness: &MerkleWitness) -> Result<(), MerkleError> {
        if witness.depth() != Self::DEPTH {
            return Err(MerkleError::DepthMismatch {
                expected: Self::DEPTH,
                got: witness.depth(),
            });
        }
        let (current_root, current_key) = self.verify_absence(witness);
        if current_key != *key {
            return Err(MerkleError::KeyMismatch {
                expected: hex::encode(key),
                got: hex::encode(current_key),
            });
        }
        if current_root != *root {
            return Err(MerkleError::RootMismatch);
        }
        Ok(())
    }

    /// Root after writing the filled sentinel at the witnessed key.
    pub fn mark_filled(&self, witness: &MerkleWitness) -> Hash32 {
        witness.calculate_root(&FILLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::merkle::empty_subtree_roots;

    /// Witness for `key` in a map holding nothing.
    fn empty_map_witness(key: &Hash32) -> MerkleWitness {
        let zeros = empty_subtree_roots();
        let siblings = (0..AuthenticatedMap::DEPTH)
            .map(|level| {
                let bit = (key[31 - level / 8] >> (level % 8)) & 1 == 1;
                (zeros[level], !bit)
            })
            .collect();
        MerkleWitness::new(siblings)
    }

    #[test]
    fn test_key_round_trips_through_witness() {
        let mut key = [0u8; 32];
        key[0] = 0x80;
        key[17] = 0x5a;
        key[31] = 0x01;
        assert_eq!(empty_map_witness(&key).calculate_key(), key);
    }

    #[test]
    fn test_absence_then_fill() {
        let map = AuthenticatedMap::new();
        let root = map.empty_root();
        let key = [0xabu8; 32];
        let witness = empty_map_witness(&key);

        assert!(map.prove_absent(&root, &key, &witness).is_ok());

        let filled_root = map.mark_filled(&witness);
        assert_ne!(filled_root, root);

        // Same witness can no longer prove absence under the new root.
        assert_eq!(
            map.prove_absent(&filled_root, &key, &witness),
            Err(MerkleError::RootMismatch)
        );
        let (root_if_filled, derived_key) = map.compute_root_and_key(&witness, &FILLED);
        assert_eq!(root_if_filled, filled_root);
        assert_eq!(derived_key, key);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let map = AuthenticatedMap::new();
        let root = map.empty_root();
        let witness = empty_map_witness(&[1u8; 32]);

        assert!(matches!(
            map.prove_absent(&root, &[2u8; 32], &witness),
            Err(MerkleError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_short_witness_rejected() {
        let map = AuthenticatedMap::new();
        let witness = MerkleWitness::new(vec![(EMPTY, true); 11]);
        assert!(matches!(
            map.prove_absent(&map.empty_root(), &EMPTY, &witness),
            Err(MerkleError::DepthMismatch { expected: 256, got: 11 })
        ));
    }
}
