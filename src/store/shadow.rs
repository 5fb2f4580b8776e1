//! Shadow Trees
//!
//! Sparse in-memory copy of an authenticated tree or map. Only non-empty
//! nodes are stored; every absent node is the empty subtree root of its
//! height. Positions are 256-bit big-endian keys, so the same structure
//! backs both the indexed details tree and the depth-256 nullifier maps.

use std::collections::BTreeMap;

use crate::core::hash::{Hash32, EMPTY};
use crate::proof::merkle::{empty_subtree_roots, hash_nodes, MerkleWitness, MAX_DEPTH};

/// Key of leaf `index` in an indexed tree.
pub fn index_key(index: u64) -> Hash32 {
    let mut key = [0u8; 32];
    key[24..].copy_from_slice(&index.to_be_bytes());
    key
}

/// `key >> bits`, treating the key as a big-endian integer.
fn shift_right(key: &Hash32, bits: usize) -> Hash32 {
    let mut out = [0u8; 32];
    if bits >= 256 {
        return out;
    }
    let (bytes, rem) = (bits / 8, bits % 8);
    for i in bytes..32 {
        let src = i - bytes;
        let mut byte = key[src] >> rem;
        if rem > 0 && src > 0 {
            byte |= key[src - 1] << (8 - rem);
        }
        out[i] = byte;
    }
    out
}

/// Position of the other child under the same parent.
fn sibling_of(position: &Hash32) -> Hash32 {
    let mut sibling = *position;
    sibling[31] ^= 1;
    sibling
}

#[inline]
fn is_right_child(position: &Hash32) -> bool {
    position[31] & 1 == 1
}

/// Sparse Merkle tree holding leaves for witness generation.
#[derive(Clone, Debug)]
pub struct ShadowTree {
    depth: usize,
    /// `levels[h]`: non-empty nodes at height `h`, keyed by position.
    levels: Vec<BTreeMap<Hash32, Hash32>>,
}

impl ShadowTree {
    /// Create an empty tree. Depth is clamped to 256.
    pub fn new(depth: usize) -> Self {
        let depth = depth.min(MAX_DEPTH);
        Self {
            depth,
            levels: vec![BTreeMap::new(); depth + 1],
        }
    }

    /// Tree depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of non-empty leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// No leaf written yet.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    fn node(&self, height: usize, position: &Hash32) -> Hash32 {
        self.levels[height]
            .get(position)
            .copied()
            .unwrap_or(empty_subtree_roots()[height])
    }

    fn put(&mut self, height: usize, position: Hash32, hash: Hash32) {
        if hash == empty_subtree_roots()[height] {
            self.levels[height].remove(&position);
        } else {
            self.levels[height].insert(position, hash);
        }
    }

    /// Current root.
    pub fn root(&self) -> Hash32 {
        self.node(self.depth, &[0u8; 32])
    }

    /// Leaf at `key` ([`EMPTY`] if never written).
    pub fn get(&self, key: &Hash32) -> Hash32 {
        self.levels[0].get(key).copied().unwrap_or(EMPTY)
    }

    /// Write `leaf` at `key` and return the new root.
    pub fn set(&mut self, key: &Hash32, leaf: Hash32) -> Hash32 {
        self.put(0, *key, leaf);
        let mut current = leaf;
        for height in 0..self.depth {
            let position = shift_right(key, height);
            let sibling = self.node(height, &sibling_of(&position));
            current = if is_right_child(&position) {
                hash_nodes(&sibling, &current)
            } else {
                hash_nodes(&current, &sibling)
            };
            self.put(height + 1, shift_right(key, height + 1), current);
        }
        current
    }

    /// Sibling path for `key` against the current root.
    pub fn witness(&self, key: &Hash32) -> MerkleWitness {
        let siblings = (0..self.depth)
            .map(|height| {
                let position = shift_right(key, height);
                (self.node(height, &sibling_of(&position)), !is_right_child(&position))
            })
            .collect();
        MerkleWitness::new(siblings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::{hash_bytes, FILLED};
    use crate::proof::merkle::{empty_root, AuthenticatedTree};
    use crate::proof::nullifier::AuthenticatedMap;

    #[test]
    fn test_shift_right() {
        let key = index_key(0b1011_0000_0001);
        assert_eq!(shift_right(&key, 0), key);
        assert_eq!(shift_right(&key, 1), index_key(0b101_1000_0000));
        assert_eq!(shift_right(&key, 9), index_key(0b101));
        assert_eq!(shift_right(&key, 256), [0u8; 32]);

        let mut high = [0u8; 32];
        high[0] = 0x80;
        assert_eq!(shift_right(&high, 255), index_key(1));
    }

    #[test]
    fn test_empty_tree_root() {
        assert_eq!(ShadowTree::new(11).root(), empty_root(11));
        assert_eq!(ShadowTree::new(256).root(), empty_root(256));
    }

    #[test]
    fn test_witness_verifies_against_indexed_tree() {
        let tree = AuthenticatedTree::new(4).unwrap();
        let mut shadow = ShadowTree::new(4);
        let leaves: Vec<Hash32> = (0..9).map(|i| hash_bytes(&[i as u8])).collect();
        for (i, leaf) in leaves.iter().enumerate() {
            shadow.set(&index_key(i as u64), *leaf);
        }

        let root = shadow.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let witness = shadow.witness(&index_key(i as u64));
            assert_eq!(tree.calculate_index(&witness), i as u64);
            assert!(tree.verify_leaf(&root, i as u64, &witness, leaf).is_ok());
        }
        // Unwritten slot proves EMPTY.
        let witness = shadow.witness(&index_key(12));
        assert!(tree.verify_leaf(&root, 12, &witness, &EMPTY).is_ok());
    }

    #[test]
    fn test_set_matches_witness_update() {
        let tree = AuthenticatedTree::new(3).unwrap();
        let mut shadow = ShadowTree::new(3);
        shadow.set(&index_key(2), hash_bytes(b"a"));

        let before = shadow.root();
        let witness = shadow.witness(&index_key(5));
        let predicted = tree
            .verify_and_update(&before, 5, &witness, &EMPTY, &hash_bytes(b"b"))
            .unwrap();
        assert_eq!(shadow.set(&index_key(5), hash_bytes(b"b")), predicted);
    }

    #[test]
    fn test_nullifier_map_absence_and_fill() {
        let map = AuthenticatedMap::new();
        let mut shadow = ShadowTree::new(AuthenticatedMap::DEPTH);
        let key = hash_bytes(b"location");

        let witness = shadow.witness(&key);
        assert!(map.prove_absent(&shadow.root(), &key, &witness).is_ok());

        let filled_root = map.mark_filled(&witness);
        assert_eq!(shadow.set(&key, FILLED), filled_root);
        assert!(map.prove_absent(&shadow.root(), &key, &shadow.witness(&key)).is_err());

        // Another key still proves absent against the new root.
        let other = hash_bytes(b"elsewhere");
        assert!(map.prove_absent(&shadow.root(), &other, &shadow.witness(&other)).is_ok());
    }

    #[test]
    fn test_clearing_leaf_prunes_nodes() {
        let mut shadow = ShadowTree::new(8);
        shadow.set(&index_key(3), hash_bytes(b"x"));
        assert_eq!(shadow.len(), 1);
        shadow.set(&index_key(3), EMPTY);
        assert!(shadow.is_empty());
        assert_eq!(shadow.root(), empty_root(8));
    }
}
