//! Merkle Tree Commitments
//!
//! Fixed-depth binary Merkle tree verified purely from sibling-path witnesses.
//! The core never holds the leaves: it holds a root, and every read or write
//! arrives with a witness computed by the off-process store.
//!
//! Leaves are stored as-is (a leaf is already a 32-byte commitment);
//! internal nodes are `H(domain || left || right)`. An unwritten leaf holds
//! [`EMPTY`], and empty subtrees collapse to precomputed per-level roots so
//! that a tree of any depth starts from a known root.

use std::sync::OnceLock;

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};
use thiserror::Error;

use crate::core::hash::{Hash32, EMPTY};

/// Domain separator for Merkle tree internal nodes.
const MERKLE_NODE_DOMAIN: &[u8] = b"DARK_ARMADA_MERKLE_NODE_V1";

/// Deepest structure supported (the nullifier maps use all of it).
pub const MAX_DEPTH: usize = 256;

/// Deepest indexed tree (indices are `u64`).
pub const MAX_INDEXED_DEPTH: usize = 64;

/// Hash two child nodes with domain separation.
pub fn hash_nodes(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(MERKLE_NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Roots of empty subtrees, indexed by subtree height (0 = empty leaf).
pub fn empty_subtree_roots() -> &'static [Hash32] {
    static ROOTS: OnceLock<Vec<Hash32>> = OnceLock::new();
    ROOTS.get_or_init(|| {
        let mut roots = Vec::with_capacity(MAX_DEPTH + 1);
        let mut current = EMPTY;
        roots.push(current);
        for _ in 0..MAX_DEPTH {
            current = hash_nodes(&current, &current);
            roots.push(current);
        }
        roots
    })
}

/// Root of a fully empty structure of the given depth.
pub fn empty_root(depth: usize) -> Hash32 {
    empty_subtree_roots()[depth.min(MAX_DEPTH)]
}

/// Errors raised while checking a witness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Witness has the wrong number of levels.
    #[error("witness depth {got} does not match tree depth {expected}")]
    DepthMismatch {
        /// Depth of the tree.
        expected: usize,
        /// Depth of the supplied witness.
        got: usize,
    },

    /// Witness addresses another leaf.
    #[error("witness addresses index {got}, expected {expected}")]
    IndexMismatch {
        /// Index the caller asked for.
        expected: u64,
        /// Index derived from the witness.
        got: u64,
    },

    /// Witness addresses another map key.
    #[error("witness addresses key {got}, expected {expected}")]
    KeyMismatch {
        /// Hex of the expected key.
        expected: String,
        /// Hex of the key derived from the witness.
        got: String,
    },

    /// Claimed leaf plus witness does not reproduce the committed root.
    #[error("witness does not reproduce the committed root")]
    RootMismatch,

    /// Two witnesses that must address distinct leaves address the same one.
    #[error("both witnesses address the same leaf")]
    SameLeaf,

    /// Requested tree depth is not supported.
    #[error("tree depth {got} exceeds maximum {max}")]
    DepthTooLarge {
        /// Maximum supported depth.
        max: usize,
        /// Requested depth.
        got: usize,
    },

    /// Witness bytes could not be decoded.
    #[error("witness encoding: {0}")]
    Encoding(String),
}

/// Merkle sibling-path witness.
///
/// `siblings[i]` is the sibling of the path node at height `i` (leaf level
/// first) together with whether that sibling sits on the right. The leaf
/// position is fully determined by those flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleWitness {
    /// Sibling hashes along the path (hash, is_right_sibling).
    pub siblings: Vec<(Hash32, bool)>,
}

impl MerkleWitness {
    /// Create a witness from a leaf-first sibling path.
    pub fn new(siblings: Vec<(Hash32, bool)>) -> Self {
        Self { siblings }
    }

    /// Number of levels in the path.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Path bit at `level`: true when the path node is a right child.
    /// `level` must be below [`Self::depth`].
    #[inline]
    fn path_bit(&self, level: usize) -> bool {
        !self.siblings[level].1
    }

    /// Root implied by placing `leaf` at the witnessed position.
    pub fn calculate_root(&self, leaf: &Hash32) -> Hash32 {
        self.node_at(leaf, self.depth())
    }

    /// Hash of the path node at `height`, starting from `leaf`.
    fn node_at(&self, leaf: &Hash32, height: usize) -> Hash32 {
        let mut current = *leaf;
        for (sibling, is_right) in &self.siblings[..height] {
            current = if *is_right {
                hash_nodes(&current, sibling)
            } else {
                hash_nodes(sibling, &current)
            };
        }
        current
    }

    /// Leaf index derived from the path (lowest 64 levels).
    pub fn calculate_index(&self) -> u64 {
        self.siblings
            .iter()
            .take(MAX_INDEXED_DEPTH)
            .enumerate()
            .filter(|(_, (_, is_right))| !is_right)
            .fold(0u64, |index, (level, _)| index | (1u64 << level))
    }

    /// Map key derived from the path, as a 256-bit big-endian integer.
    pub fn calculate_key(&self) -> Hash32 {
        let mut key = [0u8; 32];
        for level in 0..self.depth().min(MAX_DEPTH) {
            if self.path_bit(level) {
                key[31 - level / 8] |= 1 << (level % 8);
            }
        }
        key
    }

    /// Refresh this witness after `other`'s leaf was rewritten to `other_new_leaf`.
    ///
    /// Both witnesses must be valid against the same root. The returned
    /// witness is valid against the root produced by that write.
    pub fn rebase(&self, other: &MerkleWitness, other_new_leaf: &Hash32) -> Result<MerkleWitness, MerkleError> {
        if self.depth() != other.depth() {
            return Err(MerkleError::DepthMismatch {
                expected: self.depth(),
                got: other.depth(),
            });
        }

        // Highest level where the two paths split: below it the paths live in
        // disjoint subtrees, above it they share ancestors.
        let divergence = (0..self.depth())
            .rev()
            .find(|&level| self.path_bit(level) != other.path_bit(level))
            .ok_or(MerkleError::SameLeaf)?;

        let mut rebased = self.clone();
        rebased.siblings[divergence].0 = other.node_at(other_new_leaf, divergence);
        Ok(rebased)
    }

    /// Canonical wire encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MerkleError> {
        bincode::serialize(self).map_err(|e| MerkleError::Encoding(e.to_string()))
    }

    /// Decode from the canonical wire encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MerkleError> {
        bincode::deserialize(bytes).map_err(|e| MerkleError::Encoding(e.to_string()))
    }
}

/// One leaf rewrite inside a multi-leaf update.
#[derive(Clone, Copy, Debug)]
pub struct LeafUpdate<'a> {
    /// Leaf index.
    pub index: u64,
    /// Witness against the pre-update root.
    pub witness: &'a MerkleWitness,
    /// Claimed current leaf.
    pub old_leaf: Hash32,
    /// Replacement leaf.
    pub new_leaf: Hash32,
}

/// Fixed-depth authenticated tree.
///
/// Stateless: it only knows its depth. Roots are owned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedTree {
    depth: usize,
}

impl AuthenticatedTree {
    /// Create a tree descriptor of the given depth.
    pub fn new(depth: usize) -> Result<Self, MerkleError> {
        if depth > MAX_INDEXED_DEPTH {
            return Err(MerkleError::DepthTooLarge {
                max: MAX_INDEXED_DEPTH,
                got: depth,
            });
        }
        Ok(Self { depth })
    }

    /// Tree depth (number of sibling levels).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Root of the tree with every leaf empty.
    pub fn empty_root(&self) -> Hash32 {
        empty_root(self.depth)
    }

    /// Leaf index addressed by a witness.
    pub fn calculate_index(&self, witness: &MerkleWitness) -> u64 {
        witness.calculate_index()
    }

    fn check_shape(&self, index: u64, witness: &MerkleWitness) -> Result<(), MerkleError> {
        if witness.depth() != self.depth {
            return Err(MerkleError::DepthMismatch {
                expected: self.depth,
                got: witness.depth(),
            });
        }
        let got = witness.calculate_index();
        if got != index {
            return Err(MerkleError::IndexMismatch { expected: index, got });
        }
        Ok(())
    }

    /// Check that `leaf` sits at `index` under `root`.
    pub fn verify_leaf(
        &self,
        root: &Hash32,
        index: u64,
        witness: &MerkleWitness,
        leaf: &Hash32,
    ) -> Result<(), MerkleError> {
        self.check_shape(index, witness)?;
        if witness.calculate_root(leaf) != *root {
            return Err(MerkleError::RootMismatch);
        }
        Ok(())
    }

    /// Verify `old_leaf` at `index` under `root`, then return the root with
    /// `new_leaf` in its place.
    pub fn verify_and_update(
        &self,
        root: &Hash32,
        index: u64,
        witness: &MerkleWitness,
        old_leaf: &Hash32,
        new_leaf: &Hash32,
    ) -> Result<Hash32, MerkleError> {
        self.verify_leaf(root, index, witness, old_leaf)?;
        Ok(witness.calculate_root(new_leaf))
    }

    /// Apply two leaf rewrites sequentially.
    ///
    /// Both witnesses are checked against `root`. `first` is applied, then
    /// `second`'s witness is rebased onto the intermediate root and applied.
    pub fn update_pair(
        &self,
        root: &Hash32,
        first: LeafUpdate<'_>,
        second: LeafUpdate<'_>,
    ) -> Result<Hash32, MerkleError> {
        self.verify_leaf(root, first.index, first.witness, &first.old_leaf)?;
        self.verify_leaf(root, second.index, second.witness, &second.old_leaf)?;

        let intermediate = first.witness.calculate_root(&first.new_leaf);
        let rebased = second.witness.rebase(first.witness, &first.new_leaf)?;
        self.verify_and_update(&intermediate, second.index, &rebased, &second.old_leaf, &second.new_leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hash_bytes;

    /// Dense reference tree for building witnesses.
    fn build_levels(leaves: &[Hash32], depth: usize) -> Vec<Vec<Hash32>> {
        let mut level = vec![EMPTY; 1 << depth];
        level[..leaves.len()].copy_from_slice(leaves);
        let mut levels = vec![level.clone()];
        while level.len() > 1 {
            level = level.chunks(2).map(|c| hash_nodes(&c[0], &c[1])).collect();
            levels.push(level.clone());
        }
        levels
    }

    fn witness_for(levels: &[Vec<Hash32>], index: usize) -> MerkleWitness {
        let mut siblings = Vec::new();
        let mut current = index;
        for level in &levels[..levels.len() - 1] {
            let is_right = current % 2 == 0;
            let sibling = if is_right { current + 1 } else { current - 1 };
            siblings.push((level[sibling], is_right));
            current /= 2;
        }
        MerkleWitness::new(siblings)
    }

    fn sample_leaves(n: usize) -> Vec<Hash32> {
        (0..n).map(|i| hash_bytes(format!("leaf_{}", i).as_bytes())).collect()
    }

    #[test]
    fn test_empty_root_matches_dense_tree() {
        let levels = build_levels(&[], 4);
        assert_eq!(levels.last().unwrap()[0], empty_root(4));
        assert_eq!(AuthenticatedTree::new(4).unwrap().empty_root(), empty_root(4));
    }

    #[test]
    fn test_witness_verification() {
        let leaves = sample_leaves(5);
        let levels = build_levels(&leaves, 3);
        let root = levels.last().unwrap()[0];
        let tree = AuthenticatedTree::new(3).unwrap();

        for (i, leaf) in leaves.iter().enumerate() {
            let witness = witness_for(&levels, i);
            assert_eq!(tree.calculate_index(&witness), i as u64);
            assert!(tree.verify_leaf(&root, i as u64, &witness, leaf).is_ok());
        }
    }

    #[test]
    fn test_wrong_leaf_fails() {
        let leaves = sample_leaves(4);
        let levels = build_levels(&leaves, 2);
        let root = levels.last().unwrap()[0];
        let tree = AuthenticatedTree::new(2).unwrap();
        let witness = witness_for(&levels, 1);

        assert_eq!(
            tree.verify_leaf(&root, 1, &witness, &hash_bytes(b"wrong")),
            Err(MerkleError::RootMismatch)
        );
    }

    #[test]
    fn test_index_and_depth_checked() {
        let leaves = sample_leaves(4);
        let levels = build_levels(&leaves, 2);
        let root = levels.last().unwrap()[0];
        let witness = witness_for(&levels, 2);

        let tree = AuthenticatedTree::new(2).unwrap();
        assert_eq!(
            tree.verify_leaf(&root, 3, &witness, &leaves[2]),
            Err(MerkleError::IndexMismatch { expected: 3, got: 2 })
        );

        let deeper = AuthenticatedTree::new(3).unwrap();
        assert!(matches!(
            deeper.verify_leaf(&root, 2, &witness, &leaves[2]),
            Err(MerkleError::DepthMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_update_then_inverse_restores_root() {
        let leaves = sample_leaves(6);
        let levels = build_levels(&leaves, 3);
        let root = levels.last().unwrap()[0];
        let tree = AuthenticatedTree::new(3).unwrap();
        let witness = witness_for(&levels, 4);
        let replacement = hash_bytes(b"replacement");

        let updated = tree.verify_and_update(&root, 4, &witness, &leaves[4], &replacement).unwrap();
        assert_ne!(updated, root);

        let mut expected = leaves.clone();
        expected[4] = replacement;
        assert_eq!(updated, build_levels(&expected, 3).last().unwrap()[0]);

        let restored = tree.verify_and_update(&updated, 4, &witness, &replacement, &leaves[4]).unwrap();
        assert_eq!(restored, root);
    }

    #[test]
    fn test_update_pair_matches_dense_rebuild() {
        let leaves = sample_leaves(8);
        let levels = build_levels(&leaves, 3);
        let root = levels.last().unwrap()[0];
        let tree = AuthenticatedTree::new(3).unwrap();

        for (a, b) in [(0usize, 1usize), (2, 5), (7, 0), (3, 4)] {
            let wa = witness_for(&levels, a);
            let wb = witness_for(&levels, b);
            let new_a = hash_bytes(b"new_a");
            let new_b = hash_bytes(b"new_b");

            let updated = tree
                .update_pair(
                    &root,
                    LeafUpdate { index: a as u64, witness: &wa, old_leaf: leaves[a], new_leaf: new_a },
                    LeafUpdate { index: b as u64, witness: &wb, old_leaf: leaves[b], new_leaf: new_b },
                )
                .unwrap();

            let mut expected = leaves.clone();
            expected[a] = new_a;
            expected[b] = new_b;
            assert_eq!(updated, build_levels(&expected, 3).last().unwrap()[0]);
        }
    }

    #[test]
    fn test_rebase_same_leaf_rejected() {
        let leaves = sample_leaves(4);
        let levels = build_levels(&leaves, 2);
        let witness = witness_for(&levels, 1);
        assert_eq!(witness.rebase(&witness, &EMPTY), Err(MerkleError::SameLeaf));
    }

    #[test]
    fn test_stale_witness_rejected_after_other_write() {
        let leaves = sample_leaves(4);
        let levels = build_levels(&leaves, 2);
        let root = levels.last().unwrap()[0];
        let tree = AuthenticatedTree::new(2).unwrap();
        let w0 = witness_for(&levels, 0);
        let w3 = witness_for(&levels, 3);

        let advanced = tree.verify_and_update(&root, 0, &w0, &leaves[0], &hash_bytes(b"x")).unwrap();
        assert_eq!(
            tree.verify_leaf(&advanced, 3, &w3, &leaves[3]),
            Err(MerkleError::RootMismatch)
        );
    }

    #[test]
    fn test_witness_wire_encoding() {
        let levels = build_levels(&sample_leaves(3), 2);
        let witness = witness_for(&levels, 2);
        let bytes = witness.to_bytes().unwrap();
        assert_eq!(MerkleWitness::from_bytes(&bytes).unwrap(), witness);
        assert!(matches!(MerkleWitness::from_bytes(&bytes[..5]), Err(MerkleError::Encoding(_))));
    }

    #[test]
    fn test_depth_limit() {
        assert!(AuthenticatedTree::new(MAX_INDEXED_DEPTH).is_ok());
        assert!(matches!(
            AuthenticatedTree::new(MAX_INDEXED_DEPTH + 1),
            Err(MerkleError::DepthTooLarge { .. })
        ));
    }
}
