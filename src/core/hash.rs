//! Hashing Primitives
//!
//! Every commitment the core holds or checks is a 32-byte SHA-256 digest:
//! - Merkle tree nodes and nullifier map nodes
//! - Planet record, defense and attack fleet commitments
//! - Location hashes and player ids
//!
//! Integers are absorbed big-endian, the same byte order used for map keys
//! and leaf indices.

use sha2::{Sha256, Digest};

/// 32-byte digest; also the width of every root, key and leaf.
pub type Hash32 = [u8; 32];

/// Empty sentinel. Unwritten tree leaves, empty nullifier entries and unset
/// defense / attack commitments all hold this value.
pub const EMPTY: Hash32 = [0u8; 32];

/// Nullifier sentinel for a consumed key.
pub const FILLED: Hash32 = {
    let mut filled = [0u8; 32];
    filled[31] = 1;
    filled
};

/// Domain-tagged SHA-256 over typed fields.
///
/// Call order is the encoding: two values absorbed in a different order
/// give a different digest.
pub struct StateHasher {
    inner: Sha256,
}

impl StateHasher {
    /// Start a digest tagged with `domain`.
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = Sha256::new();
        inner.update(domain);
        Self { inner }
    }

    /// Absorb raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Absorb a digest.
    #[inline]
    pub fn update_hash(&mut self, hash: &Hash32) {
        self.inner.update(hash);
    }

    /// Absorb a `u8`.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.inner.update([value]);
    }

    /// Absorb a `u32`.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.inner.update(value.to_be_bytes());
    }

    /// Absorb a `u64`.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.inner.update(value.to_be_bytes());
    }

    /// Absorb a signed value as its two's-complement bytes.
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.inner.update(value.to_be_bytes());
    }

    /// Consume the hasher.
    pub fn finalize(self) -> Hash32 {
        self.inner.finalize().into()
    }
}

/// Untagged SHA-256.
pub fn hash_bytes(data: &[u8]) -> Hash32 {
    Sha256::digest(data).into()
}

/// SHA-256 of `domain || data`.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash32 {
    let mut hasher = StateHasher::new(domain);
    hasher.update_bytes(data);
    hasher.finalize()
}

/// First four bytes in hex, for log lines.
pub fn short_hex(hash: &Hash32) -> String {
    hex::encode(&hash[..4])
}
