//! Planet Registry Data Model
//!
//! The logical contents of each details-tree leaf, plus the fleet values that
//! are only ever stored on-tree as commitments.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::{Hash32, EMPTY, hash_with_domain};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Domain separator for player id derivation.
const PLAYER_ID_DOMAIN: &[u8] = b"DARK_ARMADA_PLAYER_V1";

/// Player identifier.
///
/// A 32-byte hash of the player's account address; also the key of the
/// player nullifier map.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Hash32);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: Hash32) -> Self {
        Self(bytes)
    }

    /// Derive from an account address (e.g. a public key encoding).
    pub fn from_address(address: &[u8]) -> Self {
        Self(hash_with_domain(PLAYER_ID_DOMAIN, address))
    }

    /// Derive from a UUID account id.
    pub fn from_account(account: &uuid::Uuid) -> Self {
        Self::from_address(account.as_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

// =============================================================================
// COORDINATES AND FACTIONS
// =============================================================================

/// Grid coordinate of a planet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Horizontal position.
    pub x: i64,
    /// Vertical position.
    pub y: i64,
}

impl Coordinate {
    /// Create a coordinate.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Planet faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Faction {
    /// Faction 0
    Vanguard = 0,
    /// Faction 1
    Syndicate = 1,
    /// Faction 2
    Collective = 2,
}

impl Faction {
    /// Highest valid faction index.
    pub const MAX_INDEX: u8 = 2;

    /// Get faction from index (0-2).
    pub fn from_index(index: u8) -> Option<Faction> {
        match index {
            0 => Some(Faction::Vanguard),
            1 => Some(Faction::Syndicate),
            2 => Some(Faction::Collective),
            _ => None,
        }
    }

    /// Raw index.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// FLEETS
// =============================================================================

/// Unit counts shared by defense and attack fleets.
pub trait Fleet {
    /// Battleship count.
    fn battleships(&self) -> u32;
    /// Destroyer count.
    fn destroyers(&self) -> u32;
    /// Carrier count.
    fn carriers(&self) -> u32;

    /// Fleet strength: plain sum of unit counts.
    fn strength(&self) -> u64 {
        self.battleships() as u64 + self.destroyers() as u64 + self.carriers() as u64
    }
}

/// Planetary defense fleet. Only its commitment is stored on-tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FleetDefense {
    /// Owner of the defended planet.
    pub owner: PlayerId,
    /// Battleship count.
    pub battleships: u32,
    /// Destroyer count.
    pub destroyers: u32,
    /// Carrier count.
    pub carriers: u32,
}

impl FleetDefense {
    /// Create a defense fleet.
    pub fn new(owner: PlayerId, battleships: u32, destroyers: u32, carriers: u32) -> Self {
        Self { owner, battleships, destroyers, carriers }
    }
}

impl Fleet for FleetDefense {
    fn battleships(&self) -> u32 {
        self.battleships
    }
    fn destroyers(&self) -> u32 {
        self.destroyers
    }
    fn carriers(&self) -> u32 {
        self.carriers
    }
}

/// Attacking fleet in flight. Its commitment is parked on the defender's record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackFleet {
    /// Faction of the launching planet.
    pub faction: Faction,
    /// Launching player.
    pub attacker: PlayerId,
    /// Battleship count.
    pub battleships: u32,
    /// Destroyer count.
    pub destroyers: u32,
    /// Carrier count.
    pub carriers: u32,
    /// Execution-layer timestamp of the launch.
    pub launch_timestamp: u64,
}

impl Fleet for AttackFleet {
    fn battleships(&self) -> u32 {
        self.battleships
    }
    fn destroyers(&self) -> u32 {
        self.destroyers
    }
    fn carriers(&self) -> u32 {
        self.carriers
    }
}

// =============================================================================
// PLANET RECORD
// =============================================================================

/// Full per-planet record. The details tree stores its commitment at
/// leaf index `planet_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanetRecord {
    /// Owning player.
    pub owner: PlayerId,
    /// Hash of the planet's coordinate.
    pub location_hash: Hash32,
    /// Faction chosen at birth.
    pub faction: Faction,
    /// Score; may go negative.
    pub points: i64,
    /// Commitment to the current defense, or [`EMPTY`].
    pub defense_commitment: Hash32,
    /// Commitment to the pending attack, or [`EMPTY`].
    pub incoming_attack_commitment: Hash32,
}

impl PlanetRecord {
    /// Record of a freshly born planet.
    pub fn newborn(owner: PlayerId, location_hash: Hash32, faction: Faction) -> Self {
        Self {
            owner,
            location_hash,
            faction,
            points: 0,
            defense_commitment: EMPTY,
            incoming_attack_commitment: EMPTY,
        }
    }

    /// Has a defense been set?
    #[inline]
    pub fn has_defense(&self) -> bool {
        self.defense_commitment != EMPTY
    }

    /// Is an attack pending against this planet?
    #[inline]
    pub fn is_under_attack(&self) -> bool {
        self.incoming_attack_commitment != EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_derivation() {
        let a = PlayerId::from_address(b"alice");
        let b = PlayerId::from_address(b"bob");
        assert_ne!(a, b);
        assert_eq!(a, PlayerId::from_address(b"alice"));

        let account = uuid::Uuid::from_bytes([9; 16]);
        assert_eq!(PlayerId::from_account(&account), PlayerId::from_address(&[9; 16]));
    }

    #[test]
    fn test_faction_index() {
        for i in 0..=Faction::MAX_INDEX {
            assert_eq!(Faction::from_index(i).map(Faction::index), Some(i));
        }
        assert_eq!(Faction::from_index(3), None);
    }

    #[test]
    fn test_fleet_strength() {
        let owner = PlayerId::new([1; 32]);
        let defense = FleetDefense::new(owner, 5, 5, 5);
        assert_eq!(defense.strength(), 15);

        let big = FleetDefense::new(owner, u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(big.strength(), 3 * u32::MAX as u64);
    }

    #[test]
    fn test_newborn_record() {
        let record = PlanetRecord::newborn(PlayerId::new([1; 32]), [2; 32], Faction::Syndicate);
        assert_eq!(record.points, 0);
        assert!(!record.has_defense());
        assert!(!record.is_under_attack());
    }
}
