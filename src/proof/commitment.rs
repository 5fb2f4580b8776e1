//! Record Commitments
//!
//! Canonical hashes binding planet records, fleets and coordinates.
//! Field order below is the commitment format; changing it changes every root.

use crate::core::hash::{Hash32, StateHasher};
use crate::game::planet::{AttackFleet, Coordinate, FleetDefense, PlanetRecord};

/// Domain separator for planet record leaves.
const RECORD_DOMAIN: &[u8] = b"DARK_ARMADA_PLANET_V1";

/// Domain separator for defense fleet commitments.
const DEFENSE_DOMAIN: &[u8] = b"DARK_ARMADA_DEFENSE_V1";

/// Domain separator for attack fleet commitments.
const ATTACK_DOMAIN: &[u8] = b"DARK_ARMADA_ATTACK_V1";

/// Domain separator for location hashes.
const LOCATION_DOMAIN: &[u8] = b"DARK_ARMADA_LOCATION_V1";

/// Domain separator for the birth difficulty chain.
const BIRTH_DOMAIN: &[u8] = b"DARK_ARMADA_BIRTH_V1";

/// A value that is bound on-tree by a single hash.
pub trait Commitment {
    /// Canonical commitment hash.
    fn commitment(&self) -> Hash32;
}

impl Commitment for PlanetRecord {
    fn commitment(&self) -> Hash32 {
        let mut hasher = StateHasher::new(RECORD_DOMAIN);
        hasher.update_hash(self.owner.as_bytes());
        hasher.update_hash(&self.location_hash);
        hasher.update_u8(self.faction.index());
        hasher.update_i64(self.points);
        hasher.update_hash(&self.defense_commitment);
        hasher.update_hash(&self.incoming_attack_commitment);
        hasher.finalize()
    }
}

impl Commitment for FleetDefense {
    fn commitment(&self) -> Hash32 {
        let mut hasher = StateHasher::new(DEFENSE_DOMAIN);
        hasher.update_hash(self.owner.as_bytes());
        hasher.update_u32(self.battleships);
        hasher.update_u32(self.destroyers);
        hasher.update_u32(self.carriers);
        hasher.finalize()
    }
}

impl Commitment for AttackFleet {
    fn commitment(&self) -> Hash32 {
        let mut hasher = StateHasher::new(ATTACK_DOMAIN);
        hasher.update_u8(self.faction.index());
        hasher.update_hash(self.attacker.as_bytes());
        hasher.update_u32(self.battleships);
        hasher.update_u32(self.destroyers);
        hasher.update_u32(self.carriers);
        hasher.update_u64(self.launch_timestamp);
        hasher.finalize()
    }
}

/// Location hash of a coordinate; the key of the location nullifier map.
pub fn location_hash(coordinate: &Coordinate) -> Hash32 {
    let mut hasher = StateHasher::new(LOCATION_DOMAIN);
    hasher.update_i64(coordinate.x);
    hasher.update_i64(coordinate.y);
    hasher.finalize()
}

/// Birth difficulty: the location hash chained `rounds` times with a counter.
pub fn birth_difficulty(location_hash: &Hash32, rounds: u32) -> Hash32 {
    (0..rounds).fold(*location_hash, |current, round| {
        let mut hasher = StateHasher::new(BIRTH_DOMAIN);
        hasher.update_hash(&current);
        hasher.update_u32(round);
        hasher.finalize()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::EMPTY;
    use crate::game::planet::{Faction, PlayerId};

    fn sample_record() -> PlanetRecord {
        PlanetRecord::newborn(
            PlayerId::new([1; 32]),
            location_hash(&Coordinate::new(3, 7)),
            Faction::Syndicate,
        )
    }

    #[test]
    fn test_record_commitment_covers_every_field() {
        let base = sample_record();
        let base_hash = base.commitment();
        assert_ne!(base_hash, EMPTY);

        let variants = [
            PlanetRecord { owner: PlayerId::new([2; 32]), ..base },
            PlanetRecord { location_hash: [9; 32], ..base },
            PlanetRecord { faction: Faction::Collective, ..base },
            PlanetRecord { points: -10, ..base },
            PlanetRecord { defense_commitment: [3; 32], ..base },
            PlanetRecord { incoming_attack_commitment: [4; 32], ..base },
        ];
        for variant in variants {
            assert_ne!(variant.commitment(), base_hash);
        }
    }

    #[test]
    fn test_fleet_commitments_distinct_domains() {
        let owner = PlayerId::new([5; 32]);
        let defense = FleetDefense::new(owner, 1, 2, 3);
        let attack = AttackFleet {
            faction: Faction::Vanguard,
            attacker: owner,
            battleships: 1,
            destroyers: 2,
            carriers: 3,
            launch_timestamp: 0,
        };
        assert_ne!(defense.commitment(), attack.commitment());
        assert_ne!(attack.commitment(), AttackFleet { launch_timestamp: 1, ..attack }.commitment());
    }

    #[test]
    fn test_location_hash() {
        assert_eq!(
            location_hash(&Coordinate::new(3, 7)),
            location_hash(&Coordinate::new(3, 7))
        );
        assert_ne!(
            location_hash(&Coordinate::new(3, 7)),
            location_hash(&Coordinate::new(7, 3))
        );
    }

    #[test]
    fn test_birth_difficulty_chain() {
        let loc = location_hash(&Coordinate::new(1, 1));
        assert_eq!(birth_difficulty(&loc, 0), loc);
        assert_ne!(birth_difficulty(&loc, 1), loc);
        assert_eq!(birth_difficulty(&loc, 16), birth_difficulty(&loc, 16));
        assert_ne!(birth_difficulty(&loc, 16), birth_difficulty(&loc, 17));
    }
}
