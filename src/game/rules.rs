//! Rule Predicates
//!
//! Pure checks with no side effects. Each returns the specific
//! [`TransitionError`] naming the rule that failed.

use crate::core::hash::Hash32;
use crate::game::config::GameConfig;
use crate::game::error::TransitionError;
use crate::game::planet::{Faction, Fleet};
use crate::proof::commitment::birth_difficulty;

/// Another planet fits under the capacity.
pub fn verify_capacity(count: u64, config: &GameConfig) -> Result<(), TransitionError> {
    if count >= config.max_planets {
        return Err(TransitionError::CapacityExceeded {
            count,
            max: config.max_planets,
        });
    }
    Ok(())
}

/// Both coordinates lie in `[0, grid_size)`.
pub fn verify_coordinate_bounds(x: i64, y: i64, config: &GameConfig) -> Result<(), TransitionError> {
    let in_range = |v: i64| (0..config.grid_size).contains(&v);
    if !in_range(x) || !in_range(y) {
        return Err(TransitionError::CoordinateOutOfRange {
            x,
            y,
            grid_size: config.grid_size,
        });
    }
    Ok(())
}

/// Location's birth difficulty falls strictly below the cutoff.
pub fn verify_birth_suitability(location_hash: &Hash32, config: &GameConfig) -> Result<(), TransitionError> {
    if !is_habitable(location_hash, config) {
        return Err(TransitionError::LocationUnsuitable);
    }
    Ok(())
}

/// Birth filter without the error wrapping (used when scouting coordinates).
pub fn is_habitable(location_hash: &Hash32, config: &GameConfig) -> bool {
    // Arrays compare lexicographically, i.e. as big-endian integers.
    birth_difficulty(location_hash, config.birth_hash_rounds) < config.birth_difficulty_cutoff
}

/// Faction index is one of the known factions.
pub fn verify_faction(faction: u8) -> Result<Faction, TransitionError> {
    Faction::from_index(faction).ok_or(TransitionError::InvalidFaction(faction))
}

/// Fleet strength does not exceed `cap`.
pub fn verify_fleet_strength<F: Fleet>(fleet: &F, cap: u64) -> Result<(), TransitionError> {
    let strength = fleet.strength();
    if strength > cap {
        return Err(TransitionError::FleetTooStrong { strength, cap });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::planet::{Coordinate, FleetDefense, PlayerId};
    use crate::proof::commitment::location_hash;

    #[test]
    fn test_capacity_boundary() {
        let config = GameConfig { max_planets: 3, ..GameConfig::default() };
        assert!(verify_capacity(2, &config).is_ok());
        assert_eq!(
            verify_capacity(3, &config),
            Err(TransitionError::CapacityExceeded { count: 3, max: 3 })
        );
    }

    #[test]
    fn test_coordinate_bounds() {
        let config = GameConfig::default();
        assert!(verify_coordinate_bounds(0, 0, &config).is_ok());
        assert!(verify_coordinate_bounds(config.grid_size - 1, config.grid_size - 1, &config).is_ok());
        assert!(verify_coordinate_bounds(config.grid_size, 0, &config).is_err());
        assert!(verify_coordinate_bounds(0, -1, &config).is_err());
    }

    #[test]
    fn test_birth_filter_respects_cutoff() {
        let loc = location_hash(&Coordinate::new(3, 7));

        let open = GameConfig { birth_difficulty_cutoff: [0xff; 32], ..GameConfig::default() };
        assert!(verify_birth_suitability(&loc, &open).is_ok());

        let closed = GameConfig { birth_difficulty_cutoff: [0x00; 32], ..GameConfig::default() };
        assert_eq!(verify_birth_suitability(&loc, &closed), Err(TransitionError::LocationUnsuitable));
    }

    #[test]
    fn test_default_cutoff_is_selective() {
        let config = GameConfig::default();
        let habitable = (0..4000)
            .filter(|i| is_habitable(&location_hash(&Coordinate::new(*i, 0)), &config))
            .count();
        // Roughly 1/256 of coordinates qualify.
        assert!(habitable > 0);
        assert!(habitable < 60);
    }

    #[test]
    fn test_faction_validation() {
        assert_eq!(verify_faction(2), Ok(Faction::Collective));
        assert_eq!(verify_faction(3), Err(TransitionError::InvalidFaction(3)));
    }

    #[test]
    fn test_fleet_strength_cap() {
        let owner = PlayerId::new([1; 32]);
        assert!(verify_fleet_strength(&FleetDefense::new(owner, 5, 5, 5), 15).is_ok());
        assert_eq!(
            verify_fleet_strength(&FleetDefense::new(owner, 5, 5, 6), 15),
            Err(TransitionError::FleetTooStrong { strength: 16, cap: 15 })
        );
    }
}
