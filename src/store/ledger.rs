//! Planet Ledger
//!
//! Off-process mirror of everything the core commits to. It keeps the
//! public planet records and both nullifier sets, builds requests with fresh
//! witnesses, and absorbs each [`StateDelta`] the core emits. Fleets are
//! secret and stay with the players; requests that reveal them take them as
//! arguments.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::hash::{Hash32, FILLED};
use crate::game::config::GameConfig;
use crate::game::planet::{AttackFleet, Coordinate, FleetDefense, PlanetRecord, PlayerId};
use crate::game::transition::{
    ArmadaState, ClaimForfeit, CreatePlanet, LaunchAttack, ResolveAttack, SetDefense, StateDelta,
};
use crate::proof::commitment::{location_hash, Commitment};
use crate::proof::merkle::MerkleWitness;
use crate::proof::nullifier::{AuthenticatedMap, NullifierKind};
use crate::store::shadow::{index_key, ShadowTree};

/// Ledger lookups that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record at this index.
    #[error("unknown planet {0}")]
    UnknownPlanet(u64),
}

/// Mirror of the committed state with the leaves behind it.
#[derive(Clone, Debug)]
pub struct PlanetLedger {
    details: ShadowTree,
    locations: ShadowTree,
    players: ShadowTree,
    records: BTreeMap<u64, PlanetRecord>,
}

impl PlanetLedger {
    /// Empty ledger for a details tree of the given depth.
    pub fn new(details_depth: usize) -> Self {
        Self {
            details: ShadowTree::new(details_depth),
            locations: ShadowTree::new(AuthenticatedMap::DEPTH),
            players: ShadowTree::new(AuthenticatedMap::DEPTH),
            records: BTreeMap::new(),
        }
    }

    /// Empty ledger matching a game config.
    pub fn for_config(config: &GameConfig) -> Self {
        Self::new(config.details_tree_depth)
    }

    /// Planets recorded.
    pub fn planet_count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Record at `planet_id`.
    pub fn record(&self, planet_id: u64) -> Option<&PlanetRecord> {
        self.records.get(&planet_id)
    }

    /// All records in index order.
    pub fn records(&self) -> impl Iterator<Item = (u64, &PlanetRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Home planet of `player`, if any.
    pub fn planet_of(&self, player: &PlayerId) -> Option<(u64, &PlanetRecord)> {
        self.records().find(|(_, record)| record.owner == *player)
    }

    /// Roots the core should hold if both sides saw the same transitions.
    pub fn roots(&self) -> ArmadaState {
        ArmadaState {
            planet_count: self.planet_count(),
            details_root: self.details.root(),
            location_nullifier_root: self.locations.root(),
            player_nullifier_root: self.players.root(),
        }
    }

    /// Details-tree witness for a slot.
    pub fn details_witness(&self, planet_id: u64) -> MerkleWitness {
        self.details.witness(&index_key(planet_id))
    }

    /// Location-map witness for a location hash.
    pub fn location_witness(&self, location: &Hash32) -> MerkleWitness {
        self.locations.witness(location)
    }

    /// Player-map witness.
    pub fn player_witness(&self, player: &PlayerId) -> MerkleWitness {
        self.players.witness(player.as_bytes())
    }

    /// Location already claimed.
    pub fn is_location_taken(&self, location: &Hash32) -> bool {
        self.locations.get(location) == FILLED
    }

    /// Apply the leaves written by a committed transition.
    pub fn absorb(&mut self, delta: &StateDelta) {
        for (planet_id, record) in &delta.records {
            self.details.set(&index_key(*planet_id), record.commitment());
            self.records.insert(*planet_id, *record);
        }
        for (kind, key) in &delta.nullified {
            let map = match kind {
                NullifierKind::Location => &mut self.locations,
                NullifierKind::Player => &mut self.players,
            };
            map.set(key, FILLED);
        }
    }

    fn claim(&self, planet_id: u64) -> Result<(PlanetRecord, MerkleWitness), StoreError> {
        let record = *self.record(planet_id).ok_or(StoreError::UnknownPlanet(planet_id))?;
        Ok((record, self.details_witness(planet_id)))
    }

    // -------------------------------------------------------------------------
    // Request builders
    // -------------------------------------------------------------------------

    /// Request a home planet at `(x, y)` for `player`.
    pub fn create_planet(&self, player: &PlayerId, x: i64, y: i64, faction: u8) -> CreatePlanet {
        let location = location_hash(&Coordinate::new(x, y));
        CreatePlanet {
            x,
            y,
            faction,
            details_witness: self.details_witness(self.planet_count()),
            location_witness: self.location_witness(&location),
            player_witness: self.player_witness(player),
        }
    }

    /// Request a new defense for `planet_id`.
    pub fn set_defense(&self, planet_id: u64, defense: FleetDefense) -> Result<SetDefense, StoreError> {
        let (record, witness) = self.claim(planet_id)?;
        Ok(SetDefense {
            defense,
            planet_id,
            record,
            witness,
        })
    }

    /// Request an attack from `attacker_id` on `defender_id`.
    pub fn launch_attack(&self, attacker_id: u64, defender_id: u64, fleet: AttackFleet) -> Result<LaunchAttack, StoreError> {
        let (attacker, attacker_witness) = self.claim(attacker_id)?;
        let (defender, defender_witness) = self.claim(defender_id)?;
        Ok(LaunchAttack {
            fleet,
            attacker_id,
            attacker,
            attacker_witness,
            defender_id,
            defender,
            defender_witness,
        })
    }

    /// Request resolution of the attack pending on `defender_id`.
    pub fn resolve_attack(
        &self,
        attacker_id: u64,
        defender_id: u64,
        defense: FleetDefense,
        fleet: AttackFleet,
    ) -> Result<ResolveAttack, StoreError> {
        let (attacker, attacker_witness) = self.claim(attacker_id)?;
        let (defender, defender_witness) = self.claim(defender_id)?;
        Ok(ResolveAttack {
            attacker_id,
            attacker,
            attacker_witness,
            defender_id,
            defender,
            defender_witness,
            defense,
            fleet,
        })
    }

    /// Request a forfeit on the attack pending on `defender_id`.
    pub fn claim_forfeit(&self, attacker_id: u64, defender_id: u64, fleet: AttackFleet) -> Result<ClaimForfeit, StoreError> {
        let (attacker, attacker_witness) = self.claim(attacker_id)?;
        let (defender, defender_witness) = self.claim(defender_id)?;
        Ok(ClaimForfeit {
            attacker_id,
            attacker,
            attacker_witness,
            defender_id,
            defender,
            defender_witness,
            fleet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::transition::{ExecutionContext, StateMachine};

    fn open_config() -> GameConfig {
        GameConfig {
            birth_difficulty_cutoff: [0xff; 32],
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_fresh_ledger_matches_genesis() {
        let config = open_config();
        let machine = StateMachine::new(config.clone()).unwrap();
        assert_eq!(PlanetLedger::for_config(&config).roots(), *machine.state());
    }

    #[test]
    fn test_ledger_tracks_core_roots() {
        let config = open_config();
        let mut machine = StateMachine::new(config.clone()).unwrap();
        let mut ledger = PlanetLedger::for_config(&config);

        for (i, (x, y)) in [(3, 7), (10, 20), (500, 42)].into_iter().enumerate() {
            let player = PlayerId::from_address(format!("player-{}", i).as_bytes());
            let req = ledger.create_planet(&player, x, y, (i % 3) as u8);
            let outcome = machine.create_planet(&ExecutionContext::new(player, 0), &req).unwrap();
            ledger.absorb(&outcome.delta);
            assert_eq!(ledger.roots(), *machine.state());
        }

        let player = PlayerId::from_address(b"player-1");
        assert_eq!(ledger.planet_of(&player).map(|(id, _)| id), Some(1));
        assert!(ledger.is_location_taken(&location_hash(&Coordinate::new(10, 20))));
    }

    #[test]
    fn test_unknown_planet() {
        let ledger = PlanetLedger::new(11);
        let owner = PlayerId::new([1; 32]);
        assert_eq!(
            ledger.set_defense(4, FleetDefense::new(owner, 1, 1, 1)),
            Err(StoreError::UnknownPlanet(4))
        );
    }
}
