//! State Transitions
//!
//! The five externally callable transitions. Each one is a pure function of
//! (committed roots, request, execution context):
//!
//! 1. Every precondition is checked against the committed roots, in order,
//!    on `&self`. Nothing is written while checking.
//! 2. The new roots are computed into a fresh [`ArmadaState`].
//! 3. Only then is the state replaced, in one assignment.
//!
//! A rejected call therefore leaves no trace. Witnesses double as
//! optimistic-concurrency tokens: one computed against an older root fails
//! with [`TransitionError::WitnessRootMismatch`] and the caller must refresh it.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::{short_hex, Hash32, EMPTY};
use crate::game::battle::{resolve_battle, BattleReport};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::error::TransitionError;
use crate::game::events::GameEvent;
use crate::game::planet::{AttackFleet, Coordinate, FleetDefense, PlanetRecord, PlayerId};
use crate::game::rules;
use crate::proof::commitment::{location_hash, Commitment};
use crate::proof::merkle::{AuthenticatedTree, LeafUpdate, MerkleError, MerkleWitness};
use crate::proof::nullifier::{AuthenticatedMap, NullifierKind};

// =============================================================================
// STATE AND CONTEXT
// =============================================================================

/// Everything the core persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmadaState {
    /// Planets created so far; also the next free leaf index.
    pub planet_count: u64,
    /// Root of the planet details tree.
    pub details_root: Hash32,
    /// Root of the location nullifier map.
    pub location_nullifier_root: Hash32,
    /// Root of the player nullifier map.
    pub player_nullifier_root: Hash32,
}

impl ArmadaState {
    /// State of a game with no planets.
    pub fn genesis(tree: &AuthenticatedTree, map: &AuthenticatedMap) -> Self {
        Self {
            planet_count: 0,
            details_root: tree.empty_root(),
            location_nullifier_root: map.empty_root(),
            player_nullifier_root: map.empty_root(),
        }
    }

    /// Canonical binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a binary snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Values supplied by the execution layer for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Authenticated caller.
    pub caller: PlayerId,
    /// Current time; the core never reads a clock.
    pub timestamp: u64,
}

impl ExecutionContext {
    /// Create a context.
    pub fn new(caller: PlayerId, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Create a home planet for the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlanet {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
    /// Raw faction index.
    pub faction: u8,
    /// Details-tree witness for the next free slot.
    pub details_witness: MerkleWitness,
    /// Location-map witness for the coordinate's hash.
    pub location_witness: MerkleWitness,
    /// Player-map witness for the caller.
    pub player_witness: MerkleWitness,
}

/// Replace the defense of the caller's planet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDefense {
    /// New defense fleet.
    pub defense: FleetDefense,
    /// Planet index.
    pub planet_id: u64,
    /// Claimed current record.
    pub record: PlanetRecord,
    /// Details-tree witness for the planet.
    pub witness: MerkleWitness,
}

/// Launch an attack from the caller's planet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchAttack {
    /// Attacking fleet.
    pub fleet: AttackFleet,
    /// Attacker planet index.
    pub attacker_id: u64,
    /// Claimed attacker record.
    pub attacker: PlanetRecord,
    /// Details-tree witness for the attacker.
    pub attacker_witness: MerkleWitness,
    /// Defender planet index.
    pub defender_id: u64,
    /// Claimed defender record.
    pub defender: PlanetRecord,
    /// Details-tree witness for the defender.
    pub defender_witness: MerkleWitness,
}

/// Resolve the attack pending against the caller's planet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveAttack {
    /// Attacker planet index.
    pub attacker_id: u64,
    /// Claimed attacker record.
    pub attacker: PlanetRecord,
    /// Details-tree witness for the attacker.
    pub attacker_witness: MerkleWitness,
    /// Defender planet index.
    pub defender_id: u64,
    /// Claimed defender record.
    pub defender: PlanetRecord,
    /// Details-tree witness for the defender.
    pub defender_witness: MerkleWitness,
    /// Revealed defense.
    pub defense: FleetDefense,
    /// Revealed attack.
    pub fleet: AttackFleet,
}

/// Claim a forfeit on an attack the defender never resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimForfeit {
    /// Attacker planet index.
    pub attacker_id: u64,
    /// Claimed attacker record.
    pub attacker: PlanetRecord,
    /// Details-tree witness for the attacker.
    pub attacker_witness: MerkleWitness,
    /// Defender planet index.
    pub defender_id: u64,
    /// Claimed defender record.
    pub defender: PlanetRecord,
    /// Details-tree witness for the defender.
    pub defender_witness: MerkleWitness,
    /// Revealed attack.
    pub fleet: AttackFleet,
}

/// Any of the five transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// See [`CreatePlanet`].
    CreatePlanet(CreatePlanet),
    /// See [`SetDefense`].
    SetDefense(SetDefense),
    /// See [`LaunchAttack`].
    LaunchAttack(LaunchAttack),
    /// See [`ResolveAttack`].
    ResolveAttack(ResolveAttack),
    /// See [`ClaimForfeit`].
    ClaimForfeit(ClaimForfeit),
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Leaf contents written by a transition, for off-process stores to mirror.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Records written, in write order.
    pub records: Vec<(u64, PlanetRecord)>,
    /// Nullifier keys filled.
    pub nullified: Vec<(NullifierKind, Hash32)>,
}

/// Result of a committed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    /// Emitted event.
    pub event: GameEvent,
    /// Leaves written.
    pub delta: StateDelta,
    /// Battle breakdown (resolve only).
    pub battle: Option<BattleReport>,
}

/// Transition fully checked but not yet committed.
type Planned = (ArmadaState, TransitionOutcome);

// =============================================================================
// STATE MACHINE
// =============================================================================

/// The trusted core: committed roots plus the rules that guard them.
#[derive(Clone, Debug)]
pub struct StateMachine {
    config: GameConfig,
    tree: AuthenticatedTree,
    map: AuthenticatedMap,
    state: ArmadaState,
}

impl StateMachine {
    /// Start a new game.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let tree = Self::details_tree(&config)?;
        let map = AuthenticatedMap::new();
        let state = ArmadaState::genesis(&tree, &map);
        Ok(Self { config, tree, map, state })
    }

    /// Resume from persisted roots.
    pub fn from_state(config: GameConfig, state: ArmadaState) -> Result<Self, ConfigError> {
        let tree = Self::details_tree(&config)?;
        Ok(Self { config, tree, map: AuthenticatedMap::new(), state })
    }

    fn details_tree(config: &GameConfig) -> Result<AuthenticatedTree, ConfigError> {
        config.validate()?;
        AuthenticatedTree::new(config.details_tree_depth)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Committed state.
    pub fn state(&self) -> &ArmadaState {
        &self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Planets created so far.
    pub fn planet_count(&self) -> u64 {
        self.state.planet_count
    }

    /// Dispatch any transition.
    pub fn apply(&mut self, ctx: &ExecutionContext, transition: &Transition) -> Result<TransitionOutcome, TransitionError> {
        match transition {
            Transition::CreatePlanet(req) => self.create_planet(ctx, req),
            Transition::SetDefense(req) => self.set_defense(ctx, req),
            Transition::LaunchAttack(req) => self.launch_attack(ctx, req),
            Transition::ResolveAttack(req) => self.resolve_attack(ctx, req),
            Transition::ClaimForfeit(req) => self.claim_forfeit(ctx, req),
        }
    }

    /// Create a home planet for the caller.
    pub fn create_planet(&mut self, ctx: &ExecutionContext, req: &CreatePlanet) -> Result<TransitionOutcome, TransitionError> {
        let planned = self.plan_create_planet(ctx, req);
        self.finish("create_planet", ctx, planned)
    }

    /// Replace the defense of the caller's planet.
    pub fn set_defense(&mut self, ctx: &ExecutionContext, req: &SetDefense) -> Result<TransitionOutcome, TransitionError> {
        let planned = self.plan_set_defense(ctx, req);
        self.finish("set_defense", ctx, planned)
    }

    /// Launch an attack from the caller's planet.
    pub fn launch_attack(&mut self, ctx: &ExecutionContext, req: &LaunchAttack) -> Result<TransitionOutcome, TransitionError> {
        let planned = self.plan_launch_attack(ctx, req);
        self.finish("launch_attack", ctx, planned)
    }

    /// Resolve the attack pending against the caller's planet.
    pub fn resolve_attack(&mut self, ctx: &ExecutionContext, req: &ResolveAttack) -> Result<TransitionOutcome, TransitionError> {
        let planned = self.plan_resolve_attack(ctx, req);
        self.finish("resolve_attack", ctx, planned)
    }

    /// Claim a forfeit on an unresolved attack.
    pub fn claim_forfeit(&mut self, ctx: &ExecutionContext, req: &ClaimForfeit) -> Result<TransitionOutcome, TransitionError> {
        let planned = self.plan_claim_forfeit(ctx, req);
        self.finish("claim_forfeit", ctx, planned)
    }

    /// Single commit point for every transition.
    fn finish(
        &mut self,
        name: &'static str,
        ctx: &ExecutionContext,
        planned: Result<Planned, TransitionError>,
    ) -> Result<TransitionOutcome, TransitionError> {
        match planned {
            Ok((next, outcome)) => {
                self.state = next;
                info!(
                    caller = %ctx.caller,
                    planets = next.planet_count,
                    details_root = %short_hex(&next.details_root),
                    "{}: {}", name, outcome.event
                );
                Ok(outcome)
            }
            Err(err) => {
                debug!(caller = %ctx.caller, "{} rejected: {}", name, err);
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Planning (read-only)
    // -------------------------------------------------------------------------

    fn plan_create_planet(&self, ctx: &ExecutionContext, req: &CreatePlanet) -> Result<Planned, TransitionError> {
        let state = &self.state;
        let config = &self.config;

        rules::verify_capacity(state.planet_count, config)?;
        rules::verify_coordinate_bounds(req.x, req.y, config)?;

        let location = location_hash(&Coordinate::new(req.x, req.y));
        self.map
            .prove_absent(&state.location_nullifier_root, &location, &req.location_witness)
            .map_err(|e| absence_error(e, TransitionError::LocationAlreadyTaken))?;

        rules::verify_birth_suitability(&location, config)?;
        let faction = rules::verify_faction(req.faction)?;

        self.map
            .prove_absent(&state.player_nullifier_root, ctx.caller.as_bytes(), &req.player_witness)
            .map_err(|e| absence_error(e, TransitionError::PlayerAlreadyHasPlanet))?;

        let record = PlanetRecord::newborn(ctx.caller, location, faction);
        let planet_id = state.planet_count;
        let details_root = self.tree.verify_and_update(
            &state.details_root,
            planet_id,
            &req.details_witness,
            &EMPTY,
            &record.commitment(),
        )?;

        let next = ArmadaState {
            planet_count: planet_id + 1,
            details_root,
            location_nullifier_root: self.map.mark_filled(&req.location_witness),
            player_nullifier_root: self.map.mark_filled(&req.player_witness),
        };
        let outcome = TransitionOutcome {
            event: GameEvent::planet_created(location),
            delta: StateDelta {
                records: vec![(planet_id, record)],
                nullified: vec![
                    (NullifierKind::Location, location),
                    (NullifierKind::Player, *ctx.caller.as_bytes()),
                ],
            },
            battle: None,
        };
        Ok((next, outcome))
    }

    fn plan_set_defense(&self, ctx: &ExecutionContext, req: &SetDefense) -> Result<Planned, TransitionError> {
        let root = &self.state.details_root;
        self.verify_record(root, req.planet_id, &req.record, &req.witness)?;

        if req.record.owner != ctx.caller || req.defense.owner != req.record.owner {
            return Err(TransitionError::NotOwner { caller: ctx.caller });
        }
        if req.record.is_under_attack() {
            return Err(TransitionError::PlanetUnderAttack);
        }
        rules::verify_fleet_strength(&req.defense, self.config.max_defense_strength)?;

        let updated = PlanetRecord {
            defense_commitment: req.defense.commitment(),
            ..req.record
        };
        let details_root = self.tree.verify_and_update(
            root,
            req.planet_id,
            &req.witness,
            &req.record.commitment(),
            &updated.commitment(),
        )?;

        let outcome = TransitionOutcome {
            event: GameEvent::defense_set(updated.location_hash),
            delta: StateDelta {
                records: vec![(req.planet_id, updated)],
                nullified: Vec::new(),
            },
            battle: None,
        };
        Ok((self.with_details_root(details_root), outcome))
    }

    fn plan_launch_attack(&self, ctx: &ExecutionContext, req: &LaunchAttack) -> Result<Planned, TransitionError> {
        let root = &self.state.details_root;
        let (attacker, defender, fleet) = (&req.attacker, &req.defender, &req.fleet);

        self.verify_record(root, req.attacker_id, attacker, &req.attacker_witness)?;
        self.verify_record(root, req.defender_id, defender, &req.defender_witness)?;

        if attacker.owner != ctx.caller {
            return Err(TransitionError::NotOwner { caller: ctx.caller });
        }
        if !attacker.has_defense() {
            return Err(TransitionError::PlanetHasNoDefense);
        }
        if attacker.owner == defender.owner {
            return Err(TransitionError::CannotAttackSelf);
        }
        rules::verify_fleet_strength(fleet, self.config.max_attack_strength)?;
        if !defender.has_defense() {
            return Err(TransitionError::PlanetHasNoDefense);
        }
        if defender.is_under_attack() {
            return Err(TransitionError::PlanetUnderAttack);
        }

        if fleet.attacker != ctx.caller {
            return Err(TransitionError::NotAttacker);
        }
        if fleet.faction != attacker.faction {
            return Err(TransitionError::InvalidFaction(fleet.faction.index()));
        }
        if fleet.launch_timestamp != ctx.timestamp {
            return Err(TransitionError::LaunchTimestampMismatch {
                claimed: fleet.launch_timestamp,
                now: ctx.timestamp,
            });
        }

        let attack_commitment = fleet.commitment();
        let updated = PlanetRecord {
            incoming_attack_commitment: attack_commitment,
            ..*defender
        };
        let details_root = self.tree.verify_and_update(
            root,
            req.defender_id,
            &req.defender_witness,
            &defender.commitment(),
            &updated.commitment(),
        )?;

        let outcome = TransitionOutcome {
            event: GameEvent::attack_launched(attack_commitment),
            delta: StateDelta {
                records: vec![(req.defender_id, updated)],
                nullified: Vec::new(),
            },
            battle: None,
        };
        Ok((self.with_details_root(details_root), outcome))
    }

    fn plan_resolve_attack(&self, ctx: &ExecutionContext, req: &ResolveAttack) -> Result<Planned, TransitionError> {
        let root = &self.state.details_root;
        let (attacker, defender) = (&req.attacker, &req.defender);

        self.verify_record(root, req.attacker_id, attacker, &req.attacker_witness)?;
        self.verify_record(root, req.defender_id, defender, &req.defender_witness)?;

        if defender.owner != ctx.caller {
            return Err(TransitionError::NotOwner { caller: ctx.caller });
        }
        if req.defense.commitment() != defender.defense_commitment {
            return Err(TransitionError::DefenseCommitmentMismatch);
        }
        let attack_commitment = req.fleet.commitment();
        if attack_commitment != defender.incoming_attack_commitment {
            return Err(TransitionError::AttackCommitmentMismatch);
        }
        if req.fleet.attacker != attacker.owner {
            return Err(TransitionError::NotAttacker);
        }
        if attacker.owner == defender.owner {
            return Err(TransitionError::CannotAttackSelf);
        }

        let report = resolve_battle(&req.fleet, &req.defense, &self.config.weights);
        let award = |owner: &PlayerId| {
            if report.winner == *owner {
                self.config.win_points
            } else {
                -self.config.lose_points
            }
        };

        let updated_defender = PlanetRecord {
            points: add_points(defender.points, award(&defender.owner))?,
            incoming_attack_commitment: EMPTY,
            ..*defender
        };
        let updated_attacker = PlanetRecord {
            points: add_points(attacker.points, award(&attacker.owner))?,
            ..*attacker
        };

        let details_root = self.tree.update_pair(
            root,
            LeafUpdate {
                index: req.defender_id,
                witness: &req.defender_witness,
                old_leaf: defender.commitment(),
                new_leaf: updated_defender.commitment(),
            },
            LeafUpdate {
                index: req.attacker_id,
                witness: &req.attacker_witness,
                old_leaf: attacker.commitment(),
                new_leaf: updated_attacker.commitment(),
            },
        )?;

        debug!(
            score = report.score,
            winner = %report.winner,
            "battle resolved for attack {}", short_hex(&attack_commitment)
        );

        let outcome = TransitionOutcome {
            event: GameEvent::battle_concluded(attack_commitment),
            delta: StateDelta {
                records: vec![(req.defender_id, updated_defender), (req.attacker_id, updated_attacker)],
                nullified: Vec::new(),
            },
            battle: Some(report),
        };
        Ok((self.with_details_root(details_root), outcome))
    }

    fn plan_claim_forfeit(&self, ctx: &ExecutionContext, req: &ClaimForfeit) -> Result<Planned, TransitionError> {
        let root = &self.state.details_root;
        let (attacker, defender, fleet) = (&req.attacker, &req.defender, &req.fleet);

        self.verify_record(root, req.attacker_id, attacker, &req.attacker_witness)?;
        self.verify_record(root, req.defender_id, defender, &req.defender_witness)?;

        let attack_commitment = fleet.commitment();
        if attack_commitment != defender.incoming_attack_commitment {
            return Err(TransitionError::AttackCommitmentMismatch);
        }
        if fleet.attacker != ctx.caller {
            return Err(TransitionError::NotAttacker);
        }
        if attacker.owner != ctx.caller {
            return Err(TransitionError::NotOwner { caller: ctx.caller });
        }

        let elapsed = ctx.timestamp.saturating_sub(fleet.launch_timestamp);
        if elapsed < self.config.forfeit_claim_duration {
            return Err(TransitionError::ForfeitWindowNotElapsed {
                elapsed,
                required: self.config.forfeit_claim_duration,
            });
        }

        // Clearing the pending attack closes the engagement, so the forfeit
        // pays out once.
        let updated_defender = PlanetRecord {
            incoming_attack_commitment: EMPTY,
            ..*defender
        };
        let updated_attacker = PlanetRecord {
            points: add_points(attacker.points, self.config.forfeit_points)?,
            ..*attacker
        };

        let details_root = self.tree.update_pair(
            root,
            LeafUpdate {
                index: req.defender_id,
                witness: &req.defender_witness,
                old_leaf: defender.commitment(),
                new_leaf: updated_defender.commitment(),
            },
            LeafUpdate {
                index: req.attacker_id,
                witness: &req.attacker_witness,
                old_leaf: attacker.commitment(),
                new_leaf: updated_attacker.commitment(),
            },
        )?;

        let outcome = TransitionOutcome {
            event: GameEvent::forfeit_claimed(attack_commitment),
            delta: StateDelta {
                records: vec![(req.defender_id, updated_defender), (req.attacker_id, updated_attacker)],
                nullified: Vec::new(),
            },
            battle: None,
        };
        Ok((self.with_details_root(details_root), outcome))
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn verify_record(
        &self,
        root: &Hash32,
        planet_id: u64,
        record: &PlanetRecord,
        witness: &MerkleWitness,
    ) -> Result<(), TransitionError> {
        self.tree
            .verify_leaf(root, planet_id, witness, &record.commitment())
            .map_err(TransitionError::from)
    }

    fn with_details_root(&self, details_root: Hash32) -> ArmadaState {
        ArmadaState {
            details_root,
            ..self.state
        }
    }
}

/// Map a failed absence proof to the rule it enforces. Shape errors stay
/// shape errors.
fn absence_error(err: MerkleError, taken: TransitionError) -> TransitionError {
    match err {
        MerkleError::RootMismatch | MerkleError::KeyMismatch { .. } => taken,
        other => TransitionError::MalformedWitness(other),
    }
}

fn add_points(points: i64, delta: i64) -> Result<i64, TransitionError> {
    points.checked_add(delta).ok_or(TransitionError::PointsOverflow)
}
