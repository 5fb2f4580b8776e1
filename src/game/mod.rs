//! Game Logic Module
//!
//! Rules and the transition state machine. 100% deterministic: no clock,
//! no randomness, no I/O. Time arrives through [`ExecutionContext`].
//!
//! ## Module Structure
//!
//! - `planet`: Player ids, coordinates, factions, fleets, planet records
//! - `config`: Rule constants and their overrides
//! - `rules`: Pure precondition predicates
//! - `battle`: Rock-paper-scissors battle resolution
//! - `events`: Events emitted by committed transitions
//! - `error`: Transition rejection reasons
//! - `transition`: The five transitions and the committed roots

pub mod planet;
pub mod config;
pub mod rules;
pub mod battle;
pub mod events;
pub mod error;
pub mod transition;

// Re-export key types
pub use planet::{AttackFleet, Coordinate, Faction, Fleet, FleetDefense, PlanetRecord, PlayerId};
pub use config::{ConfigError, FleetWeights, GameConfig};
pub use battle::{calculate_winner, resolve_battle, BattleReport};
pub use events::{EventKind, GameEvent};
pub use error::TransitionError;
pub use transition::{
    ArmadaState, ClaimForfeit, CreatePlanet, ExecutionContext, LaunchAttack, ResolveAttack, SetDefense,
    StateDelta, StateMachine, Transition, TransitionOutcome,
};
