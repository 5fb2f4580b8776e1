//! Transition Errors
//!
//! Every failed precondition aborts the whole transition with one of these.
//! Nothing is retried inside the core.

use thiserror::Error;

use crate::game::planet::PlayerId;
use crate::proof::merkle::MerkleError;

/// Reasons a transition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Planet capacity reached.
    #[error("planet capacity reached ({count}/{max})")]
    CapacityExceeded {
        /// Planets already created.
        count: u64,
        /// Capacity.
        max: u64,
    },

    /// Coordinate outside the grid.
    #[error("coordinate ({x}, {y}) outside grid of size {grid_size}")]
    CoordinateOutOfRange {
        /// Requested x.
        x: i64,
        /// Requested y.
        y: i64,
        /// Grid side length.
        grid_size: i64,
    },

    /// Location nullifier is already filled (or the absence proof is stale).
    #[error("a planet already exists at this location")]
    LocationAlreadyTaken,

    /// Coordinate fails the birth difficulty filter.
    #[error("location not suitable for planet birth")]
    LocationUnsuitable,

    /// Faction index out of range, or fleet faction differs from its planet.
    #[error("invalid faction {0}")]
    InvalidFaction(u8),

    /// Player nullifier is already filled (or the absence proof is stale).
    #[error("player already has a home planet")]
    PlayerAlreadyHasPlanet,

    /// Caller does not own the planet it acts for.
    #[error("player {caller} does not own this planet")]
    NotOwner {
        /// Calling player.
        caller: PlayerId,
    },

    /// Witness addresses a different leaf than required.
    #[error("witness addresses index {got}, expected {expected}")]
    WitnessIndexMismatch {
        /// Required index.
        expected: u64,
        /// Index derived from the witness.
        got: u64,
    },

    /// Claimed leaf does not match the committed root.
    #[error("claimed record does not match committed root")]
    WitnessRootMismatch,

    /// Witness has the wrong shape for the structure it targets.
    #[error("malformed witness: {0}")]
    MalformedWitness(MerkleError),

    /// Planet already has a pending attack.
    #[error("planet is already under attack")]
    PlanetUnderAttack,

    /// Planet has not set a defense.
    #[error("planet has no defense")]
    PlanetHasNoDefense,

    /// Fleet strength above the cap.
    #[error("fleet strength {strength} exceeds cap {cap}")]
    FleetTooStrong {
        /// Submitted strength.
        strength: u64,
        /// Applicable cap.
        cap: u64,
    },

    /// Attacker and defender belong to the same player.
    #[error("cannot attack your own planet")]
    CannotAttackSelf,

    /// Revealed attack fleet does not match the pending commitment.
    #[error("attack does not match commitment")]
    AttackCommitmentMismatch,

    /// Revealed defense does not match the stored commitment.
    #[error("defense does not match commitment")]
    DefenseCommitmentMismatch,

    /// Forfeit claimed before the window elapsed.
    #[error("forfeit window not elapsed: {elapsed} of {required}")]
    ForfeitWindowNotElapsed {
        /// Time since launch.
        elapsed: u64,
        /// Required wait.
        required: u64,
    },

    /// Caller (or named attacker planet) is not the fleet's attacker.
    #[error("not the attacker of this fleet")]
    NotAttacker,

    /// Fleet launch time differs from the execution timestamp.
    #[error("launch timestamp {claimed} does not match execution time {now}")]
    LaunchTimestampMismatch {
        /// Timestamp in the fleet.
        claimed: u64,
        /// Execution timestamp.
        now: u64,
    },

    /// Point arithmetic left the i64 range.
    #[error("points overflow")]
    PointsOverflow,
}

impl From<MerkleError> for TransitionError {
    fn from(err: MerkleError) -> Self {
        match err {
            MerkleError::IndexMismatch { expected, got } => Self::WitnessIndexMismatch { expected, got },
            MerkleError::RootMismatch => Self::WitnessRootMismatch,
            MerkleError::SameLeaf => Self::CannotAttackSelf,
            other => Self::MalformedWitness(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merkle_error_mapping() {
        assert_eq!(
            TransitionError::from(MerkleError::RootMismatch),
            TransitionError::WitnessRootMismatch
        );
        assert_eq!(
            TransitionError::from(MerkleError::IndexMismatch { expected: 1, got: 2 }),
            TransitionError::WitnessIndexMismatch { expected: 1, got: 2 }
        );
        assert!(matches!(
            TransitionError::from(MerkleError::DepthMismatch { expected: 11, got: 3 }),
            TransitionError::MalformedWitness(_)
        ));
    }

    #[test]
    fn test_messages_name_the_check() {
        let err = TransitionError::FleetTooStrong { strength: 1500, cap: 1000 };
        assert_eq!(err.to_string(), "fleet strength 1500 exceeds cap 1000");
    }
}
