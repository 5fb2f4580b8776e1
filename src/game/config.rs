//! Game Configuration
//!
//! Every rule constant lives here. `Default` is the authoritative set;
//! deployments may override it from `ARMADA_*` environment variables or a
//! JSON file.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::Hash32;
use crate::proof::merkle::MAX_INDEXED_DEPTH;

/// Maximum number of planets in a game.
pub const MAX_PLANETS: u64 = 1000;

/// Grid side length; coordinates lie in `[0, GRID_SIZE)`.
pub const GRID_SIZE: i64 = 10_000;

/// Details tree depth (2048 leaf slots).
pub const DETAILS_TREE_DEPTH: usize = 11;

/// Rounds of re-hashing in the birth difficulty chain.
pub const BIRTH_HASH_ROUNDS: u32 = 16;

/// Birth difficulty cutoff (big-endian): about one coordinate in 256 qualifies.
pub const BIRTH_DIFFICULTY_CUTOFF: Hash32 = {
    let mut cutoff = [0u8; 32];
    cutoff[0] = 0x01;
    cutoff
};

/// Forfeit window: 24 hours in milliseconds.
pub const FORFEIT_CLAIM_DURATION: u64 = 86_400_000;

/// Points for winning a battle.
pub const WIN_POINTS: i64 = 20;

/// Points lost for losing a battle.
pub const LOSE_POINTS: i64 = 10;

/// Points for a forfeit claimed by the attacker.
pub const FORFEIT_POINTS: i64 = 10;

/// Per-unit combat weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetWeights {
    /// Battleship weight.
    pub battleship: i64,
    /// Destroyer weight.
    pub destroyer: i64,
    /// Carrier weight.
    pub carrier: i64,
}

impl Default for FleetWeights {
    fn default() -> Self {
        Self {
            battleship: 4,
            destroyer: 2,
            carrier: 6,
        }
    }
}

/// Configuration for rule checks and scoring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Planet capacity.
    pub max_planets: u64,
    /// Grid side length.
    pub grid_size: i64,
    /// Details tree depth.
    pub details_tree_depth: usize,
    /// Birth difficulty chain length.
    pub birth_hash_rounds: u32,
    /// Birth difficulty cutoff (exclusive, big-endian).
    pub birth_difficulty_cutoff: Hash32,
    /// Defense fleet strength cap.
    pub max_defense_strength: u64,
    /// Attack fleet strength cap.
    pub max_attack_strength: u64,
    /// Combat weights.
    pub weights: FleetWeights,
    /// Points for a win.
    pub win_points: i64,
    /// Points for a loss (subtracted).
    pub lose_points: i64,
    /// Points for a forfeit claim.
    pub forfeit_points: i64,
    /// Time after launch before the attacker may claim a forfeit.
    pub forfeit_claim_duration: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_planets: MAX_PLANETS,
            grid_size: GRID_SIZE,
            details_tree_depth: DETAILS_TREE_DEPTH,
            birth_hash_rounds: BIRTH_HASH_ROUNDS,
            birth_difficulty_cutoff: BIRTH_DIFFICULTY_CUTOFF,
            max_defense_strength: 1000,
            max_attack_strength: 1000,
            weights: FleetWeights::default(),
            win_points: WIN_POINTS,
            lose_points: LOSE_POINTS,
            forfeit_points: FORFEIT_POINTS,
            forfeit_claim_duration: FORFEIT_CLAIM_DURATION,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// Recognised: `ARMADA_MAX_PLANETS`, `ARMADA_GRID_SIZE`,
    /// `ARMADA_TREE_DEPTH`, `ARMADA_BIRTH_ROUNDS`, `ARMADA_BIRTH_CUTOFF` (hex),
    /// `ARMADA_MAX_DEFENSE`, `ARMADA_MAX_ATTACK`, `ARMADA_WIN_POINTS`,
    /// `ARMADA_LOSE_POINTS`, `ARMADA_FORFEIT_POINTS`, `ARMADA_FORFEIT_DURATION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        read_env("ARMADA_MAX_PLANETS", &mut config.max_planets)?;
        read_env("ARMADA_GRID_SIZE", &mut config.grid_size)?;
        read_env("ARMADA_TREE_DEPTH", &mut config.details_tree_depth)?;
        read_env("ARMADA_BIRTH_ROUNDS", &mut config.birth_hash_rounds)?;
        read_env("ARMADA_MAX_DEFENSE", &mut config.max_defense_strength)?;
        read_env("ARMADA_MAX_ATTACK", &mut config.max_attack_strength)?;
        read_env("ARMADA_WIN_POINTS", &mut config.win_points)?;
        read_env("ARMADA_LOSE_POINTS", &mut config.lose_points)?;
        read_env("ARMADA_FORFEIT_POINTS", &mut config.forfeit_points)?;
        read_env("ARMADA_FORFEIT_DURATION", &mut config.forfeit_claim_duration)?;

        if let Ok(raw) = std::env::var("ARMADA_BIRTH_CUTOFF") {
            config.birth_difficulty_cutoff = parse_cutoff(&raw).ok_or(ConfigError::InvalidEnv {
                var: "ARMADA_BIRTH_CUTOFF",
                value: raw,
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.details_tree_depth == 0 || self.details_tree_depth > MAX_INDEXED_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "tree depth {} outside 1..={}",
                self.details_tree_depth, MAX_INDEXED_DEPTH
            )));
        }
        if (self.max_planets as u128) > (1u128 << self.details_tree_depth) {
            return Err(ConfigError::Invalid(format!(
                "{} planets do not fit a tree of depth {}",
                self.max_planets, self.details_tree_depth
            )));
        }
        if self.grid_size <= 0 {
            return Err(ConfigError::Invalid("grid size must be positive".into()));
        }
        if self.max_defense_strength == 0 || self.max_attack_strength == 0 {
            return Err(ConfigError::Invalid("fleet caps must be positive".into()));
        }
        let FleetWeights { battleship, destroyer, carrier } = self.weights;
        if battleship < 0 || destroyer < 0 || carrier < 0 {
            return Err(ConfigError::Invalid(format!(
                "negative fleet weight in {:?}",
                self.weights
            )));
        }
        if self.win_points < 0 || self.lose_points < 0 || self.forfeit_points < 0 {
            return Err(ConfigError::Invalid("point increments must be non-negative".into()));
        }
        Ok(())
    }
}

fn read_env<T: std::str::FromStr>(var: &'static str, slot: &mut T) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(var) {
        *slot = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value })?;
    }
    Ok(())
}

fn parse_cutoff(raw: &str) -> Option<Hash32> {
    let bytes = hex::decode(raw.trim().trim_start_matches("0x")).ok()?;
    bytes.try_into().ok()
}
