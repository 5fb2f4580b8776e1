//! Battle Resolution
//!
//! Each unit type beats exactly one other:
//!
//! ```text
//!   battleships ──beat──▶ destroyers ──beat──▶ carriers
//!        ▲                                        │
//!        └──────────────────beat──────────────────┘
//! ```
//!
//! Each matchup contributes `attacker units x weight - defender units x weight`
//! along one edge of the cycle. A non-negative total resolves to the
//! defender, so ties go to the defender.

use serde::{Serialize, Deserialize};
use subtle::{Choice, ConditionallySelectable};

use crate::game::config::FleetWeights;
use crate::game::planet::{AttackFleet, FleetDefense, PlayerId};

/// Breakdown of a resolved battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Attacker battleships vs defender destroyers.
    pub battleship_advantage: i64,
    /// Attacker destroyers vs defender carriers.
    pub destroyer_advantage: i64,
    /// Attacker carriers vs defender battleships.
    pub carrier_advantage: i64,
    /// Sum of the three advantages.
    pub score: i64,
    /// Winning player.
    pub winner: PlayerId,
}

impl BattleReport {
    /// Did the defender hold?
    pub fn defender_won(&self) -> bool {
        self.score >= 0
    }
}

/// Resolve a battle and return the full breakdown.
pub fn resolve_battle(attack: &AttackFleet, defense: &FleetDefense, weights: &FleetWeights) -> BattleReport {
    // Saturating so oversized configured weights cannot panic.
    let bs = |count: u32| (count as i64).saturating_mul(weights.battleship);
    let ds = |count: u32| (count as i64).saturating_mul(weights.destroyer);
    let cr = |count: u32| (count as i64).saturating_mul(weights.carrier);

    let battleship_advantage = bs(attack.battleships).saturating_sub(ds(defense.destroyers));
    let destroyer_advantage = ds(attack.destroyers).saturating_sub(cr(defense.carriers));
    let carrier_advantage = cr(attack.carriers).saturating_sub(bs(defense.battleships));
    let score = battleship_advantage
        .saturating_add(destroyer_advantage)
        .saturating_add(carrier_advantage);

    BattleReport {
        battleship_advantage,
        destroyer_advantage,
        carrier_advantage,
        score,
        winner: select_winner(score, &defense.owner, &attack.attacker),
    }
}

/// Winner of a battle between `attack` and `defense`.
pub fn calculate_winner(attack: &AttackFleet, defense: &FleetDefense, weights: &FleetWeights) -> PlayerId {
    resolve_battle(attack, defense, weights).winner
}

/// Pick `defender` when `score >= 0`, else `attacker`, without branching on
/// the score.
fn select_winner(score: i64, defender: &PlayerId, attacker: &PlayerId) -> PlayerId {
    let attacker_wins = Choice::from(((score as u64) >> 63) as u8);
    let mut winner = [0u8; 32];
    for (i, byte) in winner.iter_mut().enumerate() {
        *byte = u8::conditional_select(&defender.0[i], &attacker.0[i], attacker_wins);
    }
    PlayerId::new(winner)
}
