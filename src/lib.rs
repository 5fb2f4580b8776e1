//! # Dark Armada Verification Core
//!
//! Trusted state-transition core for Dark Armada, a hidden-information
//! planet-conquest game. The core stores only roots; all planet data lives
//! off-process and is proven on every call.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DARK ARMADA CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── hash.rs     - Domain-separated SHA-256, sentinels       │
//! │                                                              │
//! │  proof/          - Authenticated structures                  │
//! │  ├── merkle.rs   - Fixed-depth tree, witnesses, pair update  │
//! │  ├── nullifier.rs- Depth-256 absence/fill maps               │
//! │  └── commitment.rs- Record, fleet and location hashes        │
//! │                                                              │
//! │  game/           - Rules and transitions (deterministic)     │
//! │  ├── planet.rs   - Players, factions, fleets, records        │
//! │  ├── config.rs   - Rule constants and overrides              │
//! │  ├── rules.rs    - Precondition predicates                   │
//! │  ├── battle.rs   - Battle resolution                         │
//! │  ├── events.rs   - Emitted events                            │
//! │  └── transition.rs- The five transitions                     │
//! │                                                              │
//! │  store/          - Untrusted witness store                   │
//! │  ├── shadow.rs   - Sparse Merkle mirror                      │
//! │  └── ledger.rs   - Records, nullifiers, request builders     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `proof/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time: the caller supplies the timestamp
//! - No randomness
//!
//! Given identical roots, request and context, a transition produces
//! **identical roots and events** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod proof;
pub mod game;
pub mod store;

// Re-export commonly used types
pub use core::hash::{Hash32, EMPTY, FILLED};
pub use proof::{AuthenticatedMap, AuthenticatedTree, MerkleError, MerkleWitness};
pub use game::{
    AttackFleet, ArmadaState, ExecutionContext, Faction, FleetDefense, GameConfig, GameEvent, PlanetRecord,
    PlayerId, StateMachine, Transition, TransitionError, TransitionOutcome,
};
pub use store::PlanetLedger;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
