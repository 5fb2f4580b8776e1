//! Witness Store
//!
//! The untrusted side of the protocol. The core keeps only roots; this
//! module keeps the leaves, hands out witnesses, and follows the core by
//! absorbing each committed [`StateDelta`](crate::game::StateDelta).
//! Nothing here is trusted: a wrong witness is simply rejected by the core.

pub mod shadow;
pub mod ledger;

pub use shadow::{index_key, ShadowTree};
pub use ledger::{PlanetLedger, StoreError};
