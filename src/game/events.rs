//! Transition Events
//!
//! Each successful transition emits exactly one event carrying a single hash
//! that identifies the affected planet or engagement.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::Hash32;

/// Event kind, one per transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Payload: location hash of the new planet.
    PlanetCreated = 0,
    /// Payload: location hash of the defended planet.
    DefenseSet = 1,
    /// Payload: attack fleet commitment.
    AttackLaunched = 2,
    /// Payload: commitment of the resolved attack.
    BattleConcluded = 3,
    /// Payload: commitment of the forfeited attack.
    ForfeitClaimed = 4,
}

impl EventKind {
    /// Published event name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::PlanetCreated => "Planet Created",
            EventKind::DefenseSet => "Defense Set",
            EventKind::AttackLaunched => "Attack Launched",
            EventKind::BattleConcluded => "Battle Concluded",
            EventKind::ForfeitClaimed => "Forfeit Claimed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Emitted notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Which transition produced it.
    pub kind: EventKind,
    /// Identifying hash.
    pub payload: Hash32,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(kind: EventKind, payload: Hash32) -> Self {
        Self { kind, payload }
    }

    /// Create planet created event.
    pub fn planet_created(location_hash: Hash32) -> Self {
        Self::new(EventKind::PlanetCreated, location_hash)
    }

    /// Create defense set event.
    pub fn defense_set(location_hash: Hash32) -> Self {
        Self::new(EventKind::DefenseSet, location_hash)
    }

    /// Create attack launched event.
    pub fn attack_launched(attack_commitment: Hash32) -> Self {
        Self::new(EventKind::AttackLaunched, attack_commitment)
    }

    /// Create battle concluded event.
    pub fn battle_concluded(attack_commitment: Hash32) -> Self {
        Self::new(EventKind::BattleConcluded, attack_commitment)
    }

    /// Create forfeit claimed event.
    pub fn forfeit_claimed(attack_commitment: Hash32) -> Self {
        Self::new(EventKind::ForfeitClaimed, attack_commitment)
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind, hex::encode(self.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(GameEvent::planet_created([0; 32]).kind.name(), "Planet Created");
        assert_eq!(GameEvent::defense_set([0; 32]).kind.name(), "Defense Set");
        assert_eq!(GameEvent::attack_launched([0; 32]).kind.name(), "Attack Launched");
        assert_eq!(GameEvent::battle_concluded([0; 32]).kind.name(), "Battle Concluded");
        assert_eq!(GameEvent::forfeit_claimed([0; 32]).kind.name(), "Forfeit Claimed");
    }

    #[test]
    fn test_event_json_shape() {
        let event = GameEvent::attack_launched([7; 32]);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("AttackLaunched"));
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
