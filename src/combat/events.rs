//! Encounter events
//!
//! Outbound notifications are queued in the `Outbox` resource and drained by
//! whoever sits outside the core (renderer, HUD, headless runner). The only
//! inbound message is `SkillSelection`, the answer to a selection request.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::encounter::enemy_config::EnemyKind;
use crate::encounter::skills::{Skill, SkillKind};

/// Notifications published by the simulation core
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterEvent {
    EnemySpawned {
        entity: Entity,
        kind: EnemyKind,
        elite: bool,
        position: Vec2,
    },
    EnemyDied {
        entity: Entity,
        kind: EnemyKind,
        elite: bool,
    },
    PlayerDamaged {
        health: f32,
        max_health: f32,
    },
    PlayerDied,
    LeveledUp {
        level: u32,
    },
    ExperienceChanged {
        experience: u32,
        level: u32,
    },
    LootGranted {
        value: u32,
        total: u32,
    },
    /// The simulation is suspended until a `SkillSelection` arrives.
    SkillSelectionRequested(SelectionRequest),
    SkillUnlocked {
        skill: SkillKind,
    },
    SkillUpgraded {
        skill: SkillKind,
        level: u32,
    },
    EncounterWon {
        level: u32,
    },
}

/// Queue of outbound events, oldest first
#[derive(Resource, Default, Debug)]
pub struct Outbox {
    events: VecDeque<EncounterEvent>,
}

impl Outbox {
    pub fn push(&mut self, event: EncounterEvent) {
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<EncounterEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncounterEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One choosable entry in a selection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillOffer {
    pub skill: SkillKind,
    pub level: u32,
    pub max_level: u32,
    pub can_unlock: bool,
    pub can_upgrade: bool,
}

impl SkillOffer {
    /// The answer that picks this offer.
    pub fn selection(&self) -> SkillSelection {
        SkillSelection {
            skill: self.skill,
            can_unlock: self.can_unlock,
            can_upgrade: self.can_upgrade,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.can_unlock || self.can_upgrade
    }
}

/// Snapshot of the skill pool handed to the selection collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub pool: Vec<Skill>,
    pub unlocked: Vec<SkillKind>,
    pub offers: Vec<SkillOffer>,
}

/// Inbound answer to a `SkillSelectionRequested` event
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillSelection {
    pub skill: SkillKind,
    pub can_unlock: bool,
    pub can_upgrade: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_drains_in_order() {
        let mut outbox = Outbox::default();
        outbox.push(EncounterEvent::LeveledUp { level: 2 });
        outbox.push(EncounterEvent::PlayerDied);

        assert_eq!(outbox.len(), 2);
        let drained = outbox.drain();
        assert_eq!(
            drained,
            vec![EncounterEvent::LeveledUp { level: 2 }, EncounterEvent::PlayerDied]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_offer_selection_copies_flags() {
        let offer = SkillOffer {
            skill: SkillKind::Venom,
            level: 0,
            max_level: 5,
            can_unlock: true,
            can_upgrade: false,
        };
        let selection = offer.selection();
        assert_eq!(selection.skill, SkillKind::Venom);
        assert!(selection.can_unlock);
        assert!(!selection.can_upgrade);
        assert!(offer.is_actionable());
    }
}
