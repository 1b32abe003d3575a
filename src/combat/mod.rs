//! Encounter messaging
//!
//! The boundary between the simulation core and its collaborators:
//! - Outbound event queue (`Outbox`)
//! - Inbound skill selection event
//! - Structured encounter log

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::{Outbox, SkillSelection};
use log::EncounterLog;

/// Registers the messaging resources and the inbound selection event
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SkillSelection>()
            .init_resource::<Outbox>()
            .init_resource::<EncounterLog>();
    }
}
