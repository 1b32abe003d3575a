//! HUD snapshot
//!
//! A per-frame read model for renderers and tests.

use bevy::prelude::*;

use super::components::*;
use super::progression::Progression;
use super::spawn_director::EnemyRoster;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatantView {
    pub entity: Entity,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// `health / max_health`, for health bars
    pub health_fraction: f32,
    pub state: CombatantState,
    pub elite: bool,
}

impl CombatantView {
    fn of(entity: Entity, combatant: &Combatant, transform: &Transform, elite: bool) -> Self {
        Self {
            entity,
            position: transform.translation.truncate(),
            health: combatant.current_health,
            max_health: combatant.max_health,
            health_fraction: combatant.health_fraction(),
            state: combatant.state,
            elite,
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct HudSnapshot {
    pub player: Option<CombatantView>,
    /// Roster order
    pub enemies: Vec<CombatantView>,
    pub experience: u32,
    pub level: u32,
    pub threshold: u32,
    pub coins: u32,
    pub status: EncounterStatus,
}

pub fn publish_hud_snapshot(
    mut hud: ResMut<HudSnapshot>,
    status: Res<EncounterStatus>,
    stats: Res<EncounterStats>,
    roster: Res<EnemyRoster>,
    players: Query<(Entity, &Combatant, &Transform, &Progression), With<Player>>,
    enemies: Query<(&Combatant, &Transform, &Enemy), Without<Player>>,
) {
    let player = players.get_single().ok();

    hud.player = player.map(|(entity, combatant, transform, _)| CombatantView::of(entity, combatant, transform, false));
    if let Some((_, _, _, progression)) = player {
        hud.experience = progression.experience;
        hud.level = progression.level;
        hud.threshold = progression.threshold();
    }

    hud.enemies = roster
        .iter()
        .filter_map(|entity| {
            let (combatant, transform, enemy) = enemies.get(entity).ok()?;
            Some(CombatantView::of(entity, combatant, transform, enemy.elite))
        })
        .collect();
    hud.coins = stats.coins;
    hud.status = *status;
}
