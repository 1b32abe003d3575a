//! Area-Effect Zones
//!
//! Stationary zones left by projectile impacts. A zone damages each living
//! enemy inside it at most once per interval, slows each occupant once, and
//! on expiry reverts its slows and disappears.

use bevy::prelude::*;

use crate::combat::log::{EncounterLog, LogEventType};
use super::clock::EncounterClock;
use super::combat_core::DamageContext;
use super::components::*;
use super::constants::PLAYER_ID;
use super::spawn_director::EnemyRoster;
use super::utils::enemy_id;

/// Apply zone damage and slows to every living enemy inside a zone.
///
/// Re-application is throttled by giving each hit target a grace window of at
/// least the zone interval.
pub fn tick_area_zones(
    mut damage: DamageContext,
    roster: Res<EnemyRoster>,
    mut zones: Query<(Entity, &mut AreaEffectZone, &Transform)>,
    mut enemies: Query<(&mut Combatant, &Transform, &Enemy), Without<AreaEffectZone>>,
) {
    let now = damage.now();
    for (zone_entity, mut zone, zone_transform) in zones.iter_mut() {
        if zone.is_expired(now) {
            continue;
        }
        let center = zone_transform.translation.truncate();

        for entity in roster.iter() {
            let Ok((mut combatant, transform, enemy)) = enemies.get_mut(entity) else {
                continue;
            };
            if !combatant.is_alive() || transform.translation.truncate().distance(center) > zone.radius {
                continue;
            }

            let grace_ms = zone.interval_ms.max(combatant.grace_ms);
            let target_id = enemy_id(entity, enemy);
            damage.apply_with_grace(
                entity,
                &mut combatant,
                zone.damage,
                grace_ms,
                PLAYER_ID,
                zone.skill.name(),
                &target_id,
            );

            if let Some(factor) = zone.slow {
                if combatant.is_alive() && combatant.apply_slow(zone_entity, factor) {
                    zone.slowed.push(entity);
                }
            }
        }
    }
}

/// Despawn expired zones and lift the slows they applied.
pub fn expire_area_zones(
    mut commands: Commands,
    clock: Res<EncounterClock>,
    mut log: ResMut<EncounterLog>,
    zones: Query<(Entity, &AreaEffectZone)>,
    mut combatants: Query<&mut Combatant>,
) {
    for (zone_entity, zone) in zones.iter() {
        if !zone.is_expired(clock.now()) {
            continue;
        }
        for slowed in &zone.slowed {
            if let Ok(mut combatant) = combatants.get_mut(*slowed) {
                combatant.remove_slow(zone_entity);
            }
        }
        if !zone.slowed.is_empty() {
            log.log(
                LogEventType::Skill,
                format!("{} zone faded, {} slow(s) lifted", zone.skill.name(), zone.slowed.len()),
            );
        }
        commands.entity(zone_entity).despawn();
    }
}
