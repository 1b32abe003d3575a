//! Projectile Systems
//!
//! Owns every projectile entity: spawns them from `ProjectileLaunch` events,
//! moves them, resolves hits through the shared damage routine and removes
//! them on impact, on timeout or once they leave the viewport.

use bevy::prelude::*;

use crate::settings::EncounterSettings;
use super::clock::EncounterClock;
use super::combat_core::DamageContext;
use super::components::*;
use super::constants::PLAYER_ID;
use super::skills::SkillKind;
use super::spawn_director::EnemyRoster;
use super::utils::enemy_id;

/// Request to spawn one projectile.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileLaunch {
    pub skill: SkillKind,
    pub origin: Vec2,
    /// Enemy to chase (homing) or that the aim point was taken from
    pub target: Option<Entity>,
    /// Point the projectile initially flies toward
    pub aim: Vec2,
    pub damage: f32,
    pub speed: f32,
    pub homing: bool,
    pub impact_zone: Option<ZoneSpec>,
}

/// Unit direction from `origin` toward `aim`; +X when they coincide.
pub fn initial_heading(origin: Vec2, aim: Vec2) -> Vec2 {
    let direction = (aim - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        Vec2::X
    } else {
        direction
    }
}

pub fn spawn_launched_projectiles(
    mut commands: Commands,
    mut launches: EventReader<ProjectileLaunch>,
    clock: Res<EncounterClock>,
    settings: Res<EncounterSettings>,
) {
    for launch in launches.read() {
        commands.spawn((
            Projectile {
                skill: launch.skill,
                damage: launch.damage,
                target: if launch.homing { launch.target } else { None },
                heading: initial_heading(launch.origin, launch.aim),
                speed: launch.speed,
                homing: launch.homing,
                expires_at: clock.now() + settings.projectile_lifetime_ms,
                impact_zone: launch.impact_zone,
            },
            Transform::from_translation(launch.origin.extend(0.0)),
        ));
    }
}

/// Move projectiles; homing ones re-aim at their target every tick.
pub fn move_projectiles(
    clock: Res<EncounterClock>,
    mut projectiles: Query<(&mut Projectile, &mut Transform)>,
    targets: Query<(&Combatant, &Transform), Without<Projectile>>,
) {
    let dt = clock.delta_secs();
    for (mut projectile, mut transform) in projectiles.iter_mut() {
        let position = transform.translation.truncate();

        if let Some(target) = projectile.target {
            match targets.get(target) {
                Ok((combatant, target_transform)) if combatant.is_alive() => {
                    let direction = (target_transform.translation.truncate() - position).normalize_or_zero();
                    if direction != Vec2::ZERO {
                        projectile.heading = direction;
                    }
                }
                // Target gone: keep flying along the last heading.
                _ => projectile.target = None,
            }
        }

        let step = projectile.heading * projectile.speed * dt;
        transform.translation += step.extend(0.0);
    }
}

/// Damage the first living enemy each projectile touches, leave its impact
/// zone behind and remove it.
pub fn resolve_projectile_hits(
    mut commands: Commands,
    mut damage: DamageContext,
    settings: Res<EncounterSettings>,
    roster: Res<EnemyRoster>,
    projectiles: Query<(Entity, &Projectile, &Transform)>,
    mut enemies: Query<(&mut Combatant, &Transform, &Enemy), Without<Projectile>>,
) {
    let now = damage.now();
    for (projectile_entity, projectile, transform) in projectiles.iter() {
        let position = transform.translation.truncate();

        let hit = roster.iter().find(|entity| {
            enemies.get(*entity).is_ok_and(|(combatant, enemy_transform, _)| {
                combatant.is_alive()
                    && enemy_transform.translation.truncate().distance(position) <= settings.projectile_hit_radius
            })
        });
        let Some(hit) = hit else {
            continue;
        };
        let Ok((mut combatant, _, enemy)) = enemies.get_mut(hit) else {
            continue;
        };

        let target_id = enemy_id(hit, enemy);
        damage.apply(
            hit,
            &mut combatant,
            projectile.damage,
            PLAYER_ID,
            projectile.skill.name(),
            &target_id,
        );

        if let Some(zone) = &projectile.impact_zone {
            commands.spawn((
                AreaEffectZone::from_spec(projectile.skill, zone, now),
                Transform::from_translation(position.extend(0.0)),
            ));
        }
        commands.entity(projectile_entity).despawn();
    }
}

/// Remove projectiles past their lifetime or outside the viewport.
pub fn expire_projectiles(
    mut commands: Commands,
    clock: Res<EncounterClock>,
    viewport: Res<Viewport>,
    projectiles: Query<(Entity, &Projectile, &Transform)>,
) {
    for (entity, projectile, transform) in projectiles.iter() {
        let expired = clock.now() >= projectile.expires_at;
        let outside = !viewport.0.contains(transform.translation.truncate());
        if expired || outside {
            commands.entity(entity).despawn();
        }
    }
}
