//! Spawn Director
//!
//! Escalating enemy pressure. Every spawn cycle the director spends a budget
//! of `level × difficulty_per_level` on random archetypes from the current
//! level's pool, placing each just outside a random edge of the viewport.
//! Every `elite_threshold` regular spawns, the next spawn is promoted to an
//! elite. The cycle reschedules itself and restarts on level-up.
//!
//! The director owns the active-enemy roster; other systems only read it.

use bevy::prelude::*;

use crate::combat::events::{EncounterEvent, Outbox};
use crate::combat::log::{EncounterLog, LogEventType};
use crate::settings::EncounterSettings;
use super::clock::{DeferredWork, DeferredWorkDue, EncounterClock, Scheduler, TaskOwner};
use super::components::*;
use super::constants::{MAX_SPAWNS_PER_WAVE, MIN_SPAWN_WEIGHT};
use super::enemy_config::{ArchetypeConfig, EnemyDefinitions, EnemyKind};
use super::progression::{LevelReached, Progression};
use super::utils::{edge_position, enemy_id};

/// Living and dying enemies in spawn order.
#[derive(Resource, Debug, Default, Clone)]
pub struct EnemyRoster {
    enemies: Vec<Entity>,
}

impl EnemyRoster {
    pub fn track(&mut self, entity: Entity) {
        self.enemies.push(entity);
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.enemies.iter().copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.enemies.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    fn retain(&mut self, keep: impl FnMut(&Entity) -> bool) {
        self.enemies.retain(keep);
    }
}

/// Elite promotion counter.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpawnDirector {
    /// Regular spawns since the last elite
    pub spawned_since_elite: u32,
}

impl SpawnDirector {
    /// Decide whether the next spawn is elite, updating the counter.
    pub fn next_is_elite(&mut self, threshold: u32) -> bool {
        if self.spawned_since_elite >= threshold {
            self.spawned_since_elite = 0;
            true
        } else {
            self.spawned_since_elite += 1;
            false
        }
    }
}

/// One enemy the director decided to spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedSpawn {
    pub kind: EnemyKind,
    pub position: Vec2,
    pub elite: bool,
    pub weight: u32,
}

pub fn wave_budget(level: u32, difficulty_per_level: u32) -> u32 {
    level.max(1) * difficulty_per_level
}

/// Pick the enemies for one wave.
///
/// Keeps drawing until the spent weight reaches the budget, so a wave always
/// covers its budget and overshoots by less than one archetype's weight.
pub fn plan_wave(
    level: u32,
    definitions: &EnemyDefinitions,
    settings: &EncounterSettings,
    director: &mut SpawnDirector,
    viewport: Rect,
    rng: &mut GameRng,
) -> Vec<PlannedSpawn> {
    let pool = definitions.pool_for_level(level);
    if pool.is_empty() {
        warn!("No enemy archetypes available for level {}", level);
        return Vec::new();
    }

    let budget = wave_budget(level, settings.difficulty_per_level);
    let mut spent = 0;
    let mut wave = Vec::new();

    while spent < budget && wave.len() < MAX_SPAWNS_PER_WAVE {
        let kind = pool[rng.random_index(pool.len())];
        let weight = definitions
            .archetype(kind)
            .map_or(MIN_SPAWN_WEIGHT, ArchetypeConfig::weight);
        let position = edge_position(viewport, settings.spawn_margin, rng);
        let elite = director.next_is_elite(settings.elite_threshold);

        spent += weight;
        wave.push(PlannedSpawn {
            kind,
            position,
            elite,
            weight,
        });
    }
    wave
}

/// Spawn one planned enemy. Returns `None` if its archetype is unknown.
pub fn spawn_enemy(
    commands: &mut Commands,
    definitions: &EnemyDefinitions,
    settings: &EncounterSettings,
    planned: &PlannedSpawn,
) -> Option<(Entity, Enemy)> {
    let archetype = definitions.archetype(planned.kind)?;
    let stats = definitions.stats_for(planned.kind, planned.elite, settings.elite_multiplier)?;
    let enemy = Enemy {
        kind: planned.kind,
        elite: planned.elite,
        difficulty: archetype.difficulty,
        attack_range: archetype.attack_range,
        attack_interval_ms: archetype.attack_interval_ms,
    };

    let entity = commands
        .spawn((
            Combatant::new(
                stats.health,
                stats.damage,
                archetype.speed,
                stats.tier,
                settings.enemy_grace_ms,
            ),
            enemy,
            Transform::from_translation(planned.position.extend(0.0)),
        ))
        .id();
    Some((entity, enemy))
}

/// Run due spawn cycles and schedule the next one.
#[allow(clippy::too_many_arguments)]
pub fn run_spawn_cycles(
    mut commands: Commands,
    mut due: EventReader<DeferredWorkDue>,
    clock: Res<EncounterClock>,
    settings: Res<EncounterSettings>,
    definitions: Res<EnemyDefinitions>,
    viewport: Res<Viewport>,
    mut rng: ResMut<GameRng>,
    mut director: ResMut<SpawnDirector>,
    mut roster: ResMut<EnemyRoster>,
    mut scheduler: ResMut<Scheduler>,
    mut stats: ResMut<EncounterStats>,
    mut outbox: ResMut<Outbox>,
    mut log: ResMut<EncounterLog>,
    players: Query<&Progression, With<Player>>,
) {
    for event in due.read() {
        if event.owner != TaskOwner::Director || event.work != DeferredWork::SpawnCycle {
            continue;
        }

        let now = clock.now();
        let level = players.get_single().map(|p| p.level).unwrap_or(1);
        let wave = plan_wave(level, &definitions, &settings, &mut director, viewport.0, &mut rng);

        for planned in &wave {
            let Some((entity, enemy)) = spawn_enemy(&mut commands, &definitions, &settings, planned) else {
                continue;
            };
            roster.track(entity);
            scheduler.schedule(
                TaskOwner::Combatant(entity),
                now + settings.spawn_intro_ms,
                DeferredWork::EndSpawnIntro,
            );
            stats.enemies_spawned += 1;
            outbox.push(EncounterEvent::EnemySpawned {
                entity,
                kind: planned.kind,
                elite: planned.elite,
                position: planned.position,
            });
            log.register_combatant(enemy_id(entity, &enemy));
        }

        stats.waves += 1;
        log.log(
            LogEventType::Spawn,
            format!("Wave {} at level {}: {} enemies", stats.waves, level, wave.len()),
        );
        scheduler.schedule(
            TaskOwner::Director,
            now + settings.spawn_interval_ms,
            DeferredWork::SpawnCycle,
        );
    }
}

/// Restart the spawn cycle after a level-up.
pub fn reset_spawn_cycle(
    mut levels: EventReader<LevelReached>,
    clock: Res<EncounterClock>,
    settings: Res<EncounterSettings>,
    status: Res<EncounterStatus>,
    mut scheduler: ResMut<Scheduler>,
) {
    if levels.read().count() == 0 {
        return;
    }
    scheduler.invalidate(TaskOwner::Director);
    if status.is_over() {
        return;
    }
    scheduler.schedule(
        TaskOwner::Director,
        clock.now() + settings.spawn_interval_ms,
        DeferredWork::SpawnCycle,
    );
}

/// Drop despawned enemies from the roster.
pub fn prune_roster(mut roster: ResMut<EnemyRoster>, enemies: Query<(), With<Enemy>>) {
    roster.retain(|entity| enemies.contains(*entity));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elite_every_threshold_plus_one() {
        let mut director = SpawnDirector::default();
        let pattern: Vec<bool> = (0..22).map(|_| director.next_is_elite(10)).collect();
        let elites: Vec<usize> = pattern
            .iter()
            .enumerate()
            .filter(|(_, elite)| **elite)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(elites, vec![10, 21]);
    }

    #[test]
    fn test_budget_scales_with_level() {
        assert_eq!(wave_budget(1, 4), 4);
        assert_eq!(wave_budget(7, 4), 28);
        assert_eq!(wave_budget(0, 4), 4);
    }
}
