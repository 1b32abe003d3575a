//! Combat Core Systems
//!
//! The combatant state machine shared by the player and every enemy:
//! - Shared damage routine (`DamageContext`) used by every damage source
//! - Grace window and spawn intro expiry
//! - Player movement and enemy walk/attack behavior
//! - Death transitions, kill rewards, elite loot and pickup
//! - Clearing the field once the encounter ends

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::{EncounterEvent, Outbox};
use crate::combat::log::{EncounterLog, LogEventType};
use crate::settings::EncounterSettings;
use super::clock::{DeferredWork, DeferredWorkDue, EncounterClock, Scheduler, TaskOwner};
use super::components::*;
use super::constants::{CONTACT_ABILITY, PLAYER_ID};
use super::spawn_director::EnemyRoster;
use super::utils::{combatant_id, enemy_id};

/// A combatant's health reached zero this tick.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatantDowned {
    pub entity: Entity,
}

/// Experience owed to the player for a completed enemy death.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillReward {
    pub experience: u32,
    pub elite: bool,
}

// ============================================================================
// Shared Damage Routine
// ============================================================================

/// Everything a damage source needs to hit a combatant.
///
/// Applies the hit, schedules the end of the grace window, records the hit in
/// the encounter log and reports kills as `CombatantDowned`.
#[derive(SystemParam)]
pub struct DamageContext<'w> {
    clock: Res<'w, EncounterClock>,
    scheduler: ResMut<'w, Scheduler>,
    log: ResMut<'w, EncounterLog>,
    downed: EventWriter<'w, CombatantDowned>,
}

impl DamageContext<'_> {
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn delta_secs(&self) -> f32 {
        self.clock.delta_secs()
    }

    pub fn schedule(&mut self, owner: TaskOwner, due_ms: u64, work: DeferredWork) {
        self.scheduler.schedule(owner, due_ms, work);
    }

    pub fn log(&mut self) -> &mut EncounterLog {
        &mut self.log
    }

    /// Hit `combatant` with its own grace window.
    pub fn apply(
        &mut self,
        entity: Entity,
        combatant: &mut Combatant,
        amount: f32,
        source: &str,
        ability: &str,
        target: &str,
    ) -> DamageOutcome {
        let grace_ms = combatant.grace_ms;
        self.apply_with_grace(entity, combatant, amount, grace_ms, source, ability, target)
    }

    /// Hit `combatant`, opening a grace window of `grace_ms` on success.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_with_grace(
        &mut self,
        entity: Entity,
        combatant: &mut Combatant,
        amount: f32,
        grace_ms: u64,
        source: &str,
        ability: &str,
        target: &str,
    ) -> DamageOutcome {
        let outcome = combatant.take_damage_with_grace(amount, self.clock.now(), grace_ms);
        if outcome == DamageOutcome::Ignored {
            return outcome;
        }

        self.scheduler.schedule(
            TaskOwner::Combatant(entity),
            combatant.grace_expires_at,
            DeferredWork::EndGraceWindow,
        );

        let killing_blow = outcome.is_kill();
        let message = if killing_blow {
            format!("{}'s {} kills {} ({:.0} damage)", source, ability, target, outcome.dealt())
        } else {
            format!("{}'s {} hits {} for {:.0}", source, ability, target, outcome.dealt())
        };
        self.log.log_damage(
            source.to_string(),
            target.to_string(),
            ability.to_string(),
            outcome.dealt(),
            killing_blow,
            message,
        );

        if killing_blow {
            self.downed.send(CombatantDowned { entity });
        }
        outcome
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Handle due grace-window and spawn-intro timers.
pub fn expire_combatant_timers(
    mut due: EventReader<DeferredWorkDue>,
    clock: Res<EncounterClock>,
    mut combatants: Query<&mut Combatant>,
) {
    for event in due.read() {
        let TaskOwner::Combatant(entity) = event.owner else {
            continue;
        };
        let Ok(mut combatant) = combatants.get_mut(entity) else {
            continue;
        };
        match event.work {
            DeferredWork::EndGraceWindow => {
                combatant.end_grace_window(clock.now());
            }
            DeferredWork::EndSpawnIntro => {
                if combatant.finish_spawn_intro() {
                    debug!("{:?} finished its spawn intro", entity);
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Movement and Attacks
// ============================================================================

/// Move the player along `PlayerInput`, clamped to the world bounds.
pub fn move_player(
    clock: Res<EncounterClock>,
    input: Res<PlayerInput>,
    bounds: Res<WorldBounds>,
    mut players: Query<(&mut Combatant, &mut Transform), With<Player>>,
) {
    let dt = clock.delta_secs();
    for (mut combatant, mut transform) in players.iter_mut() {
        if !combatant.can_act() {
            combatant.velocity = Vec2::ZERO;
            continue;
        }

        let direction = input.movement.normalize_or_zero();
        combatant.velocity = direction * combatant.effective_speed();
        let next = transform.translation.truncate() + combatant.velocity * dt;
        let clamped = next.clamp(bounds.0.min, bounds.0.max);
        transform.translation.x = clamped.x;
        transform.translation.y = clamped.y;

        combatant.state = if combatant.velocity == Vec2::ZERO {
            CombatantState::Idle
        } else {
            CombatantState::Walking
        };
    }
}

/// Enemies walk toward the player until inside their engagement radius, then
/// stop and hit the player every `attack_interval_ms`.
pub fn update_enemy_behavior(
    mut damage: DamageContext,
    mut outbox: ResMut<Outbox>,
    mut players: Query<(Entity, &mut Combatant, &Transform), (With<Player>, Without<Enemy>)>,
    mut enemies: Query<(Entity, &Enemy, &mut Combatant, &mut Transform), Without<Player>>,
) {
    let now = damage.now();
    let dt = damage.delta_secs();

    let mut player = players.get_single_mut().ok();
    let player_position = player
        .as_ref()
        .filter(|(_, combatant, _)| combatant.is_alive())
        .map(|(_, _, transform)| transform.translation.truncate());

    for (entity, enemy, mut combatant, mut transform) in enemies.iter_mut() {
        if !combatant.can_act() {
            continue;
        }

        let Some(target) = player_position else {
            combatant.velocity = Vec2::ZERO;
            combatant.state = CombatantState::Idle;
            continue;
        };

        let position = transform.translation.truncate();
        let distance = position.distance(target);

        if distance > enemy.attack_range {
            let direction = (target - position).normalize_or_zero();
            let speed = combatant.effective_speed();
            let step = (speed * dt).min(distance - enemy.attack_range);
            combatant.state = CombatantState::Walking;
            combatant.velocity = direction * speed;
            transform.translation += (direction * step).extend(0.0);
            continue;
        }

        combatant.velocity = Vec2::ZERO;
        if combatant.state != CombatantState::Attacking {
            combatant.state = CombatantState::Attacking;
            combatant.next_attack_at = now + enemy.attack_interval_ms;
            continue;
        }
        if now < combatant.next_attack_at {
            continue;
        }
        combatant.next_attack_at = now + enemy.attack_interval_ms;

        let Some((player_entity, player_combatant, _)) = player.as_mut() else {
            continue;
        };
        let outcome = damage.apply(
            *player_entity,
            player_combatant,
            combatant.damage,
            &enemy_id(entity, enemy),
            CONTACT_ABILITY,
            PLAYER_ID,
        );
        if outcome != DamageOutcome::Ignored {
            outbox.push(EncounterEvent::PlayerDamaged {
                health: player_combatant.current_health,
                max_health: player_combatant.max_health,
            });
        }
    }
}

// ============================================================================
// Death
// ============================================================================

/// Queue the death transition of every combatant that went down this tick.
pub fn schedule_death_transitions(
    mut downed: EventReader<CombatantDowned>,
    clock: Res<EncounterClock>,
    settings: Res<EncounterSettings>,
    mut scheduler: ResMut<Scheduler>,
    mut log: ResMut<EncounterLog>,
    combatants: Query<Option<&Enemy>, With<Combatant>>,
) {
    for event in downed.read() {
        let Ok(enemy) = combatants.get(event.entity) else {
            continue;
        };
        let id = combatant_id(event.entity, enemy);
        let elite = enemy.is_some_and(|e| e.elite);
        log.log_death(id.clone(), elite, format!("{} has died", id));

        scheduler.schedule(
            TaskOwner::Combatant(event.entity),
            clock.now() + settings.death_delay_ms,
            DeferredWork::FinishDeath,
        );
    }
}

/// Complete due death transitions.
///
/// Enemies grant their kill reward, drop loot if elite and are despawned.
/// The player's death ends the encounter.
#[allow(clippy::too_many_arguments)]
pub fn finish_deaths(
    mut commands: Commands,
    mut due: EventReader<DeferredWorkDue>,
    settings: Res<EncounterSettings>,
    mut scheduler: ResMut<Scheduler>,
    mut status: ResMut<EncounterStatus>,
    mut stats: ResMut<EncounterStats>,
    mut outbox: ResMut<Outbox>,
    mut rewards: EventWriter<KillReward>,
    mut log: ResMut<EncounterLog>,
    combatants: Query<(&Combatant, &Transform, Option<&Enemy>, Has<Player>)>,
) {
    // Despawns are deferred, so a repeated transition in one tick still sees the entity.
    let mut finished: SmallVec<[Entity; 8]> = SmallVec::new();
    for event in due.read() {
        let (TaskOwner::Combatant(entity), DeferredWork::FinishDeath) = (event.owner, &event.work)
        else {
            continue;
        };
        let Ok((combatant, transform, enemy, is_player)) = combatants.get(entity) else {
            continue;
        };
        if combatant.is_alive() || finished.contains(&entity) {
            continue;
        }
        finished.push(entity);

        if let Some(enemy) = enemy {
            stats.kills += 1;
            outbox.push(EncounterEvent::EnemyDied {
                entity,
                kind: enemy.kind,
                elite: enemy.elite,
            });
            rewards.send(KillReward {
                experience: settings.kill_experience,
                elite: enemy.elite,
            });

            if enemy.elite {
                stats.elite_kills += 1;
                let value = enemy.difficulty * settings.loot_base_value;
                commands.spawn((
                    Loot { value },
                    Transform::from_translation(transform.translation),
                ));
                log.log(
                    LogEventType::Loot,
                    format!("{} dropped a coin worth {}", enemy_id(entity, enemy), value),
                );
            }

            scheduler.invalidate(TaskOwner::Combatant(entity));
            commands.entity(entity).despawn();
        } else if is_player && !status.is_over() {
            *status = EncounterStatus::Lost;
            scheduler.invalidate(TaskOwner::Director);
            outbox.push(EncounterEvent::PlayerDied);
            log.log(LogEventType::Encounter, "The player has fallen".to_string());
            info!("Encounter lost at {} ms", log.time_ms);
        }
    }
}

/// Once the encounter is won or lost, every enemy still standing dies.
///
/// These deaths grant no experience and drop no loot.
pub fn kill_remaining_enemies(
    status: Res<EncounterStatus>,
    roster: Res<EnemyRoster>,
    mut scheduler: ResMut<Scheduler>,
    mut log: ResMut<EncounterLog>,
    mut enemies: Query<(&mut Combatant, &Enemy)>,
) {
    if !status.is_over() {
        return;
    }
    for entity in roster.iter() {
        let Ok((mut combatant, enemy)) = enemies.get_mut(entity) else {
            continue;
        };
        if !combatant.die() {
            continue;
        }
        scheduler.invalidate(TaskOwner::Combatant(entity));
        let id = enemy_id(entity, enemy);
        log.log_death(id.clone(), enemy.elite, format!("{} perished as the encounter ended", id));
    }
}

/// Grant loot the player is standing on.
pub fn collect_loot(
    mut commands: Commands,
    settings: Res<EncounterSettings>,
    mut stats: ResMut<EncounterStats>,
    mut outbox: ResMut<Outbox>,
    mut log: ResMut<EncounterLog>,
    players: Query<(&Combatant, &Transform), With<Player>>,
    loot: Query<(Entity, &Loot, &Transform), Without<Player>>,
) {
    let Ok((player, player_transform)) = players.get_single() else {
        return;
    };
    if !player.is_alive() {
        return;
    }
    let position = player_transform.translation.truncate();

    for (entity, coin, transform) in loot.iter() {
        if transform.translation.truncate().distance(position) > settings.loot_pickup_radius {
            continue;
        }
        stats.coins += coin.value;
        outbox.push(EncounterEvent::LootGranted {
            value: coin.value,
            total: stats.coins,
        });
        log.log(
            LogEventType::Loot,
            format!("Picked up {} coins ({} total)", coin.value, stats.coins),
        );
        commands.entity(entity).despawn();
    }
}
