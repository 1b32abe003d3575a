//! Skill Dispatch
//!
//! Each tick, every unlocked skill whose cooldown has elapsed picks its
//! targets and fires. Target selection is pure (`plan_activation`) so it can be
//! tested without a world; the systems only gather candidates and apply plans.
//!
//! Projectile skills never spawn entities themselves. They send
//! `ProjectileLaunch` events and the projectile resolver owns the result.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::log::LogEventType;
use crate::settings::EncounterSettings;
use super::clock::{DeferredWork, DeferredWorkDue, TaskOwner};
use super::combat_core::DamageContext;
use super::components::*;
use super::constants::PLAYER_ID;
use super::projectiles::ProjectileLaunch;
use super::skills::{Skill, SkillBehavior, SkillBook};
use super::spawn_director::EnemyRoster;
use super::utils::enemy_id;

/// A living enemy that a skill could hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub position: Vec2,
}

pub type TargetList = SmallVec<[TargetCandidate; 8]>;

/// What a ready skill does this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillAction {
    /// Nothing in range; the cooldown is not consumed.
    Idle,
    Launch {
        target: TargetCandidate,
        shots: u32,
        homing: bool,
    },
    Strike { targets: TargetList },
}

// ============================================================================
// Targeting
// ============================================================================

/// Closest candidate within `range`. Ties keep the earlier candidate.
pub fn closest_in_range(origin: Vec2, range: f32, candidates: &[TargetCandidate]) -> Option<TargetCandidate> {
    let mut best: Option<(TargetCandidate, f32)> = None;
    for candidate in candidates {
        let distance = origin.distance(candidate.position);
        if distance > range {
            continue;
        }
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((*candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}

pub fn all_in_range(origin: Vec2, range: f32, candidates: &[TargetCandidate]) -> TargetList {
    candidates
        .iter()
        .filter(|c| origin.distance(c.position) <= range)
        .copied()
        .collect()
}

/// Up to `count` candidates within `range`, nearest first.
pub fn nearest_in_range(origin: Vec2, range: f32, count: usize, candidates: &[TargetCandidate]) -> TargetList {
    let mut in_range: Vec<(f32, TargetCandidate)> = candidates
        .iter()
        .map(|c| (origin.distance(c.position), *c))
        .filter(|(distance, _)| *distance <= range)
        .collect();
    // Stable sort keeps candidate order among equal distances.
    in_range.sort_by(|a, b| a.0.total_cmp(&b.0));
    in_range.into_iter().take(count).map(|(_, c)| c).collect()
}

fn plan_launch(skill: &Skill, origin: Vec2, candidates: &[TargetCandidate], homing: bool) -> SkillAction {
    match closest_in_range(origin, skill.range, candidates) {
        Some(target) => SkillAction::Launch {
            target,
            shots: skill.quantity.max(1),
            homing,
        },
        None => SkillAction::Idle,
    }
}

fn plan_strike(targets: TargetList) -> SkillAction {
    if targets.is_empty() {
        SkillAction::Idle
    } else {
        SkillAction::Strike { targets }
    }
}

/// Decide what `skill` does from `origin` against `candidates` (roster order).
pub fn plan_activation(skill: &Skill, origin: Vec2, candidates: &[TargetCandidate]) -> SkillAction {
    match skill.behavior {
        SkillBehavior::HomingProjectile => plan_launch(skill, origin, candidates, true),
        SkillBehavior::VolleyProjectile => plan_launch(skill, origin, candidates, false),
        SkillBehavior::Aura => plan_strike(all_in_range(origin, skill.range, candidates)),
        SkillBehavior::ChainBurst => plan_strike(nearest_in_range(
            origin,
            skill.range,
            skill.quantity.max(1) as usize,
            candidates,
        )),
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Activate every ready skill of the player.
pub fn dispatch_skills(
    mut book: ResMut<SkillBook>,
    mut damage: DamageContext,
    settings: Res<EncounterSettings>,
    roster: Res<EnemyRoster>,
    players: Query<(&Combatant, &Player, &Transform), Without<Enemy>>,
    mut enemies: Query<(&mut Combatant, &Transform, &Enemy), Without<Player>>,
    mut launches: EventWriter<ProjectileLaunch>,
) {
    let Some(owner) = book.owner() else {
        return;
    };
    let Ok((owner_combatant, player, owner_transform)) = players.get(owner) else {
        return;
    };
    if !owner_combatant.can_act() {
        return;
    }

    let now = damage.now();
    let origin = owner_transform.translation.truncate();
    let candidates: Vec<TargetCandidate> = roster
        .iter()
        .filter_map(|entity| {
            let (combatant, transform, _) = enemies.get(entity).ok()?;
            combatant.is_alive().then(|| TargetCandidate {
                entity,
                position: transform.translation.truncate(),
            })
        })
        .collect();

    for skill in book.unlocked_mut() {
        if !skill.can_activate(now) {
            continue;
        }
        let skill_damage = skill.damage * player.damage_multiplier;

        match plan_activation(skill, origin, &candidates) {
            SkillAction::Idle => {}
            SkillAction::Launch { target, shots, homing } => {
                skill.mark_used(now);
                let launch = ProjectileLaunch {
                    skill: skill.kind,
                    origin,
                    target: Some(target.entity),
                    aim: target.position,
                    damage: skill_damage,
                    speed: skill.projectile_speed,
                    homing,
                    impact_zone: skill.impact_zone,
                };
                for shot in 1..shots {
                    damage.schedule(
                        TaskOwner::Skill(skill.kind),
                        now + shot as u64 * settings.burst_stagger_ms,
                        DeferredWork::BurstShot(launch.clone()),
                    );
                }
                launches.send(launch);
                damage.log().log(
                    LogEventType::Skill,
                    format!("{} fires {} shot(s)", skill.name, shots),
                );
            }
            SkillAction::Strike { targets } => {
                skill.mark_used(now);
                for target in targets {
                    let Ok((mut combatant, _, enemy)) = enemies.get_mut(target.entity) else {
                        continue;
                    };
                    let target_id = enemy_id(target.entity, enemy);
                    damage.apply(
                        target.entity,
                        &mut combatant,
                        skill_damage,
                        PLAYER_ID,
                        skill.kind.name(),
                        &target_id,
                    );
                }
            }
        }
    }
}

/// Fire the later shots of multi-shot activations.
///
/// Shots leave from the owner's current position and re-aim at the original
/// target if it is still alive; otherwise they keep the activation's values.
pub fn emit_burst_shots(
    mut due: EventReader<DeferredWorkDue>,
    book: Res<SkillBook>,
    players: Query<&Transform, With<Player>>,
    enemies: Query<(&Combatant, &Transform), With<Enemy>>,
    mut launches: EventWriter<ProjectileLaunch>,
) {
    for event in due.read() {
        let DeferredWork::BurstShot(shot) = &event.work else {
            continue;
        };
        let mut launch = shot.clone();

        if let Some(transform) = book.owner().and_then(|owner| players.get(owner).ok()) {
            launch.origin = transform.translation.truncate();
        }
        if let Some(target) = launch.target {
            match enemies.get(target) {
                Ok((combatant, transform)) if combatant.is_alive() => {
                    launch.aim = transform.translation.truncate();
                }
                _ => launch.target = None,
            }
        }
        launches.send(launch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::skills::{SkillKind, UpgradePath};

    fn candidate(index: u32, x: f32, y: f32) -> TargetCandidate {
        TargetCandidate {
            entity: Entity::from_raw(index),
            position: Vec2::new(x, y),
        }
    }

    fn skill(behavior: SkillBehavior, range: f32, quantity: u32) -> Skill {
        Skill {
            kind: SkillKind::Comet,
            name: "Comet".to_string(),
            behavior,
            cooldown_ms: 1000,
            last_used: None,
            range,
            level: 1,
            max_level: 5,
            damage: 10.0,
            quantity,
            projectile_speed: 150.0,
            impact_zone: None,
            upgrade: UpgradePath::Range {
                damage: 1.0,
                range: 10.0,
                quantity: 0,
            },
        }
    }

    #[test]
    fn test_closest_enemy_within_range_is_chosen() {
        let candidates = [candidate(1, 250.0, 0.0), candidate(2, 150.0, 0.0)];
        let comet = skill(SkillBehavior::VolleyProjectile, 200.0, 1);

        match plan_activation(&comet, Vec2::ZERO, &candidates) {
            SkillAction::Launch { target, shots, homing } => {
                assert_eq!(target.entity, Entity::from_raw(2));
                assert_eq!(shots, 1);
                assert!(!homing);
            }
            other => panic!("expected a launch, got {:?}", other),
        }
    }

    #[test]
    fn test_ties_go_to_roster_order() {
        let candidates = [candidate(7, 0.0, 100.0), candidate(3, 100.0, 0.0)];
        let chosen = closest_in_range(Vec2::ZERO, 200.0, &candidates).unwrap();
        assert_eq!(chosen.entity, Entity::from_raw(7));
    }

    #[test]
    fn test_nothing_in_range_idles() {
        let candidates = [candidate(1, 500.0, 0.0)];
        for behavior in [
            SkillBehavior::HomingProjectile,
            SkillBehavior::VolleyProjectile,
            SkillBehavior::Aura,
            SkillBehavior::ChainBurst,
        ] {
            let s = skill(behavior, 200.0, 2);
            assert_eq!(plan_activation(&s, Vec2::ZERO, &candidates), SkillAction::Idle);
        }
    }

    #[test]
    fn test_aura_hits_everything_in_range() {
        let candidates = [
            candidate(1, 50.0, 0.0),
            candidate(2, 150.0, 0.0),
            candidate(3, 0.0, -90.0),
        ];
        let aura = skill(SkillBehavior::Aura, 100.0, 1);
        let SkillAction::Strike { targets } = plan_activation(&aura, Vec2::ZERO, &candidates) else {
            panic!("aura should strike");
        };
        let hit: Vec<u32> = targets.iter().map(|t| t.entity.index()).collect();
        assert_eq!(hit, vec![1, 3]);
    }

    #[test]
    fn test_chain_burst_takes_nearest_n() {
        let candidates = [
            candidate(1, 300.0, 0.0),
            candidate(2, 40.0, 0.0),
            candidate(3, 120.0, 0.0),
            candidate(4, 60.0, 0.0),
        ];
        let lightning = skill(SkillBehavior::ChainBurst, 350.0, 2);
        let SkillAction::Strike { targets } = plan_activation(&lightning, Vec2::ZERO, &candidates) else {
            panic!("chain burst should strike");
        };
        let hit: Vec<u32> = targets.iter().map(|t| t.entity.index()).collect();
        assert_eq!(hit, vec![2, 4]);
    }

    #[test]
    fn test_multi_shot_launch_reports_quantity() {
        let candidates = [candidate(1, 10.0, 0.0)];
        let venom = skill(SkillBehavior::HomingProjectile, 200.0, 3);
        assert!(matches!(
            plan_activation(&venom, Vec2::ZERO, &candidates),
            SkillAction::Launch { shots: 3, homing: true, .. }
        ));
    }
}
