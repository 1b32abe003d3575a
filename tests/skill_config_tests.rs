//! Tests for the shipped data files
//!
//! These tests verify that:
//! - Every skill kind is defined with sane values
//! - Every level up to the winning level has a usable spawn pool
//! - Waves cover their budget without overshooting by a full archetype

use hordesim::encounter::enemy_config::{load_enemy_definitions, EnemyKind};
use hordesim::encounter::skill_config::load_skill_definitions;
use hordesim::encounter::skills::{SkillBehavior, SkillBook, SkillKind};
use hordesim::encounter::spawn_director::{plan_wave, wave_budget, SpawnDirector};
use hordesim::encounter::components::GameRng;
use hordesim::settings::EncounterSettings;

use bevy::prelude::*;

// =============================================================================
// Skill Definition Validation Tests
// =============================================================================

#[test]
fn test_all_skills_defined() {
    let skills = load_skill_definitions().expect("skills.ron should load");
    assert!(skills.missing().is_empty());
    assert_eq!(skills.len(), SkillKind::ALL.len());
}

#[test]
fn test_projectile_skills_have_speed() {
    let skills = load_skill_definitions().expect("skills.ron should load");
    for kind in SkillKind::ALL {
        let def = skills.get(&kind).expect("defined");
        if def.behavior.launches_projectiles() {
            assert!(
                def.projectile_speed.is_some_and(|s| s > 0.0),
                "{} needs a projectile speed",
                def.name
            );
        }
    }
}

#[test]
fn test_only_comet_starts_unlocked() {
    let skills = load_skill_definitions().expect("skills.ron should load");
    let book = SkillBook::new(Entity::from_raw(0), &skills);
    assert_eq!(book.unlocked(), &[SkillKind::Comet]);

    let venom = skills.get(&SkillKind::Venom).expect("defined");
    assert_eq!(venom.behavior, SkillBehavior::HomingProjectile);
    assert!(venom.impact_zone.is_some_and(|zone| zone.slow.is_some()));
}

// =============================================================================
// Enemy Definition Validation Tests
// =============================================================================

#[test]
fn test_every_level_has_a_pool() {
    let enemies = load_enemy_definitions().expect("enemies.ron should load");
    let settings = EncounterSettings::default();
    for level in 1..=settings.win_level {
        let pool = enemies.pool_for_level(level);
        assert!(!pool.is_empty(), "Level {} has no spawn pool", level);
    }
    assert_eq!(enemies.pool_for_level(1), vec![EnemyKind::Skeleton]);
}

#[test]
fn test_elite_stats_scale_with_multiplier() {
    let enemies = load_enemy_definitions().expect("enemies.ron should load");
    let regular = enemies.stats_for(EnemyKind::Goblin, false, 2.0).expect("defined");
    let elite = enemies.stats_for(EnemyKind::Goblin, true, 2.0).expect("defined");
    assert_eq!(elite.health, regular.health * 2.0);
    assert_eq!(elite.damage, regular.damage * 2.0);
}

#[test]
fn test_wave_budget_bounds_at_every_level() {
    let enemies = load_enemy_definitions().expect("enemies.ron should load");
    let settings = EncounterSettings::default();
    let viewport = settings.viewport_at(Vec2::new(2560.0, 1440.0));
    let mut rng = GameRng::from_seed(2024);
    let mut director = SpawnDirector::default();

    for level in 1..=settings.win_level {
        let budget = wave_budget(level, settings.difficulty_per_level);
        for _ in 0..20 {
            let wave = plan_wave(level, &enemies, &settings, &mut director, viewport, &mut rng);
            let spent: u32 = wave.iter().map(|s| s.weight).sum();
            assert!(spent >= budget, "Level {} wave spent {} < {}", level, spent, budget);
            assert!(
                spent < budget + enemies.max_weight(),
                "Level {} wave kept drawing after covering its budget",
                level
            );
            for spawn in &wave {
                assert!(!viewport.contains(spawn.position), "Spawns must be off-screen");
            }
        }
    }
}
