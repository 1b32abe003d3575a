//! Encounter Systems API
//!
//! The stable entry point for running the simulation. Embedders (the headless
//! runner, tests, a future renderer) add `EncounterPlugin` and talk to the core
//! through resources and the outbox rather than internal modules.
//!
//! ## System Phases
//!
//! Encounter systems run in ordered phases inside `Update`:
//!
//! 1. **Selection** - Resolve skill selection answers (always runs)
//! 2. **Deferred** - Advance the clock, publish due scheduled work, expire timers
//! 3. **Spawning** - Spawn director waves
//! 4. **Behavior** - Player movement, enemy walk/attack
//! 5. **Abilities** - Skill activation and burst shots
//! 6. **Collision** - Projectiles and area-effect zones
//! 7. **Aftermath** - Deaths, loot, experience, level-ups
//! 8. **Reporting** - HUD snapshot (always runs)
//!
//! Phases 2-7 only run while the encounter status is `Running`, which both
//! suspends the simulation for a selection and stops it once won or lost.
//!
//! ## Usage
//!
//! ```ignore
//! app.insert_resource(EncounterSettings::load())
//!     .add_plugins(EncounterPlugin::new(load_skill_definitions()?, load_enemy_definitions()?));
//! ```

use bevy::prelude::*;

use crate::combat::log::{EncounterLog, LogEventType};
use crate::combat::CombatPlugin;
use crate::settings::{BaselineStats, EncounterSettings};

// === Phase 1: Selection ===
pub use super::progression::apply_skill_selection;

// === Phase 2: Deferred ===
pub use super::clock::{advance_clock, run_deferred_work};
pub use super::combat_core::expire_combatant_timers;

// === Phase 3: Spawning ===
pub use super::spawn_director::run_spawn_cycles;

// === Phase 4: Behavior ===
pub use super::combat_core::{move_player, update_enemy_behavior};

// === Phase 5: Abilities ===
pub use super::skill_dispatch::{dispatch_skills, emit_burst_shots};

// === Phase 6: Collision ===
pub use super::auras::{expire_area_zones, tick_area_zones};
pub use super::projectiles::{
    expire_projectiles, move_projectiles, resolve_projectile_hits, spawn_launched_projectiles,
};

// === Phase 7: Aftermath ===
pub use super::combat_core::{collect_loot, finish_deaths, schedule_death_transitions};
pub use super::progression::apply_kill_rewards;
pub use super::spawn_director::{prune_roster, reset_spawn_cycle};

// === Phase 8: Reporting ===
pub use super::combat_core::kill_remaining_enemies;
pub use super::hud::publish_hud_snapshot;

// === Components, Resources and Events ===
pub use super::clock::{DeferredWorkDue, EncounterClock, Scheduler, TaskOwner, DeferredWork};
pub use super::combat_core::{CombatantDowned, KillReward};
pub use super::components::{
    Combatant, CombatantState, EncounterStats, EncounterStatus, Enemy, GameRng, Player,
    PlayerInput, Viewport, WorldBounds,
};
pub use super::enemy_config::EnemyDefinitions;
pub use super::hud::HudSnapshot;
pub use super::progression::{LevelReached, Progression, SelectionQueue};
pub use super::projectiles::ProjectileLaunch;
pub use super::skill_config::SkillDefinitions;
pub use super::skills::SkillBook;
pub use super::spawn_director::{EnemyRoster, SpawnDirector};

/// System set labels for encounter system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncounterPhase {
    Selection,
    Deferred,
    Spawning,
    Behavior,
    Abilities,
    Collision,
    Aftermath,
    Reporting,
}

/// Run condition: the simulation advances only while `Running`.
pub fn encounter_running(status: Res<EncounterStatus>) -> bool {
    *status == EncounterStatus::Running
}

/// Configures the ordering between encounter phases.
pub fn configure_encounter_phase_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            EncounterPhase::Selection,
            EncounterPhase::Deferred,
            EncounterPhase::Spawning,
            EncounterPhase::Behavior,
            EncounterPhase::Abilities,
            EncounterPhase::Collision,
            EncounterPhase::Aftermath,
            EncounterPhase::Reporting,
        )
            .chain(),
    );
}

/// Adds every encounter system in its phase.
pub fn add_core_encounter_systems(app: &mut App) {
    app.add_systems(Update, apply_skill_selection.in_set(EncounterPhase::Selection));

    app.add_systems(
        Update,
        (advance_clock, run_deferred_work, expire_combatant_timers)
            .chain()
            .in_set(EncounterPhase::Deferred)
            .run_if(encounter_running),
    );

    app.add_systems(
        Update,
        run_spawn_cycles
            .in_set(EncounterPhase::Spawning)
            .run_if(encounter_running),
    );

    // Flush spawned enemies before anything queries them
    app.add_systems(
        Update,
        apply_deferred
            .after(EncounterPhase::Spawning)
            .before(EncounterPhase::Behavior),
    );

    app.add_systems(
        Update,
        (move_player, update_enemy_behavior)
            .chain()
            .in_set(EncounterPhase::Behavior)
            .run_if(encounter_running),
    );

    app.add_systems(
        Update,
        (emit_burst_shots, dispatch_skills)
            .chain()
            .in_set(EncounterPhase::Abilities)
            .run_if(encounter_running),
    );

    app.add_systems(
        Update,
        (
            spawn_launched_projectiles,
            move_projectiles,
            resolve_projectile_hits,
            tick_area_zones,
            expire_projectiles,
            expire_area_zones,
        )
            .chain()
            .in_set(EncounterPhase::Collision)
            .run_if(encounter_running),
    );

    // Flush projectile and zone despawns before deaths are processed
    app.add_systems(
        Update,
        apply_deferred
            .after(EncounterPhase::Collision)
            .before(EncounterPhase::Aftermath),
    );

    app.add_systems(
        Update,
        (
            schedule_death_transitions,
            finish_deaths,
            prune_roster,
            collect_loot,
            apply_kill_rewards,
            reset_spawn_cycle,
        )
            .chain()
            .in_set(EncounterPhase::Aftermath)
            .run_if(encounter_running),
    );

    app.add_systems(
        Update,
        (kill_remaining_enemies, publish_hud_snapshot)
            .chain()
            .in_set(EncounterPhase::Reporting),
    );
}

/// Spawn the player, build the skill book and start the spawn cycle.
#[allow(clippy::too_many_arguments)]
pub fn setup_encounter(
    mut commands: Commands,
    settings: Res<EncounterSettings>,
    baseline: Res<BaselineStats>,
    skills: Res<SkillDefinitions>,
    clock: Res<EncounterClock>,
    mut scheduler: ResMut<Scheduler>,
    mut log: ResMut<EncounterLog>,
    viewport: Option<Res<Viewport>>,
    bounds: Option<Res<WorldBounds>>,
) {
    let world = bounds.map(|b| b.0).unwrap_or_else(|| {
        let rect = settings.world_rect();
        commands.insert_resource(WorldBounds(rect));
        rect
    });
    let center = world.center();
    if viewport.is_none() {
        commands.insert_resource(Viewport(settings.viewport_at(center)));
    }

    let now = clock.now();
    let player = commands
        .spawn((
            Combatant::new(
                baseline.max_health,
                0.0,
                baseline.move_speed,
                1.0,
                settings.player_grace_ms,
            ),
            Player {
                damage_multiplier: baseline.damage_multiplier,
            },
            Progression::default(),
            Transform::from_translation(center.extend(0.0)),
        ))
        .id();
    scheduler.schedule(
        TaskOwner::Combatant(player),
        now + settings.player_intro_ms,
        DeferredWork::EndSpawnIntro,
    );
    scheduler.schedule(
        TaskOwner::Director,
        now + settings.spawn_interval_ms,
        DeferredWork::SpawnCycle,
    );

    let book = SkillBook::new(player, &skills);
    let starting: Vec<&str> = book.unlocked().iter().map(|k| k.name()).collect();
    commands.insert_resource(book);

    log.register_combatant(super::constants::PLAYER_ID.to_string());
    log.log(
        LogEventType::Encounter,
        format!(
            "Encounter started: {:.0} health, starting skills {:?}",
            baseline.max_health, starting
        ),
    );
    info!(
        "Encounter started with {:.0} health and skills {:?}",
        baseline.max_health, starting
    );
}

/// Plugin that runs one encounter.
///
/// `EncounterSettings`, `BaselineStats`, `GameRng`, `Viewport` and
/// `WorldBounds` may be inserted beforehand; otherwise defaults are used.
pub struct EncounterPlugin {
    pub skills: SkillDefinitions,
    pub enemies: EnemyDefinitions,
}

impl EncounterPlugin {
    pub fn new(skills: SkillDefinitions, enemies: EnemyDefinitions) -> Self {
        Self { skills, enemies }
    }
}

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }

        app.insert_resource(self.skills.clone())
            .insert_resource(self.enemies.clone())
            .init_resource::<Time>()
            .init_resource::<EncounterSettings>()
            .init_resource::<BaselineStats>()
            .init_resource::<GameRng>()
            .init_resource::<EncounterClock>()
            .init_resource::<Scheduler>()
            .init_resource::<EncounterStatus>()
            .init_resource::<EncounterStats>()
            .init_resource::<PlayerInput>()
            .init_resource::<EnemyRoster>()
            .init_resource::<SpawnDirector>()
            .init_resource::<SelectionQueue>()
            .init_resource::<SkillBook>()
            .init_resource::<HudSnapshot>()
            .add_event::<DeferredWorkDue>()
            .add_event::<CombatantDowned>()
            .add_event::<KillReward>()
            .add_event::<ProjectileLaunch>()
            .add_event::<LevelReached>()
            .add_systems(Startup, setup_encounter);

        configure_encounter_phase_ordering(app);
        add_core_encounter_systems(app);
    }
}
