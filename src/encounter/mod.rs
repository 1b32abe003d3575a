//! Encounter simulation core
//!
//! A single player fights escalating waves of enemies:
//!
//! ## Combat
//! - **Combatants**: Shared state machine (`Spawning → Idle ⇄ Walking ⇄ Attacking`,
//!   terminal `Dead`) with a per-combatant grace window after each hit
//! - **Enemies**: Walk toward the player and attack on a fixed cadence once inside
//!   their engagement radius
//! - **Skills**: Cooldown-gated, auto-targeting; projectiles, auras and chain bursts
//! - **Zones**: Lingering impact areas that damage once per interval and slow
//!
//! ## Pressure and Progression
//! - **Spawn director**: Budgeted waves from per-level pools, periodic elites
//! - **Progression**: Kills grant experience; level-ups suspend the encounter
//!   until a skill is unlocked or upgraded
//!
//! ## Flow
//! 1. `setup_encounter`: Spawns the player, builds the skill book, starts spawning
//! 2. Phase-ordered systems run each frame (see `systems`)
//! 3. The encounter ends when the player dies or reaches the winning level

pub mod auras;
pub mod clock;
pub mod combat_core;
pub mod components;
pub mod constants;
pub mod enemy_config;
pub mod hud;
pub mod progression;
pub mod projectiles;
pub mod skill_config;
pub mod skill_dispatch;
pub mod skills;
pub mod spawn_director;
pub mod systems;
pub mod utils;

pub use components::*;
pub use enemy_config::{EnemyDefinitions, EnemyKind};
pub use skill_config::SkillDefinitions;
pub use skills::{SkillBehavior, SkillKind};
pub use systems::{EncounterPhase, EncounterPlugin};
