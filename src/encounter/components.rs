//! Encounter components and resources
//!
//! Per-entity state (combatants, projectiles, zones, loot) and the
//! per-encounter resources the systems share.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::enemy_config::EnemyKind;
use super::skills::SkillKind;

// ============================================================================
// Resources
// ============================================================================

/// Seeded random source for spawn placement and archetype picks.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn random_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "random_index called with an empty range");
        self.rng.gen_range(0..len.max(1))
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Whether the simulation is advancing.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EncounterStatus {
    #[default]
    Running,
    /// Suspended until the pending skill selection is answered.
    AwaitingSelection,
    Won,
    Lost,
}

impl EncounterStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, EncounterStatus::Won | EncounterStatus::Lost)
    }
}

/// Visible area, maintained by the camera collaborator.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport(pub Rect);

/// Playable area; the player is kept inside it.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds(pub Rect);

/// Movement intent for the player, written by the input collaborator.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired direction; normalized before use, zero means stand still.
    pub movement: Vec2,
}

/// Running totals for the encounter.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EncounterStats {
    pub coins: u32,
    pub kills: u32,
    pub elite_kills: u32,
    pub enemies_spawned: u32,
    pub waves: u32,
}

// ============================================================================
// Combatants
// ============================================================================

/// Lifecycle state shared by the player and every enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatantState {
    /// Playing the spawn intro; cannot act or move.
    Spawning,
    Idle,
    Walking,
    Attacking,
    /// Terminal.
    Dead,
}

/// Result of a damage attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target was dead or inside its grace window.
    Ignored,
    Damaged { dealt: f32 },
    Killed { dealt: f32 },
}

impl DamageOutcome {
    pub fn dealt(&self) -> f32 {
        match self {
            DamageOutcome::Ignored => 0.0,
            DamageOutcome::Damaged { dealt } | DamageOutcome::Killed { dealt } => *dealt,
        }
    }

    pub fn is_kill(&self) -> bool {
        matches!(self, DamageOutcome::Killed { .. })
    }
}

/// Health, damage and state machine for any fighting entity.
#[derive(Component, Debug, Clone)]
pub struct Combatant {
    pub max_health: f32,
    pub current_health: f32,
    /// Damage dealt per contact hit
    pub damage: f32,
    /// Base movement speed in units per second
    pub move_speed: f32,
    /// Difficulty scalar the stats were derived from
    pub tier: f32,
    pub state: CombatantState,
    /// Set by a successful hit, cleared when the grace window ends
    pub recently_damaged: bool,
    /// When the current grace window ends (encounter ms)
    pub grace_expires_at: u64,
    /// Default grace window after a hit
    pub grace_ms: u64,
    /// Next contact attack time while attacking
    pub next_attack_at: u64,
    /// Current velocity (zero while attacking, spawning or dead)
    pub velocity: Vec2,
    /// Total damage taken, for results
    pub damage_taken: f32,
    /// Active slow modifiers keyed by the zone that applied them
    pub slows: SmallVec<[(Entity, f32); 2]>,
}

impl Combatant {
    pub fn new(max_health: f32, damage: f32, move_speed: f32, tier: f32, grace_ms: u64) -> Self {
        Self {
            max_health,
            current_health: max_health,
            damage,
            move_speed,
            tier,
            state: CombatantState::Spawning,
            recently_damaged: false,
            grace_expires_at: 0,
            grace_ms,
            next_attack_at: 0,
            velocity: Vec2::ZERO,
            damage_taken: 0.0,
            slows: SmallVec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != CombatantState::Dead
    }

    /// Whether the combatant may move, attack or use skills.
    pub fn can_act(&self) -> bool {
        !matches!(self.state, CombatantState::Spawning | CombatantState::Dead)
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.current_health / self.max_health
        }
    }

    /// Movement speed after slows.
    pub fn effective_speed(&self) -> f32 {
        self.slows
            .iter()
            .fold(self.move_speed, |speed, (_, factor)| speed * factor)
    }

    /// Complete the spawn intro. Returns false if the combatant was not spawning.
    pub fn finish_spawn_intro(&mut self) -> bool {
        if self.state == CombatantState::Spawning {
            self.state = CombatantState::Idle;
            true
        } else {
            false
        }
    }

    /// Apply a hit with the combatant's own grace window.
    pub fn take_damage(&mut self, amount: f32, now: u64) -> DamageOutcome {
        self.take_damage_with_grace(amount, now, self.grace_ms)
    }

    /// Apply a hit, opening a grace window of `grace_ms`.
    ///
    /// No-op while dead or inside a grace window. Health is clamped at zero and
    /// reaching zero kills the combatant.
    pub fn take_damage_with_grace(&mut self, amount: f32, now: u64, grace_ms: u64) -> DamageOutcome {
        debug_assert!(amount >= 0.0, "take_damage: negative damage {}", amount);

        if !self.is_alive() || self.recently_damaged {
            return DamageOutcome::Ignored;
        }

        let amount = amount.max(0.0);
        let dealt = amount.min(self.current_health);
        self.current_health = (self.current_health - amount).max(0.0);
        self.damage_taken += dealt;
        self.recently_damaged = true;
        self.grace_expires_at = now + grace_ms;

        if self.current_health <= 0.0 {
            self.die();
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Damaged { dealt }
        }
    }

    /// Close the grace window if its expiry stamp has passed.
    ///
    /// A stale timer from an earlier hit never clears a newer window.
    pub fn end_grace_window(&mut self, now: u64) -> bool {
        if self.recently_damaged && now >= self.grace_expires_at {
            self.recently_damaged = false;
            true
        } else {
            false
        }
    }

    /// Enter the terminal state. Returns true only on the first call.
    pub fn die(&mut self) -> bool {
        if self.state == CombatantState::Dead {
            return false;
        }
        self.state = CombatantState::Dead;
        self.current_health = 0.0;
        self.velocity = Vec2::ZERO;
        self.recently_damaged = false;
        true
    }

    /// Apply a slow from `source`. Each source slows a combatant at most once.
    pub fn apply_slow(&mut self, source: Entity, factor: f32) -> bool {
        if self.slows.iter().any(|(s, _)| *s == source) {
            return false;
        }
        self.slows.push((source, factor.clamp(0.0, 1.0)));
        true
    }

    pub fn remove_slow(&mut self, source: Entity) {
        self.slows.retain(|(s, _)| *s != source);
    }
}

/// Marker and stats for the player character.
#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    /// Applied to every skill's damage
    pub damage_multiplier: f32,
}

/// Enemy archetype data.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub elite: bool,
    /// Difficulty weight of the archetype
    pub difficulty: u32,
    /// Engagement radius: walk while farther, attack while inside
    pub attack_range: f32,
    pub attack_interval_ms: u64,
}

// ============================================================================
// Projectiles, zones and loot
// ============================================================================

/// Lingering damage area left behind by a projectile impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub radius: f32,
    pub damage: f32,
    /// Minimum time between hits on the same occupant
    pub interval_ms: u64,
    /// Fixed lifetime of the zone
    pub duration_ms: u64,
    /// Movement multiplier applied once to each occupant, reverted on expiry
    #[serde(default)]
    pub slow: Option<f32>,
}

/// A travelling skill shot.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub skill: SkillKind,
    pub damage: f32,
    /// Homing target; `None` once the target is gone
    pub target: Option<Entity>,
    /// Unit direction of travel
    pub heading: Vec2,
    pub speed: f32,
    pub homing: bool,
    pub expires_at: u64,
    pub impact_zone: Option<ZoneSpec>,
}

/// A stationary damage area.
#[derive(Component, Debug, Clone)]
pub struct AreaEffectZone {
    pub skill: SkillKind,
    pub radius: f32,
    pub damage: f32,
    pub interval_ms: u64,
    pub expires_at: u64,
    pub slow: Option<f32>,
    /// Enemies currently carrying this zone's slow
    pub slowed: SmallVec<[Entity; 8]>,
}

impl AreaEffectZone {
    pub fn from_spec(skill: SkillKind, spec: &ZoneSpec, now: u64) -> Self {
        Self {
            skill,
            radius: spec.radius,
            damage: spec.damage,
            interval_ms: spec.interval_ms,
            expires_at: now + spec.duration_ms,
            slow: spec.slow,
            slowed: SmallVec::new(),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Coin dropped by an elite, collected by walking over it.
#[derive(Component, Debug, Clone, Copy)]
pub struct Loot {
    pub value: u32,
}
