//! Encounter tuning settings
//!
//! Balance constants for the simulation core, loaded from
//! `assets/config/encounter.ron`. Missing or malformed files fall back to the
//! built-in defaults so a broken settings file never blocks an encounter.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::encounter::constants::SETTINGS_PATH;

/// Tuning values for one encounter.
///
/// Every field has a default, so a settings file only needs to list the values
/// it overrides.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterSettings {
    /// Size of the playable world (width, height). The player starts at its center.
    pub world_size: (f32, f32),
    /// Size of the visible area used for spawn placement and projectile culling.
    pub viewport_size: (f32, f32),
    /// Delay between spawn cycles in milliseconds.
    pub spawn_interval_ms: u64,
    /// Wave budget per player level (budget = level × this).
    pub difficulty_per_level: u32,
    /// How far outside the viewport edge new enemies appear.
    pub spawn_margin: f32,
    /// Number of regular spawns before the next spawn is promoted to elite.
    pub elite_threshold: u32,
    /// Health and damage multiplier applied to elite enemies.
    pub elite_multiplier: f32,
    /// Enemy spawn intro length; enemies cannot act until it completes.
    pub spawn_intro_ms: u64,
    /// Player spawn intro length.
    pub player_intro_ms: u64,
    /// Damage immunity window after an enemy is hit.
    pub enemy_grace_ms: u64,
    /// Damage immunity window after the player is hit.
    pub player_grace_ms: u64,
    /// Delay between a combatant's death and its removal/rewards.
    pub death_delay_ms: u64,
    /// Experience granted per enemy kill.
    pub kill_experience: u32,
    /// Reaching this level wins the encounter.
    pub win_level: u32,
    /// Delay between consecutive shots of one multi-shot activation.
    pub burst_stagger_ms: u64,
    /// Safety lifetime for every projectile.
    pub projectile_lifetime_ms: u64,
    /// Distance at which a projectile counts as touching an enemy.
    pub projectile_hit_radius: f32,
    /// Coin value per point of enemy difficulty.
    pub loot_base_value: u32,
    /// Distance at which the player picks up dropped loot.
    pub loot_pickup_radius: f32,
}

impl Default for EncounterSettings {
    fn default() -> Self {
        Self {
            world_size: (5120.0, 2880.0),
            viewport_size: (1280.0, 720.0),
            spawn_interval_ms: 3000,
            difficulty_per_level: 4,
            spawn_margin: 100.0,
            elite_threshold: 10,
            elite_multiplier: 2.0,
            spawn_intro_ms: 2000,
            player_intro_ms: 2000,
            enemy_grace_ms: 100,
            player_grace_ms: 300,
            death_delay_ms: 600,
            kill_experience: 10,
            win_level: 15,
            burst_stagger_ms: 150,
            projectile_lifetime_ms: 3000,
            projectile_hit_radius: 16.0,
            loot_base_value: 10,
            loot_pickup_radius: 40.0,
        }
    }
}

impl EncounterSettings {
    /// Load settings from the default location, or return defaults.
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_PATH))
    }

    /// Load settings from `path`, or return defaults if it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No encounter settings at {:?}, using defaults", path);
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<Self>(&contents) {
                Ok(settings) => match settings.validate() {
                    Ok(()) => {
                        info!("Loaded encounter settings from {:?}", path);
                        settings
                    }
                    Err(e) => {
                        warn!("Invalid encounter settings in {:?}: {}", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to parse encounter settings: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read encounter settings: {}", e);
                Self::default()
            }
        }
    }

    /// Check the values that would stall or break the simulation.
    pub fn validate(&self) -> Result<(), String> {
        if self.world_size.0 <= 0.0 || self.world_size.1 <= 0.0 {
            return Err("world_size must be positive".to_string());
        }
        if self.viewport_size.0 <= 0.0 || self.viewport_size.1 <= 0.0 {
            return Err("viewport_size must be positive".to_string());
        }
        if self.spawn_interval_ms == 0 {
            return Err("spawn_interval_ms must be positive".to_string());
        }
        if self.difficulty_per_level == 0 {
            return Err("difficulty_per_level must be positive".to_string());
        }
        if self.elite_multiplier <= 0.0 {
            return Err("elite_multiplier must be positive".to_string());
        }
        if self.win_level < 2 {
            return Err(format!("win_level must be at least 2, got {}", self.win_level));
        }
        Ok(())
    }

    /// The world rectangle, anchored at the origin.
    pub fn world_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.world_size.0, self.world_size.1)
    }

    /// A viewport-sized rectangle centered on `center`.
    pub fn viewport_at(&self, center: Vec2) -> Rect {
        Rect::from_center_size(center, Vec2::new(self.viewport_size.0, self.viewport_size.1))
    }
}

/// Persisted player stats, injected when the player combatant is created.
///
/// The shop layer owns the stored item levels; the core only sees the
/// resulting numbers.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub max_health: f32,
    /// Multiplier applied to every skill's damage.
    pub damage_multiplier: f32,
    pub move_speed: f32,
}

impl Default for BaselineStats {
    fn default() -> Self {
        Self::from_item_levels(0, 0, 0)
    }
}

impl BaselineStats {
    const BASE_HEALTH: f32 = 100.0;
    const HEALTH_PER_LEVEL: f32 = 5.0;
    const BASE_DAMAGE: f32 = 5.0;
    const DAMAGE_PER_LEVEL: f32 = 5.0;
    const BASE_SPEED: f32 = 100.0;
    const SPEED_PER_LEVEL: f32 = 5.0;

    /// Derive stats from shop item levels (sword → damage, shield → health, boots → speed).
    pub fn from_item_levels(sword: u32, shield: u32, boots: u32) -> Self {
        let damage = Self::BASE_DAMAGE + sword as f32 * Self::DAMAGE_PER_LEVEL;
        Self {
            max_health: Self::BASE_HEALTH + shield as f32 * Self::HEALTH_PER_LEVEL,
            damage_multiplier: damage / Self::BASE_DAMAGE,
            move_speed: Self::BASE_SPEED + boots as f32 * Self::SPEED_PER_LEVEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(EncounterSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_settings_file_keeps_defaults() {
        let settings: EncounterSettings =
            ron::from_str("(spawn_interval_ms: 1500, win_level: 5)").unwrap();
        assert_eq!(settings.spawn_interval_ms, 1500);
        assert_eq!(settings.win_level, 5);
        assert_eq!(settings.difficulty_per_level, 4);
        assert_eq!(settings.elite_threshold, 10);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let settings = EncounterSettings {
            spawn_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = EncounterSettings::load_from(Path::new("does/not/exist.ron"));
        assert_eq!(settings, EncounterSettings::default());
    }

    #[test]
    fn test_baseline_from_item_levels() {
        let base = BaselineStats::from_item_levels(0, 0, 0);
        assert_eq!(base.max_health, 100.0);
        assert_eq!(base.damage_multiplier, 1.0);
        assert_eq!(base.move_speed, 100.0);

        let upgraded = BaselineStats::from_item_levels(1, 2, 3);
        assert_eq!(upgraded.max_health, 110.0);
        assert_eq!(upgraded.damage_multiplier, 2.0);
        assert_eq!(upgraded.move_speed, 115.0);
    }

    #[test]
    fn test_viewport_is_centered() {
        let settings = EncounterSettings::default();
        let view = settings.viewport_at(Vec2::new(1000.0, 500.0));
        assert_eq!(view.center(), Vec2::new(1000.0, 500.0));
        assert_eq!(view.width(), 1280.0);
    }
}
