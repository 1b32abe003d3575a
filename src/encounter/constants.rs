//! Encounter Constants
//!
//! Fixed values that are not part of `EncounterSettings`.

// ============================================================================
// Data Files
// ============================================================================

pub const SKILLS_CONFIG_PATH: &str = "assets/config/skills.ron";
pub const ENEMIES_CONFIG_PATH: &str = "assets/config/enemies.ron";
pub const SETTINGS_PATH: &str = "assets/config/encounter.ron";

// ============================================================================
// Skills
// ============================================================================

/// Lowest cooldown a skill can reach through cooldown upgrades (ms).
pub const MIN_COOLDOWN_MS: u64 = 100;

/// Ability name recorded for enemy melee hits in the encounter log.
pub const CONTACT_ABILITY: &str = "Contact";

// ============================================================================
// Spawning
// ============================================================================

/// Weight charged for an archetype whose difficulty is zero.
pub const MIN_SPAWN_WEIGHT: u32 = 1;

/// Hard cap on spawns in a single wave.
pub const MAX_SPAWNS_PER_WAVE: usize = 256;

// ============================================================================
// Identifiers
// ============================================================================

pub const PLAYER_ID: &str = "Player";
