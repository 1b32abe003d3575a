//! Data-Driven Enemy Configuration
//!
//! Enemy archetypes and the per-level spawn pools, loaded from
//! `assets/config/enemies.ron`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::constants::{ENEMIES_CONFIG_PATH, MIN_SPAWN_WEIGHT};

/// Enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    Skeleton,
    Eye,
    Goblin,
    GreenSkeleton,
    Mushroom,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Skeleton,
        EnemyKind::Eye,
        EnemyKind::Goblin,
        EnemyKind::GreenSkeleton,
        EnemyKind::Mushroom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Skeleton => "Skeleton",
            EnemyKind::Eye => "Eye",
            EnemyKind::Goblin => "Goblin",
            EnemyKind::GreenSkeleton => "Green Skeleton",
            EnemyKind::Mushroom => "Mushroom",
        }
    }
}

/// Stats of one archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    /// Spawn weight and stat scalar
    pub difficulty: u32,
    pub speed: f32,
    /// Engagement radius
    pub attack_range: f32,
    pub attack_interval_ms: u64,
}

impl ArchetypeConfig {
    /// Budget cost of one spawn. Zero difficulties still cost something.
    pub fn weight(&self) -> u32 {
        self.difficulty.max(MIN_SPAWN_WEIGHT)
    }
}

/// Derived stats for one spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    pub damage: f32,
    pub tier: f32,
}

/// Root structure for the enemies.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct EnemiesConfig {
    /// Health per point of difficulty
    pub base_health: f32,
    /// Contact damage per point of difficulty
    pub base_damage: f32,
    pub archetypes: HashMap<EnemyKind, ArchetypeConfig>,
    /// Archetypes eligible at each player level
    pub pools: BTreeMap<u32, Vec<EnemyKind>>,
}

/// Resource containing archetypes and spawn pools.
#[derive(Resource, Debug, Clone)]
pub struct EnemyDefinitions {
    base_health: f32,
    base_damage: f32,
    archetypes: HashMap<EnemyKind, ArchetypeConfig>,
    pools: BTreeMap<u32, Vec<EnemyKind>>,
}

impl EnemyDefinitions {
    pub fn new(config: EnemiesConfig) -> Self {
        Self {
            base_health: config.base_health,
            base_damage: config.base_damage,
            archetypes: config.archetypes,
            pools: config.pools,
        }
    }

    pub fn archetype(&self, kind: EnemyKind) -> Option<&ArchetypeConfig> {
        self.archetypes.get(&kind)
    }

    /// The cheapest defined archetype.
    pub fn lowest_tier(&self) -> Option<EnemyKind> {
        self.archetypes
            .iter()
            .min_by_key(|(kind, archetype)| (archetype.difficulty, **kind))
            .map(|(kind, _)| *kind)
    }

    /// Archetypes eligible at `level`.
    ///
    /// Unknown entries are skipped; a level with nothing usable falls back to
    /// the lowest-tier archetype so waves never stall.
    pub fn pool_for_level(&self, level: u32) -> Vec<EnemyKind> {
        let pool: Vec<EnemyKind> = self
            .pools
            .get(&level)
            .map(|kinds| {
                kinds
                    .iter()
                    .copied()
                    .filter(|kind| self.archetypes.contains_key(kind))
                    .collect()
            })
            .unwrap_or_default();

        if pool.is_empty() {
            self.lowest_tier().into_iter().collect()
        } else {
            pool
        }
    }

    /// Highest spawn weight of any archetype.
    pub fn max_weight(&self) -> u32 {
        self.archetypes.values().map(ArchetypeConfig::weight).max().unwrap_or(MIN_SPAWN_WEIGHT)
    }

    pub fn stats_for(&self, kind: EnemyKind, elite: bool, elite_multiplier: f32) -> Option<EnemyStats> {
        let archetype = self.archetype(kind)?;
        let tier = archetype.difficulty as f32;
        let scale = if elite { elite_multiplier } else { 1.0 };
        Some(EnemyStats {
            health: tier * self.base_health * scale,
            damage: tier * self.base_damage * scale,
            tier,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.archetypes.is_empty() {
            return Err("No enemy archetypes defined".to_string());
        }
        if self.base_health <= 0.0 || self.base_damage < 0.0 {
            return Err("base_health must be positive and base_damage non-negative".to_string());
        }
        for (kind, archetype) in &self.archetypes {
            if archetype.attack_interval_ms == 0 {
                return Err(format!("{}: attack_interval_ms must be positive", kind.name()));
            }
            if archetype.speed < 0.0 || archetype.attack_range < 0.0 {
                return Err(format!("{}: speed and attack_range must be non-negative", kind.name()));
            }
        }
        Ok(())
    }
}

/// Parse and validate enemy definitions from RON text.
pub fn parse_enemy_definitions(contents: &str) -> Result<EnemyDefinitions, String> {
    let config: EnemiesConfig =
        ron::from_str(contents).map_err(|e| format!("Failed to parse enemy definitions: {}", e))?;
    let definitions = EnemyDefinitions::new(config);
    definitions.validate()?;
    Ok(definitions)
}

pub fn load_enemy_definitions_from(path: &Path) -> Result<EnemyDefinitions, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let definitions = parse_enemy_definitions(&contents)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    info!(
        "Loaded {} enemy archetypes and {} level pools from {}",
        definitions.archetypes.len(),
        definitions.pools.len(),
        path.display()
    );
    Ok(definitions)
}

/// Load enemy definitions from assets/config/enemies.ron
pub fn load_enemy_definitions() -> Result<EnemyDefinitions, String> {
    load_enemy_definitions_from(Path::new(ENEMIES_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"(
        base_health: 10.0,
        base_damage: 2.0,
        archetypes: {
            Skeleton: (difficulty: 1, speed: 80.0, attack_range: 30.0, attack_interval_ms: 1000),
            Goblin: (difficulty: 5, speed: 90.0, attack_range: 30.0, attack_interval_ms: 800),
        },
        pools: {
            1: [Skeleton],
            2: [Mushroom],
            3: [Goblin, Skeleton],
        },
    )"#;

    #[test]
    fn test_pool_lookup() {
        let defs = parse_enemy_definitions(SMALL).unwrap();
        assert_eq!(defs.pool_for_level(3), vec![EnemyKind::Goblin, EnemyKind::Skeleton]);
    }

    #[test]
    fn test_unknown_or_missing_pools_fall_back_to_lowest_tier() {
        let defs = parse_enemy_definitions(SMALL).unwrap();
        assert_eq!(defs.pool_for_level(2), vec![EnemyKind::Skeleton]);
        assert_eq!(defs.pool_for_level(40), vec![EnemyKind::Skeleton]);
    }

    #[test]
    fn test_elite_stats_scale() {
        let defs = parse_enemy_definitions(SMALL).unwrap();
        let normal = defs.stats_for(EnemyKind::Goblin, false, 2.0).unwrap();
        let elite = defs.stats_for(EnemyKind::Goblin, true, 2.0).unwrap();
        assert_eq!(normal.health, 50.0);
        assert_eq!(normal.damage, 10.0);
        assert_eq!(elite.health, 100.0);
        assert_eq!(elite.damage, 20.0);
        assert!(defs.stats_for(EnemyKind::Mushroom, false, 2.0).is_none());
    }

    #[test]
    fn test_zero_difficulty_still_costs_budget() {
        let archetype = ArchetypeConfig {
            difficulty: 0,
            speed: 10.0,
            attack_range: 10.0,
            attack_interval_ms: 100,
        };
        assert_eq!(archetype.weight(), MIN_SPAWN_WEIGHT);
    }
}
