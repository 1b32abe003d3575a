//! Data-Driven Skill Configuration
//!
//! Skill stats are defined in `assets/config/skills.ron` rather than in code.
//! Every `SkillKind` must have an entry; loading fails otherwise.
//!
//! ## Usage
//! ```ignore
//! fn my_system(skills: Res<SkillDefinitions>) {
//!     if let Some(def) = skills.get(&SkillKind::Comet) {
//!         println!("Comet cooldown: {} ms", def.cooldown_ms);
//!     }
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::components::ZoneSpec;
use super::constants::SKILLS_CONFIG_PATH;
use super::skills::{SkillBehavior, SkillKind, UpgradePath};

fn default_quantity() -> u32 {
    1
}

/// Stats for one skill at level 1.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Display name
    pub name: String,
    pub behavior: SkillBehavior,
    pub cooldown_ms: u64,
    pub range: f32,
    pub damage: f32,
    /// Shots per activation (projectiles) or targets per activation (chain burst)
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub max_level: u32,
    /// Level the skill starts at; 0 means it must be unlocked first
    #[serde(default)]
    pub starting_level: u32,
    /// Required for projectile behaviors
    #[serde(default)]
    pub projectile_speed: Option<f32>,
    /// Zone left at the impact point of each projectile
    #[serde(default)]
    pub impact_zone: Option<ZoneSpec>,
    pub upgrade: UpgradePath,
}

impl SkillConfig {
    fn check(&self, kind: SkillKind) -> Result<(), String> {
        let name = kind.name();
        if self.max_level == 0 {
            return Err(format!("{}: max_level must be at least 1", name));
        }
        if self.starting_level > self.max_level {
            return Err(format!(
                "{}: starting_level {} exceeds max_level {}",
                name, self.starting_level, self.max_level
            ));
        }
        if self.cooldown_ms == 0 {
            return Err(format!("{}: cooldown_ms must be positive", name));
        }
        if self.range <= 0.0 || self.damage < 0.0 {
            return Err(format!("{}: range must be positive and damage non-negative", name));
        }
        if self.quantity == 0 {
            return Err(format!("{}: quantity must be at least 1", name));
        }
        if self.behavior.launches_projectiles() && self.projectile_speed.map_or(true, |s| s <= 0.0) {
            return Err(format!("{}: projectile behaviors need a positive projectile_speed", name));
        }
        if let Some(zone) = &self.impact_zone {
            if zone.radius <= 0.0 || zone.interval_ms == 0 || zone.duration_ms == 0 {
                return Err(format!("{}: impact zone needs positive radius, interval and duration", name));
            }
        }
        Ok(())
    }
}

/// Root structure for the skills.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub skills: HashMap<SkillKind, SkillConfig>,
}

/// Resource containing all skill definitions.
#[derive(Resource, Debug, Clone)]
pub struct SkillDefinitions {
    definitions: HashMap<SkillKind, SkillConfig>,
}

impl SkillDefinitions {
    pub fn new(config: SkillsConfig) -> Self {
        Self {
            definitions: config.skills,
        }
    }

    pub fn get(&self, kind: &SkillKind) -> Option<&SkillConfig> {
        self.definitions.get(kind)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Check every skill kind is defined.
    pub fn missing(&self) -> Vec<SkillKind> {
        SkillKind::ALL
            .into_iter()
            .filter(|kind| !self.definitions.contains_key(kind))
            .collect()
    }

    /// Check completeness and per-skill values.
    pub fn validate(&self) -> Result<(), String> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(format!("Missing skill definitions: {:?}", missing));
        }
        for kind in SkillKind::ALL {
            if let Some(config) = self.definitions.get(&kind) {
                config.check(kind)?;
            }
        }
        Ok(())
    }
}

/// Parse and validate skill definitions from RON text.
pub fn parse_skill_definitions(contents: &str) -> Result<SkillDefinitions, String> {
    let config: SkillsConfig =
        ron::from_str(contents).map_err(|e| format!("Failed to parse skill definitions: {}", e))?;
    let definitions = SkillDefinitions::new(config);
    definitions.validate()?;
    Ok(definitions)
}

/// Load skill definitions from `path`.
pub fn load_skill_definitions_from(path: &Path) -> Result<SkillDefinitions, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let definitions = parse_skill_definitions(&contents)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    info!("Loaded {} skill definitions from {}", definitions.len(), path.display());
    Ok(definitions)
}

/// Load skill definitions from assets/config/skills.ron
pub fn load_skill_definitions() -> Result<SkillDefinitions, String> {
    load_skill_definitions_from(Path::new(SKILLS_CONFIG_PATH))
}
