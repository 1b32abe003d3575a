//! JSON configuration parsing for headless mode
//!
//! Describes one unattended encounter: seed, time limit, persisted item levels
//! and how skill selections are answered.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::settings::BaselineStats;

/// How the headless collaborator answers skill selection requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Unlock the first locked skill in pool order, else upgrade the first upgradable one
    FirstAvailable,
    /// Pick uniformly among actionable offers using the encounter RNG
    Random,
}

/// Shop item levels feeding the player's baseline stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLevels {
    #[serde(default)]
    pub sword: u32,
    #[serde(default)]
    pub shield: u32,
    #[serde(default)]
    pub boots: u32,
}

/// Headless encounter configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessEncounterConfig {
    /// Random seed for deterministic reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Maximum encounter time in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Custom output path for the encounter log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub items: ItemLevels,
    /// "FirstAvailable" (default) or "Random"
    #[serde(default = "default_selection_policy")]
    pub selection_policy: String,
    /// Override for assets/config/skills.ron
    #[serde(default)]
    pub skills_path: Option<String>,
    /// Override for assets/config/enemies.ron
    #[serde(default)]
    pub enemies_path: Option<String>,
    /// Override for assets/config/encounter.ron
    #[serde(default)]
    pub settings_path: Option<String>,
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_selection_policy() -> String {
    "FirstAvailable".to_string()
}

impl Default for HeadlessEncounterConfig {
    fn default() -> Self {
        Self {
            random_seed: None,
            max_duration_secs: default_max_duration(),
            output_path: None,
            items: ItemLevels::default(),
            selection_policy: default_selection_policy(),
            skills_path: None,
            enemies_path: None,
            settings_path: None,
        }
    }
}

impl HeadlessEncounterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: HeadlessEncounterConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs <= 0.0 || !self.max_duration_secs.is_finite() {
            return Err("max_duration_secs must be positive".to_string());
        }
        self.policy()?;
        Ok(())
    }

    pub fn policy(&self) -> Result<SelectionPolicy, String> {
        match self.selection_policy.as_str() {
            "FirstAvailable" => Ok(SelectionPolicy::FirstAvailable),
            "Random" => Ok(SelectionPolicy::Random),
            other => Err(format!(
                "Unknown selection policy: '{}'. Valid policies: FirstAvailable, Random",
                other
            )),
        }
    }

    pub fn baseline(&self) -> BaselineStats {
        BaselineStats::from_item_levels(self.items.sword, self.items.shield, self.items.boots)
    }
}
