//! Encounter logging
//!
//! Records every spawn, hit, death and progression step for post-encounter
//! analysis. Entries are timestamped with encounter time and can be exported
//! to JSON alongside a metadata block.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Stable identifier for a combatant in the log, e.g. `"Player"` or `"Goblin #12"`.
pub type CombatantId = String;

/// A single entry in the encounter log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Encounter time in milliseconds
    pub timestamp_ms: u64,
    pub event_type: LogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable payload for aggregation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogEventType {
    Spawn,
    Damage,
    Death,
    /// Skill activated, unlocked or upgraded
    Skill,
    /// Experience and level changes
    Progression,
    Loot,
    /// Encounter start/end and selection pauses
    Encounter,
}

/// Structured payloads carried by damage and death entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StructuredEventData {
    Damage {
        source: CombatantId,
        target: CombatantId,
        /// Skill name, or "Contact" for enemy melee
        ability: String,
        amount: f32,
        killing_blow: bool,
    },
    Death {
        combatant: CombatantId,
        elite: bool,
    },
}

/// Summary written at the top of an exported log
#[derive(Debug, Clone, Serialize)]
pub struct EncounterMetadata {
    pub outcome: String,
    pub level: u32,
    pub experience: u32,
    pub coins: u32,
    pub kills: u32,
    pub elite_kills: u32,
    pub duration_secs: f32,
    pub final_health: f32,
    pub max_health: f32,
    pub random_seed: Option<u64>,
    /// Unlocked skills with their levels, in unlock order
    pub skills: Vec<(String, u32)>,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a EncounterMetadata,
    entries: &'a [LogEntry],
}

/// The encounter log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct EncounterLog {
    /// All entries in chronological order
    pub entries: Vec<LogEntry>,
    /// Current encounter time, stamped on new entries
    pub time_ms: u64,
    registered: Vec<CombatantId>,
}

impl EncounterLog {
    /// Clear the log for a new encounter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.registered.clear();
        self.time_ms = 0;
    }

    pub fn log(&mut self, event_type: LogEventType, message: String) {
        self.entries.push(LogEntry {
            timestamp_ms: self.time_ms,
            event_type,
            message,
            data: None,
        });
    }

    /// Remember a combatant so it shows up in `all_combatants` even if it never fights.
    pub fn register_combatant(&mut self, id: CombatantId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    pub fn log_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        killing_blow: bool,
        message: String,
    ) {
        self.entries.push(LogEntry {
            timestamp_ms: self.time_ms,
            event_type: LogEventType::Damage,
            message,
            data: Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }),
        });
    }

    pub fn log_death(&mut self, combatant: CombatantId, elite: bool, message: String) {
        self.entries.push(LogEntry {
            timestamp_ms: self.time_ms,
            event_type: LogEventType::Death,
            message,
            data: Some(StructuredEventData::Death { combatant, elite }),
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: LogEventType) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&LogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn damage_entries(&self) -> impl Iterator<Item = (&str, &str, &str, f32, bool)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }) => Some((
                source.as_str(),
                target.as_str(),
                ability.as_str(),
                *amount,
                *killing_blow,
            )),
            _ => None,
        })
    }

    /// Damage dealt by `source`, keyed by ability name
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (src, _, ability, amount, _) in self.damage_entries() {
            if src == source {
                *totals.entry(ability.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> f32 {
        self.damage_entries()
            .filter(|(src, ..)| *src == source)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn total_damage_taken(&self, target: &str) -> f32 {
        self.damage_entries()
            .filter(|(_, tgt, ..)| *tgt == target)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.damage_entries()
            .filter(|(src, _, _, _, killing_blow)| *src == source && *killing_blow)
            .count()
    }

    /// Number of death entries, optionally restricted to elites
    pub fn death_count(&self, elites_only: bool) -> usize {
        self.entries
            .iter()
            .filter(|e| match &e.data {
                Some(StructuredEventData::Death { elite, .. }) => !elites_only || *elite,
                _ => false,
            })
            .count()
    }

    pub fn combatant_survived(&self, id: &str) -> bool {
        !self.entries.iter().any(|e| {
            matches!(&e.data, Some(StructuredEventData::Death { combatant, .. }) if combatant == id)
        })
    }

    /// Every combatant seen in the log, in first-seen order
    pub fn all_combatants(&self) -> Vec<CombatantId> {
        let mut seen = self.registered.clone();
        let mut push = |id: &str| {
            if !seen.iter().any(|s| s == id) {
                seen.push(id.to_string());
            }
        };
        for entry in &self.entries {
            match &entry.data {
                Some(StructuredEventData::Damage { source, target, .. }) => {
                    push(source);
                    push(target);
                }
                Some(StructuredEventData::Death { combatant, .. }) => push(combatant),
                None => {}
            }
        }
        seen
    }

    /// Write the log as JSON. Returns the path written.
    ///
    /// Without an explicit path the file goes to `encounter_logs/encounter_<unix secs>.json`.
    pub fn save_to_file(
        &self,
        metadata: &EncounterMetadata,
        path: Option<&str>,
    ) -> Result<String, String> {
        let filename = match path {
            Some(p) => p.to_string(),
            None => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("encounter_logs/encounter_{}.json", secs)
            }
        };

        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
            }
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| format!("Failed to serialize encounter log: {}", e))?;
        fs::write(&filename, json)
            .map_err(|e| format!("Failed to write encounter log to {}: {}", filename, e))?;

        Ok(filename)
    }
}
