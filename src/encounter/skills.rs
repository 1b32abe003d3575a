//! Skills
//!
//! Skill kinds, per-skill runtime state and the `SkillBook` that holds the
//! player's pool and unlock order. Activation logic lives in `skill_dispatch`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::events::{SelectionRequest, SkillOffer, SkillSelection};
use super::components::ZoneSpec;
use super::constants::MIN_COOLDOWN_MS;
use super::skill_config::{SkillConfig, SkillDefinitions};

/// Every skill in the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillKind {
    Comet,
    Aura,
    Venom,
    Lightning,
}

impl SkillKind {
    /// Pool order: the order offers are presented in.
    pub const ALL: [SkillKind; 4] = [
        SkillKind::Comet,
        SkillKind::Aura,
        SkillKind::Venom,
        SkillKind::Lightning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Comet => "Comet",
            SkillKind::Aura => "Aura",
            SkillKind::Venom => "Venom",
            SkillKind::Lightning => "Lightning",
        }
    }
}

/// How a skill reaches its targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillBehavior {
    /// Projectiles that chase the closest enemy
    HomingProjectile,
    /// Projectiles aimed once at the closest enemy
    VolleyProjectile,
    /// Instant damage to every enemy in range
    Aura,
    /// Instant damage to the `quantity` nearest enemies in range
    ChainBurst,
}

impl SkillBehavior {
    pub fn launches_projectiles(&self) -> bool {
        matches!(self, SkillBehavior::HomingProjectile | SkillBehavior::VolleyProjectile)
    }
}

/// Stat changes applied by one upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UpgradePath {
    Range {
        damage: f32,
        range: f32,
        #[serde(default)]
        quantity: u32,
    },
    Cooldown {
        damage: f32,
        cooldown_ms: u64,
        #[serde(default)]
        quantity: u32,
    },
}

/// Why a skill selection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// Neither unlock nor upgrade was requested
    NoChoice,
    UnknownSkill(SkillKind),
    AlreadyUnlocked(SkillKind),
    NotUnlocked(SkillKind),
    AtMaxLevel(SkillKind),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NoChoice => write!(f, "selection neither unlocks nor upgrades"),
            SelectionError::UnknownSkill(kind) => write!(f, "{} is not in the skill pool", kind.name()),
            SelectionError::AlreadyUnlocked(kind) => write!(f, "{} is already unlocked", kind.name()),
            SelectionError::NotUnlocked(kind) => write!(f, "{} must be unlocked before upgrading", kind.name()),
            SelectionError::AtMaxLevel(kind) => write!(f, "{} is already at max level", kind.name()),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Runtime state of one skill.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub kind: SkillKind,
    /// Display name from the skill definitions
    pub name: String,
    pub behavior: SkillBehavior,
    pub cooldown_ms: u64,
    /// Encounter time of the last activation
    pub last_used: Option<u64>,
    pub range: f32,
    /// 0 = locked
    pub level: u32,
    pub max_level: u32,
    pub damage: f32,
    /// Shots per activation, or targets per activation for chain bursts
    pub quantity: u32,
    pub projectile_speed: f32,
    pub impact_zone: Option<ZoneSpec>,
    pub upgrade: UpgradePath,
}

impl Skill {
    pub fn from_config(kind: SkillKind, config: &SkillConfig) -> Self {
        Self {
            kind,
            name: config.name.clone(),
            behavior: config.behavior,
            cooldown_ms: config.cooldown_ms,
            last_used: None,
            range: config.range,
            level: config.starting_level,
            max_level: config.max_level,
            damage: config.damage,
            quantity: config.quantity,
            projectile_speed: config.projectile_speed.unwrap_or(0.0),
            impact_zone: config.impact_zone,
            upgrade: config.upgrade,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.level > 0
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// Ready when never used or the cooldown has fully elapsed.
    pub fn can_activate(&self, now: u64) -> bool {
        match self.last_used {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.cooldown_ms,
        }
    }

    pub fn mark_used(&mut self, now: u64) {
        debug_assert!(self.can_activate(now), "{:?} used during cooldown", self.kind);
        self.last_used = Some(now);
    }

    pub fn unlock(&mut self) -> Result<(), SelectionError> {
        if self.is_unlocked() {
            return Err(SelectionError::AlreadyUnlocked(self.kind));
        }
        self.level = 1;
        Ok(())
    }

    /// Raise the level by one and apply the upgrade path.
    pub fn upgrade(&mut self) -> Result<(), SelectionError> {
        if !self.is_unlocked() {
            return Err(SelectionError::NotUnlocked(self.kind));
        }
        if self.is_max_level() {
            return Err(SelectionError::AtMaxLevel(self.kind));
        }

        match self.upgrade {
            UpgradePath::Range {
                damage,
                range,
                quantity,
            } => {
                self.damage += damage;
                self.range += range;
                self.quantity += quantity;
            }
            UpgradePath::Cooldown {
                damage,
                cooldown_ms,
                quantity,
            } => {
                self.damage += damage;
                self.cooldown_ms = self.cooldown_ms.saturating_sub(cooldown_ms).max(MIN_COOLDOWN_MS);
                self.quantity += quantity;
            }
        }
        self.level += 1;
        Ok(())
    }

    pub fn offer(&self) -> SkillOffer {
        SkillOffer {
            skill: self.kind,
            level: self.level,
            max_level: self.max_level,
            can_unlock: !self.is_unlocked(),
            can_upgrade: self.is_unlocked() && !self.is_max_level(),
        }
    }
}

/// Result of an accepted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillChange {
    Unlocked(SkillKind),
    Upgraded { skill: SkillKind, level: u32 },
}

/// The player's skill pool and unlock order.
#[derive(Resource, Debug, Default, Clone)]
pub struct SkillBook {
    owner: Option<Entity>,
    skills: Vec<Skill>,
    unlocked: Vec<SkillKind>,
}

impl SkillBook {
    /// Build the pool for `owner`; skills with a starting level begin unlocked.
    pub fn new(owner: Entity, definitions: &SkillDefinitions) -> Self {
        let skills: Vec<Skill> = SkillKind::ALL
            .iter()
            .filter_map(|kind| definitions.get(kind).map(|config| Skill::from_config(*kind, config)))
            .collect();
        let unlocked = skills.iter().filter(|s| s.is_unlocked()).map(|s| s.kind).collect();
        Self {
            owner: Some(owner),
            skills,
            unlocked,
        }
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// Unlocked skills in unlock order.
    pub fn unlocked(&self) -> &[SkillKind] {
        &self.unlocked
    }

    pub fn get(&self, kind: SkillKind) -> Option<&Skill> {
        self.skills.iter().find(|s| s.kind == kind)
    }

    pub fn get_mut(&mut self, kind: SkillKind) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|s| s.kind == kind)
    }

    /// Unlocked skills, in pool order.
    pub fn unlocked_mut(&mut self) -> impl Iterator<Item = &mut Skill> {
        self.skills.iter_mut().filter(|s| s.is_unlocked())
    }

    pub fn offers(&self) -> Vec<SkillOffer> {
        self.skills.iter().map(Skill::offer).collect()
    }

    pub fn selection_request(&self) -> SelectionRequest {
        SelectionRequest {
            pool: self.skills.clone(),
            unlocked: self.unlocked.clone(),
            offers: self.offers(),
        }
    }

    /// Apply a collaborator's answer, checked against the current pool state.
    pub fn apply_selection(&mut self, selection: SkillSelection) -> Result<SkillChange, SelectionError> {
        if !selection.can_unlock && !selection.can_upgrade {
            return Err(SelectionError::NoChoice);
        }
        let skill = self
            .get_mut(selection.skill)
            .ok_or(SelectionError::UnknownSkill(selection.skill))?;

        if selection.can_unlock {
            skill.unlock()?;
            self.unlocked.push(selection.skill);
            Ok(SkillChange::Unlocked(selection.skill))
        } else {
            skill.upgrade()?;
            Ok(SkillChange::Upgraded {
                skill: selection.skill,
                level: skill.level,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comet() -> Skill {
        Skill {
            kind: SkillKind::Comet,
            name: "Comet".to_string(),
            behavior: SkillBehavior::VolleyProjectile,
            cooldown_ms: 1000,
            last_used: None,
            range: 200.0,
            level: 1,
            max_level: 3,
            damage: 10.0,
            quantity: 1,
            projectile_speed: 150.0,
            impact_zone: None,
            upgrade: UpgradePath::Cooldown {
                damage: 5.0,
                cooldown_ms: 600,
                quantity: 1,
            },
        }
    }

    #[test]
    fn test_cooldown_gate() {
        let mut skill = comet();
        assert!(skill.can_activate(0));
        skill.mark_used(500);
        assert!(!skill.can_activate(500));
        assert!(!skill.can_activate(1499));
        assert!(skill.can_activate(1500));
    }

    #[test]
    fn test_cooldown_upgrade_floors_at_minimum() {
        let mut skill = comet();
        skill.upgrade().unwrap();
        assert_eq!(skill.cooldown_ms, 400);
        assert_eq!(skill.damage, 15.0);
        assert_eq!(skill.quantity, 2);
        assert_eq!(skill.level, 2);

        skill.upgrade().unwrap();
        assert_eq!(skill.cooldown_ms, MIN_COOLDOWN_MS);
        assert_eq!(skill.level, 3);
        assert_eq!(skill.upgrade(), Err(SelectionError::AtMaxLevel(SkillKind::Comet)));
    }

    #[test]
    fn test_range_upgrade() {
        let mut skill = comet();
        skill.upgrade = UpgradePath::Range {
            damage: 2.0,
            range: 25.0,
            quantity: 0,
        };
        skill.upgrade().unwrap();
        assert_eq!(skill.range, 225.0);
        assert_eq!(skill.damage, 12.0);
        assert_eq!(skill.quantity, 1);
        assert_eq!(skill.cooldown_ms, 1000);
    }

    #[test]
    fn test_locked_skill_cannot_upgrade() {
        let mut skill = comet();
        skill.level = 0;
        assert_eq!(skill.upgrade(), Err(SelectionError::NotUnlocked(SkillKind::Comet)));
        skill.unlock().unwrap();
        assert_eq!(skill.level, 1);
        assert_eq!(skill.unlock(), Err(SelectionError::AlreadyUnlocked(SkillKind::Comet)));
    }

    #[test]
    fn test_offer_flags() {
        let mut skill = comet();
        let offer = skill.offer();
        assert!(!offer.can_unlock);
        assert!(offer.can_upgrade);

        skill.level = skill.max_level;
        assert!(!skill.offer().is_actionable());

        skill.level = 0;
        let offer = skill.offer();
        assert!(offer.can_unlock);
        assert!(!offer.can_upgrade);
    }
}
