//! Progression
//!
//! Experience, levels and the skill selection protocol. Each level gained
//! queues one selection; while any selection is pending the encounter is
//! suspended and the collaborator is asked to choose.

use bevy::prelude::*;

use crate::combat::events::{EncounterEvent, Outbox, SkillSelection};
use crate::combat::log::{EncounterLog, LogEventType};
use crate::settings::EncounterSettings;
use super::clock::{Scheduler, TaskOwner};
use super::combat_core::KillReward;
use super::components::{EncounterStatus, Player};
use super::skills::{SkillBook, SkillChange};

/// Experience needed to leave `level`: `100 × ceil(1.5^(level − 1))`.
pub fn experience_threshold(level: u32) -> u32 {
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    let scale = 1.5f64.powi(exponent).ceil();
    (100.0 * scale).min(u32::MAX as f64) as u32
}

/// Player experience and level.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    pub experience: u32,
    pub level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            experience: 0,
            level: 1,
        }
    }
}

impl Progression {
    pub fn threshold(&self) -> u32 {
        experience_threshold(self.level)
    }

    /// Add experience. Returns the number of levels gained.
    ///
    /// One level per full threshold (at the current level) in the counter;
    /// the counter then resets to zero, discarding any excess.
    pub fn add_experience(&mut self, amount: u32) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let threshold = self.threshold();
        if self.experience < threshold {
            return 0;
        }
        let gained = self.experience / threshold;
        self.level += gained;
        self.experience = 0;
        gained
    }

    /// `add_experience` that never levels past `max_level`.
    pub fn add_experience_capped(&mut self, amount: u32, max_level: u32) -> u32 {
        let gained = self.add_experience(amount);
        let overshoot = self.level.saturating_sub(max_level).min(gained);
        self.level -= overshoot;
        gained - overshoot
    }
}

/// The player reached a new level.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelReached {
    pub level: u32,
}

/// Selections owed to the player.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionQueue {
    pub pending: u32,
}

/// Turn kill rewards into experience, level-ups, selections or a win.
#[allow(clippy::too_many_arguments)]
pub fn apply_kill_rewards(
    mut rewards: EventReader<KillReward>,
    mut players: Query<&mut Progression, With<Player>>,
    settings: Res<EncounterSettings>,
    book: Res<SkillBook>,
    mut status: ResMut<EncounterStatus>,
    mut queue: ResMut<SelectionQueue>,
    mut scheduler: ResMut<Scheduler>,
    mut outbox: ResMut<Outbox>,
    mut levels: EventWriter<LevelReached>,
    mut log: ResMut<EncounterLog>,
) {
    let Ok(mut progression) = players.get_single_mut() else {
        return;
    };

    for reward in rewards.read() {
        if status.is_over() {
            break;
        }

        let gained = progression.add_experience_capped(reward.experience, settings.win_level);
        for level in (progression.level - gained + 1)..=progression.level {
            outbox.push(EncounterEvent::LeveledUp { level });
            levels.send(LevelReached { level });
            log.log(LogEventType::Progression, format!("Reached level {}", level));
        }
        outbox.push(EncounterEvent::ExperienceChanged {
            experience: progression.experience,
            level: progression.level,
        });
        if gained == 0 {
            continue;
        }

        if progression.level >= settings.win_level {
            *status = EncounterStatus::Won;
            queue.pending = 0;
            scheduler.invalidate(TaskOwner::Director);
            outbox.push(EncounterEvent::EncounterWon {
                level: progression.level,
            });
            log.log(
                LogEventType::Encounter,
                format!("Encounter won at level {}", progression.level),
            );
            info!("Encounter won at level {}", progression.level);
            break;
        }
        queue.pending += gained;
    }

    if queue.pending > 0 && *status == EncounterStatus::Running {
        *status = EncounterStatus::AwaitingSelection;
        outbox.push(EncounterEvent::SkillSelectionRequested(book.selection_request()));
        log.log(LogEventType::Encounter, "Paused for skill selection".to_string());
    }
}

/// Resolve answers to selection requests and resume when none remain.
///
/// Rejected answers change nothing but still consume the pending selection.
pub fn apply_skill_selection(
    mut selections: EventReader<SkillSelection>,
    mut status: ResMut<EncounterStatus>,
    mut queue: ResMut<SelectionQueue>,
    mut book: ResMut<SkillBook>,
    mut outbox: ResMut<Outbox>,
    mut log: ResMut<EncounterLog>,
) {
    for selection in selections.read() {
        if *status != EncounterStatus::AwaitingSelection {
            debug!("Ignoring skill selection while {:?}", *status);
            continue;
        }

        match book.apply_selection(*selection) {
            Ok(SkillChange::Unlocked(skill)) => {
                outbox.push(EncounterEvent::SkillUnlocked { skill });
                log.log(LogEventType::Skill, format!("Unlocked {}", skill.name()));
            }
            Ok(SkillChange::Upgraded { skill, level }) => {
                outbox.push(EncounterEvent::SkillUpgraded { skill, level });
                log.log(
                    LogEventType::Skill,
                    format!("Upgraded {} to level {}", skill.name(), level),
                );
            }
            Err(e) => {
                warn!("Rejected skill selection {:?}: {}", selection.skill, e);
            }
        }

        queue.pending = queue.pending.saturating_sub(1);
        if queue.pending > 0 {
            outbox.push(EncounterEvent::SkillSelectionRequested(book.selection_request()));
        } else {
            *status = EncounterStatus::Running;
            log.log(LogEventType::Encounter, "Resumed after skill selection".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_formula() {
        assert_eq!(experience_threshold(1), 100);
        assert_eq!(experience_threshold(2), 200);
        assert_eq!(experience_threshold(3), 300);
        assert_eq!(experience_threshold(4), 400);
        assert_eq!(experience_threshold(5), 600);
    }

    #[test]
    fn test_rewards_below_threshold_accumulate() {
        let mut progression = Progression::default();
        for _ in 0..3 {
            assert_eq!(progression.add_experience(30), 0);
        }
        assert_eq!(progression.experience, 90);
        assert_eq!(progression.level, 1);

        assert_eq!(progression.add_experience(30), 1);
        assert_eq!(progression.level, 2);
        assert_eq!(progression.experience, 0);
    }

    #[test]
    fn test_large_reward_cascades_levels() {
        let mut progression = Progression::default();
        assert_eq!(progression.add_experience(250), 2);
        assert_eq!(progression.level, 3);
        assert_eq!(progression.experience, 0);
    }

    #[test]
    fn test_capped_reward_stops_at_max_level() {
        let mut progression = Progression {
            experience: 0,
            level: 2,
        };
        assert_eq!(progression.add_experience_capped(1000, 3), 1);
        assert_eq!(progression.level, 3);
        assert_eq!(progression.experience, 0);

        let mut below_cap = Progression::default();
        assert_eq!(below_cap.add_experience_capped(250, 10), 2);
        assert_eq!(below_cap.level, 3);
    }

    #[test]
    fn test_counter_stays_below_threshold() {
        let mut progression = Progression::default();
        for amount in [10, 95, 7, 300, 1, 620, 33, 1000] {
            progression.add_experience(amount);
            assert!(progression.experience < progression.threshold());
        }
    }
}
