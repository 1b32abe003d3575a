//! Encounter clock and deferred work scheduler
//!
//! The clock counts encounter milliseconds and only advances while the
//! encounter is running, so every timestamp (cooldowns, grace windows,
//! lifetimes) pauses with the simulation.
//!
//! The scheduler is a single priority queue of timed work items. It is drained
//! once per tick; each due item is republished as a `DeferredWorkDue` event and
//! handled by the system that owns that kind of work.

use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::combat::log::EncounterLog;
use super::projectiles::ProjectileLaunch;
use super::skills::SkillKind;

/// Millisecond encounter time.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncounterClock {
    now_ms: u64,
    delta_ms: u64,
    /// Sub-millisecond remainder carried between ticks
    carry_us: u64,
}

impl EncounterClock {
    /// A clock stopped at `now_ms`.
    pub fn at(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Default::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Milliseconds covered by the current tick.
    pub fn delta_ms(&self) -> u64 {
        self.delta_ms
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta_ms as f32 / 1000.0
    }

    pub fn advance(&mut self, delta: Duration) {
        let total_us = self.carry_us + delta.as_micros() as u64;
        self.delta_ms = total_us / 1000;
        self.carry_us = total_us % 1000;
        self.now_ms += self.delta_ms;
    }
}

/// Who a scheduled item belongs to. Removing the owner invalidates its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOwner {
    Combatant(Entity),
    Skill(SkillKind),
    Director,
}

/// The work to perform when an item comes due.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredWork {
    EndGraceWindow,
    EndSpawnIntro,
    FinishDeath,
    /// A later shot of a multi-shot activation
    BurstShot(ProjectileLaunch),
    SpawnCycle,
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub due_ms: u64,
    seq: u64,
    pub owner: TaskOwner,
    pub work: DeferredWork,
}

// Min-heap on (due_ms, seq): earliest first, insertion order among equals.
impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for ScheduledTask {}

/// Priority queue of deferred work.
#[derive(Resource, Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn schedule(&mut self, owner: TaskOwner, due_ms: u64, work: DeferredWork) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTask {
            due_ms,
            seq,
            owner,
            work,
        });
    }

    /// Drop every pending item owned by `owner`. Returns how many were dropped.
    pub fn invalidate(&mut self, owner: TaskOwner) -> usize {
        let before = self.queue.len();
        self.queue.retain(|task| task.owner != owner);
        before - self.queue.len()
    }

    /// Pop every item due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: u64) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        while let Some(top) = self.queue.peek() {
            if top.due_ms > now {
                break;
            }
            if let Some(task) = self.queue.pop() {
                due.push(task);
            }
        }
        due
    }

    pub fn pending_for(&self, owner: TaskOwner) -> usize {
        self.queue.iter().filter(|t| t.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// A scheduled item that came due this tick.
#[derive(Event, Debug, Clone)]
pub struct DeferredWorkDue {
    pub owner: TaskOwner,
    pub work: DeferredWork,
}

/// Advance encounter time by the frame delta and stamp the log.
pub fn advance_clock(time: Res<Time>, mut clock: ResMut<EncounterClock>, mut log: ResMut<EncounterLog>) {
    clock.advance(time.delta());
    log.time_ms = clock.now();
}

/// Publish every item that is now due.
pub fn run_deferred_work(
    clock: Res<EncounterClock>,
    mut scheduler: ResMut<Scheduler>,
    mut due: EventWriter<DeferredWorkDue>,
) {
    for task in scheduler.drain_due(clock.now()) {
        due.send(DeferredWorkDue {
            owner: task.owner,
            work: task.work,
        });
    }
}
