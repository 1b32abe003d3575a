//! Headless encounter execution
//!
//! Runs an encounter without any graphical output. The runner stands in for
//! every external collaborator: it keeps the viewport on the player, answers
//! skill selection requests with a fixed policy, drains the outbox and writes
//! the encounter log when the encounter ends.
//!
//! Time is stepped manually at a fixed 60 Hz, so an encounter runs as fast as
//! the machine allows and seeded runs are reproducible.

use bevy::app::PluginsState;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::path::Path;
use std::time::Duration;

use crate::combat::events::{EncounterEvent, Outbox, SelectionRequest, SkillSelection};
use crate::combat::log::{EncounterLog, EncounterMetadata};
use crate::encounter::enemy_config::{load_enemy_definitions, load_enemy_definitions_from};
use crate::encounter::skill_config::{load_skill_definitions, load_skill_definitions_from};
use crate::encounter::skills::SkillKind;
// Use the stable systems API instead of importing internal functions directly
use crate::encounter::systems::{
    Combatant, EncounterClock, EncounterPhase, EncounterPlugin, EncounterStats, EnemyDefinitions,
    GameRng, Player, Progression, SkillBook, SkillDefinitions, Viewport,
};
use crate::settings::EncounterSettings;

use super::config::{HeadlessEncounterConfig, SelectionPolicy};

const FRAME_STEP: Duration = Duration::from_nanos(16_666_667);

/// How the encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    Won,
    Lost,
    /// Hit `max_duration_secs` with the player still alive
    TimedOut,
}

impl EncounterOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            EncounterOutcome::Won => "Won",
            EncounterOutcome::Lost => "Lost",
            EncounterOutcome::TimedOut => "TimedOut",
        }
    }
}

/// Result of a completed headless encounter
#[derive(Debug, Clone)]
pub struct EncounterResult {
    pub outcome: EncounterOutcome,
    pub level: u32,
    pub experience: u32,
    pub coins: u32,
    pub kills: u32,
    pub elite_kills: u32,
    /// Encounter time in seconds (selection pauses excluded)
    pub duration_secs: f32,
    pub final_health: f32,
    pub max_health: f32,
    pub random_seed: Option<u64>,
    /// Unlocked skills and their levels, in unlock order
    pub skills: Vec<(SkillKind, u32)>,
    /// Skill selections answered by the runner
    pub selections_made: u32,
}

/// Resource to track headless encounter state
#[derive(Resource)]
pub struct HeadlessEncounterState {
    pub max_duration: f32,
    pub output_path: Option<String>,
    pub policy: SelectionPolicy,
    pub random_seed: Option<u64>,
    /// Set when the outbox reports a terminal event
    pub outcome: Option<EncounterOutcome>,
    pub selections_made: u32,
    pub complete: bool,
    pub result: Option<EncounterResult>,
}

/// Plugin for headless encounter execution
pub struct HeadlessPlugin {
    pub config: HeadlessEncounterConfig,
    pub skills: SkillDefinitions,
    pub enemies: EnemyDefinitions,
    pub settings: EncounterSettings,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let policy = self.config.policy().unwrap_or(SelectionPolicy::FirstAvailable);
        let rng = match self.config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };

        app.insert_resource(self.settings.clone())
            .insert_resource(self.config.baseline())
            .insert_resource(rng)
            .insert_resource(HeadlessEncounterState {
                max_duration: self.config.max_duration_secs,
                output_path: self.config.output_path.clone(),
                policy,
                random_seed: self.config.random_seed,
                outcome: None,
                selections_made: 0,
                complete: false,
                result: None,
            })
            .add_plugins(EncounterPlugin::new(self.skills.clone(), self.enemies.clone()))
            .add_systems(
                Update,
                headless_follow_viewport
                    .after(EncounterPhase::Behavior)
                    .before(EncounterPhase::Abilities),
            )
            .add_systems(
                Update,
                (headless_answer_outbox, headless_check_encounter_end)
                    .chain()
                    .after(EncounterPhase::Reporting),
            );
    }
}

/// Keep the viewport centered on the player, as a following camera would.
fn headless_follow_viewport(
    settings: Res<EncounterSettings>,
    mut viewport: ResMut<Viewport>,
    players: Query<&Transform, With<Player>>,
) {
    if let Ok(transform) = players.get_single() {
        viewport.0 = settings.viewport_at(transform.translation.truncate());
    }
}

/// Choose an answer to a selection request.
pub fn choose_selection(
    request: &SelectionRequest,
    policy: SelectionPolicy,
    rng: &mut GameRng,
) -> Option<SkillSelection> {
    let actionable: Vec<_> = request.offers.iter().filter(|o| o.is_actionable()).collect();
    if actionable.is_empty() {
        return None;
    }
    let offer = match policy {
        SelectionPolicy::FirstAvailable => actionable
            .iter()
            .find(|o| o.can_unlock)
            .or_else(|| actionable.first())
            .copied(),
        SelectionPolicy::Random => actionable.get(rng.random_index(actionable.len())).copied(),
    };
    offer.map(|o| o.selection())
}

/// Drain the outbox, answering selection requests and noting terminal events.
fn headless_answer_outbox(
    mut outbox: ResMut<Outbox>,
    mut state: ResMut<HeadlessEncounterState>,
    mut rng: ResMut<GameRng>,
    mut selections: EventWriter<SkillSelection>,
) {
    for event in outbox.drain() {
        match event {
            EncounterEvent::SkillSelectionRequested(request) => {
                // With nothing left to choose, an empty answer still resumes the encounter.
                let selection = choose_selection(&request, state.policy, &mut rng).unwrap_or(
                    SkillSelection {
                        skill: SkillKind::Comet,
                        can_unlock: false,
                        can_upgrade: false,
                    },
                );
                debug!("Answering skill selection with {:?}", selection);
                selections.send(selection);
                state.selections_made += 1;
            }
            EncounterEvent::PlayerDied => state.outcome = Some(EncounterOutcome::Lost),
            EncounterEvent::EncounterWon { .. } => state.outcome = Some(EncounterOutcome::Won),
            EncounterEvent::LeveledUp { level } => info!("Reached level {}", level),
            _ => {}
        }
    }
}

/// Finish the encounter on a terminal event or timeout, and save the log.
fn headless_check_encounter_end(
    clock: Res<EncounterClock>,
    stats: Res<EncounterStats>,
    book: Res<SkillBook>,
    log: Res<EncounterLog>,
    mut state: ResMut<HeadlessEncounterState>,
    players: Query<(&Combatant, &Progression), With<Player>>,
) {
    if state.complete {
        return;
    }
    let duration_secs = clock.now() as f32 / 1000.0;
    if state.outcome.is_none() && duration_secs >= state.max_duration {
        info!("Encounter timed out after {:.1}s", duration_secs);
        state.outcome = Some(EncounterOutcome::TimedOut);
    }
    let Some(outcome) = state.outcome else {
        return;
    };

    let (final_health, max_health, level, experience) = players
        .get_single()
        .map(|(c, p)| (c.current_health, c.max_health, p.level, p.experience))
        .unwrap_or((0.0, 0.0, 1, 0));
    let skills: Vec<(SkillKind, u32)> = book
        .unlocked()
        .iter()
        .filter_map(|kind| book.get(*kind).map(|s| (*kind, s.level)))
        .collect();

    let result = EncounterResult {
        outcome,
        level,
        experience,
        coins: stats.coins,
        kills: stats.kills,
        elite_kills: stats.elite_kills,
        duration_secs,
        final_health,
        max_health,
        random_seed: state.random_seed,
        skills,
        selections_made: state.selections_made,
    };

    if let Some(path) = state.output_path.clone() {
        save_headless_encounter_log(&log, &result, &path);
    }
    state.result = Some(result);
    state.complete = true;
}

fn save_headless_encounter_log(log: &EncounterLog, result: &EncounterResult, path: &str) {
    let metadata = EncounterMetadata {
        outcome: result.outcome.name().to_string(),
        level: result.level,
        experience: result.experience,
        coins: result.coins,
        kills: result.kills,
        elite_kills: result.elite_kills,
        duration_secs: result.duration_secs,
        final_health: result.final_health,
        max_health: result.max_health,
        random_seed: result.random_seed,
        skills: result
            .skills
            .iter()
            .map(|(kind, level)| (kind.name().to_string(), *level))
            .collect(),
    };
    match log.save_to_file(&metadata, Some(path)) {
        Ok(filename) => println!("Encounter complete. Log saved to: {}", filename),
        Err(e) => eprintln!("Failed to save encounter log: {}", e),
    }
}

/// Build an app running one headless encounter. Nothing is stepped yet.
pub fn build_headless_app(
    config: HeadlessEncounterConfig,
    skills: SkillDefinitions,
    enemies: EnemyDefinitions,
    settings: EncounterSettings,
) -> Result<App, String> {
    config.validate()?;
    settings.validate()?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME_STEP))
        .add_plugins(HeadlessPlugin {
            config,
            skills,
            enemies,
            settings,
        });
    Ok(app)
}

/// Step `app` until the encounter completes and return its result.
pub fn drive_to_completion(mut app: App) -> Result<EncounterResult, String> {
    if app.plugins_state() == PluginsState::Ready {
        app.finish();
        app.cleanup();
    }

    let max_duration = app
        .world()
        .get_resource::<HeadlessEncounterState>()
        .map(|s| s.max_duration)
        .ok_or_else(|| "HeadlessPlugin is not installed".to_string())?;
    // Selection pauses take frames without advancing encounter time.
    let frame_budget = (max_duration as f64 * 60.0 * 2.0) as u64 + 600;

    for _ in 0..frame_budget {
        app.update();
        let state = app.world().resource::<HeadlessEncounterState>();
        if state.complete {
            return state
                .result
                .clone()
                .ok_or_else(|| "Encounter completed without a result".to_string());
        }
    }
    Err(format!("Encounter did not finish within {} frames", frame_budget))
}

/// Run a complete encounter with already-loaded definitions
pub fn simulate_encounter(
    config: HeadlessEncounterConfig,
    skills: SkillDefinitions,
    enemies: EnemyDefinitions,
    settings: EncounterSettings,
) -> Result<EncounterResult, String> {
    drive_to_completion(build_headless_app(config, skills, enemies, settings)?)
}

/// Run a headless encounter with the given configuration
pub fn run_headless_encounter(config: HeadlessEncounterConfig) -> Result<EncounterResult, String> {
    config.validate()?;

    let skills = match &config.skills_path {
        Some(path) => load_skill_definitions_from(Path::new(path))?,
        None => load_skill_definitions()?,
    };
    let enemies = match &config.enemies_path {
        Some(path) => load_enemy_definitions_from(Path::new(path))?,
        None => load_enemy_definitions()?,
    };
    let settings = match &config.settings_path {
        Some(path) => EncounterSettings::load_from(Path::new(path)),
        None => EncounterSettings::load(),
    };

    println!("Starting headless encounter simulation...");
    println!("  Items: {:?}", config.items);
    println!("  Selection policy: {}", config.selection_policy);
    println!("  Max duration: {:.0}s", config.max_duration_secs);
    if let Some(seed) = config.random_seed {
        println!("  Seed: {}", seed);
    }

    let mut app = build_headless_app(config, skills, enemies, settings)?;
    app.add_plugins(LogPlugin::default());

    let result = drive_to_completion(app)?;
    let mut log_summary = format!(
        "{} at level {} after {:.1}s: {} kills, {} coins",
        result.outcome.name(),
        result.level,
        result.duration_secs,
        result.kills,
        result.coins
    );
    if result.outcome == EncounterOutcome::Lost {
        log_summary.push_str(" (player fell)");
    }
    info!("{}", log_summary);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::events::SkillOffer;

    fn offer(skill: SkillKind, can_unlock: bool, can_upgrade: bool) -> SkillOffer {
        SkillOffer {
            skill,
            level: if can_unlock { 0 } else { 1 },
            max_level: 5,
            can_unlock,
            can_upgrade,
        }
    }

    fn request(offers: Vec<SkillOffer>) -> SelectionRequest {
        SelectionRequest {
            pool: Vec::new(),
            unlocked: Vec::new(),
            offers,
        }
    }

    #[test]
    fn test_first_available_prefers_unlocks() {
        let req = request(vec![
            offer(SkillKind::Comet, false, true),
            offer(SkillKind::Aura, true, false),
            offer(SkillKind::Venom, true, false),
        ]);
        let mut rng = GameRng::from_seed(1);
        let selection = choose_selection(&req, SelectionPolicy::FirstAvailable, &mut rng).unwrap();
        assert_eq!(selection.skill, SkillKind::Aura);
        assert!(selection.can_unlock);
    }

    #[test]
    fn test_first_available_falls_back_to_upgrade() {
        let req = request(vec![
            offer(SkillKind::Comet, false, false),
            offer(SkillKind::Aura, false, true),
        ]);
        let mut rng = GameRng::from_seed(1);
        let selection = choose_selection(&req, SelectionPolicy::FirstAvailable, &mut rng).unwrap();
        assert_eq!(selection.skill, SkillKind::Aura);
        assert!(selection.can_upgrade);
    }

    #[test]
    fn test_random_only_picks_actionable_offers() {
        let req = request(vec![
            offer(SkillKind::Comet, false, false),
            offer(SkillKind::Lightning, true, false),
        ]);
        let mut rng = GameRng::from_seed(99);
        for _ in 0..20 {
            let selection = choose_selection(&req, SelectionPolicy::Random, &mut rng).unwrap();
            assert_eq!(selection.skill, SkillKind::Lightning);
        }
    }

    #[test]
    fn test_nothing_actionable_yields_none() {
        let req = request(vec![offer(SkillKind::Comet, false, false)]);
        let mut rng = GameRng::from_seed(1);
        assert!(choose_selection(&req, SelectionPolicy::FirstAvailable, &mut rng).is_none());
    }
}
