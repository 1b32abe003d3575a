//! HordeSim - survival horde encounter simulator
//!
//! Runs one encounter headlessly and prints a summary.

use hordesim::cli;
use hordesim::headless::{run_headless_encounter, HeadlessEncounterConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match &args.config {
        Some(path) => match HeadlessEncounterConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => HeadlessEncounterConfig::default(),
    };
    args.apply_to(&mut config);

    match run_headless_encounter(config) {
        Ok(result) => {
            println!("Outcome: {}", result.outcome.name());
            println!("Level: {} ({} xp)", result.level, result.experience);
            println!(
                "Kills: {} ({} elite), coins: {}",
                result.kills, result.elite_kills, result.coins
            );
            println!(
                "Health: {:.0}/{:.0} after {:.1}s",
                result.final_health, result.max_health, result.duration_secs
            );
            for (skill, level) in &result.skills {
                println!("  {} level {}", skill.name(), level);
            }
        }
        Err(e) => {
            eprintln!("Error running encounter: {}", e);
            std::process::exit(1);
        }
    }
}
