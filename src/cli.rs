//! Command-line interface for HordeSim
//!
//! Every run is headless; flags override the JSON configuration.

use clap::Parser;
use std::path::PathBuf;

use crate::headless::HeadlessEncounterConfig;

/// Survival horde encounter simulator
#[derive(Parser, Debug)]
#[command(name = "hordesim")]
#[command(about = "Survival horde encounter simulator")]
#[command(version)]
pub struct Args {
    /// JSON config file describing the encounter (defaults are used if omitted)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Output path for the encounter log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum encounter duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Command-line flags take precedence over the config file.
    pub fn apply_to(&self, config: &mut HeadlessEncounterConfig) {
        if let Some(output) = &self.output {
            config.output_path = Some(output.to_string_lossy().to_string());
        }
        if let Some(max_duration) = self.max_duration {
            config.max_duration_secs = max_duration;
        }
        if let Some(seed) = self.seed {
            config.random_seed = Some(seed);
        }
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "hordesim",
            "--output",
            "runs/a.json",
            "--max-duration",
            "60",
            "--seed",
            "7",
        ]);
        let mut config = HeadlessEncounterConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.output_path.as_deref(), Some("runs/a.json"));
        assert_eq!(config.max_duration_secs, 60.0);
        assert_eq!(config.random_seed, Some(7));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let args = Args::parse_from(["hordesim"]);
        let mut config = HeadlessEncounterConfig {
            random_seed: Some(3),
            max_duration_secs: 90.0,
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.random_seed, Some(3));
        assert_eq!(config.max_duration_secs, 90.0);
        assert!(config.output_path.is_none());
    }
}
