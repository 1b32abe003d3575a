//! Headless mode for unattended encounters
//!
//! Runs a full encounter without any graphical output, answering skill
//! selections with a fixed policy. Suitable for balance sweeps, regression
//! checks and automated agents.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless encounter
//! cargo run --release -- --config encounter.json --output run.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "random_seed": 42,
//!   "max_duration_secs": 180,
//!   "items": { "sword": 2, "shield": 1, "boots": 0 },
//!   "selection_policy": "Random"
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessEncounterConfig, ItemLevels, SelectionPolicy};
pub use runner::{run_headless_encounter, simulate_encounter, EncounterOutcome, EncounterResult};
