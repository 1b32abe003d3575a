//! HordeSim - survival horde encounter simulation core
//!
//! A single player fights escalating waves of enemies with auto-targeting
//! skills, gaining levels and choosing skill upgrades along the way.
//!
//! This library exposes the simulation core for embedding and testing.

pub mod cli;
pub mod combat;
pub mod encounter;
pub mod headless;
pub mod settings;

// Re-export commonly used types
pub use combat::events::{EncounterEvent, Outbox, SkillSelection};
pub use combat::log::{EncounterLog, LogEventType};
pub use encounter::{EncounterPhase, EncounterPlugin};
pub use headless::HeadlessEncounterConfig;
pub use settings::{BaselineStats, EncounterSettings};
