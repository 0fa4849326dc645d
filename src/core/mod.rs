// Core business logic module

pub mod collector;
pub mod config;
pub mod usage;

// Re-export commonly used items
pub use collector::{CollectorSettings, TickOutcome, UsageCollector};
pub use config::Config;
