// Command handlers module
pub mod collect;
pub mod completions;
pub mod config;
pub mod report;
pub mod version;

// Re-exports for cleaner imports
pub use collect::execute as collect;
pub use report::execute as report;
pub use version::execute as version;

use anyhow::{bail, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use crate::core::config::{Config, SourceKind};

/// Load the config file and apply whichever overrides the subcommand defines
pub(crate) fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(path) = arg::<String>(matches, "state-file") {
        config.state_path = PathBuf::from(path);
    }
    if let Some(interval) = arg::<f64>(matches, "interval") {
        config.interval_secs = *interval;
    }
    if let Some(days) = arg::<u32>(matches, "retention-days") {
        config.retention_days = *days;
    }
    if let Some(timeout) = arg::<u64>(matches, "timeout") {
        config.query_timeout_secs = *timeout;
    }
    if let Some(source) = arg::<String>(matches, "source") {
        match SourceKind::parse(source) {
            Some(kind) => config.source = kind,
            None => bail!("Unknown sample source '{}' (expected nvidia-smi or nvml)", source),
        }
    }

    Ok(config.normalized())
}

fn arg<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}
