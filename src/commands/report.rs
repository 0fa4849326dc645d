use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::usage::{build_report, now_ms, UsageStore};
use crate::ui::print_report;

/// Print the usage report for the stored summary
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let state = UsageStore::new(config.state_path.clone()).load();
    let report = build_report(&state, now_ms());

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}
