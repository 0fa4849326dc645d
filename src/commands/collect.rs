//! Collector command handler.
//!
//! Samples GPU usage on a fixed interval and keeps the usage summary on disk
//! current until interrupted, or for a single tick with `--once`.

use anyhow::{Context, Result};
use clap::ArgMatches;
use tokio::sync::watch;

use crate::core::{CollectorSettings, UsageCollector};
use crate::core::usage::UsageStore;
use crate::platform::get_sample_source;

/// Execute the collect command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let once = matches.get_flag("once");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if !once {
        ctrlc::set_handler(move || {
            log::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;
    }

    runtime.block_on(async {
        let source = get_sample_source(&config);
        let store = UsageStore::new(config.state_path.clone());
        let settings = CollectorSettings::from_config(&config, once);

        let mut collector = UsageCollector::new(source, store, settings);
        collector.run(shutdown_rx).await;
    });

    Ok(())
}
