//! Periodic collection loop.
//!
//! Each tick runs strictly in sequence: sample, aggregate, prune, persist.
//! Nothing in a tick is fatal; a failed query counts as zero samples and a
//! failed write is retried on the next tick.

use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::core::config::Config;
use crate::core::usage::{aggregate, now_ms, prune, SampleSource, UsageStore, UsageSummaryState};

/// Settings the loop needs on every tick
#[derive(Debug, Clone, Copy)]
pub struct CollectorSettings {
    pub interval_ms: i64,
    pub retention_days: u32,
    pub once: bool,
}

impl CollectorSettings {
    pub fn from_config(config: &Config, once: bool) -> Self {
        Self {
            interval_ms: config.interval_ms(),
            retention_days: config.retention_days,
            once,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1) as u64)
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub samples: usize,
    pub pruned: usize,
    pub persisted: bool,
}

/// Drives a [`SampleSource`] and keeps the usage summary up to date
pub struct UsageCollector<S: SampleSource> {
    source: S,
    store: UsageStore,
    settings: CollectorSettings,
    state: UsageSummaryState,
}

impl<S: SampleSource> UsageCollector<S> {
    /// Create a collector, loading whatever state the store holds
    pub fn new(source: S, store: UsageStore, settings: CollectorSettings) -> Self {
        let mut state = store.load();
        state.version = crate::core::usage::USAGE_SUMMARY_VERSION;
        state.collector_enabled = true;

        Self {
            source,
            store,
            settings,
            state,
        }
    }

    pub fn state(&self) -> &UsageSummaryState {
        &self.state
    }

    /// Run a single tick using the wall clock
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(now_ms()).await
    }

    /// Run a single tick as if the current time were `now`
    pub async fn tick_at(&mut self, now: i64) -> TickOutcome {
        let samples = match self.source.collect_samples().await {
            Ok(samples) => samples,
            Err(e) => {
                log::warn!("{} query failed: {}", self.source.name(), e);
                Vec::new()
            }
        };

        if !samples.is_empty() {
            let previous = std::mem::replace(&mut self.state, UsageSummaryState::new(now));
            self.state = aggregate(previous, &samples, now, self.settings.interval_ms);
        }
        self.state.updated_at = now;

        let pruned = prune(&mut self.state, now, self.settings.retention_days);
        let persisted = self.store.persist(&self.state);

        log::debug!(
            "Tick: {} sample(s), {} device(s), {} pruned, persisted={}",
            samples.len(),
            self.state.devices.len(),
            pruned,
            persisted
        );

        TickOutcome {
            samples: samples.len(),
            pruned,
            persisted,
        }
    }

    /// Tick until the shutdown channel fires, or once in one-shot mode.
    ///
    /// The sleep between ticks is the interval minus the time the tick took,
    /// so slow ticks run back to back instead of accumulating delay.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Collecting GPU usage every {} ms into {:?}",
            self.settings.interval_ms,
            self.store.path()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            self.tick().await;

            if self.settings.once {
                break;
            }

            let pause = self.settings.interval().saturating_sub(started.elapsed());
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Usage collector stopped");
    }
}
