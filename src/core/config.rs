use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::usage::{DEFAULT_RETENTION_DAYS, DEFAULT_STATE_PATH};

pub const DEFAULT_INTERVAL_SECS: f64 = 2.0;
/// Floor for the sampling interval; anything lower is raised to this
pub const MIN_INTERVAL_SECS: f64 = 0.5;
/// Ceiling for the sampling interval (one day)
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

/// Environment variable overriding the state file location
pub const STATE_PATH_ENV: &str = "GPU_USAGE_STATE";

/// Which backend produces GPU samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    NvidiaSmi,
    Nvml,
}

impl SourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "nvidia-smi" | "smi" => Some(SourceKind::NvidiaSmi),
            "nvml" => Some(SourceKind::Nvml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::NvidiaSmi => "nvidia-smi",
            SourceKind::Nvml => "nvml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nominal sampling interval in seconds
    pub interval_secs: f64,
    /// Maximum age of a bucket, in days
    pub retention_days: u32,
    /// Location of the persisted usage summary
    pub state_path: PathBuf,
    /// Upper bound on a single hardware query
    pub query_timeout_secs: u64,
    pub source: SourceKind,
    /// Explicit nvidia-smi binary; looked up on PATH when unset
    pub nvidia_smi_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            retention_days: DEFAULT_RETENTION_DAYS,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            source: SourceKind::default(),
            nvidia_smi_path: None,
        }
    }
}

impl Config {
    /// Load the config file, applying environment overrides.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        let mut config = if !config_path.exists() {
            Config::default()
        } else {
            let data = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            if data.trim().is_empty() {
                Config::default()
            } else {
                serde_json::from_str(&data).unwrap_or_else(|e| {
                    log::warn!("Ignoring invalid config file {:?}: {}", config_path, e);
                    Config::default()
                })
            }
        };

        config.apply_env();
        Ok(config.normalized())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("gpu-usage").join("config.json"))
    }

    fn apply_env(&mut self) {
        if let Some(path) = std::env::var_os(STATE_PATH_ENV).filter(|p| !p.is_empty()) {
            self.state_path = PathBuf::from(path);
        }
    }

    /// Clamp values to their allowed ranges
    pub fn normalized(mut self) -> Self {
        if !self.interval_secs.is_finite() || self.interval_secs < MIN_INTERVAL_SECS {
            self.interval_secs = MIN_INTERVAL_SECS;
        }
        self.interval_secs = self.interval_secs.min(MAX_INTERVAL_SECS);
        self.retention_days = self.retention_days.max(1);
        self.query_timeout_secs = self.query_timeout_secs.max(1);
        self
    }

    /// Nominal interval in milliseconds, never below 1
    pub fn interval_ms(&self) -> i64 {
        ((self.interval_secs * 1000.0).round() as i64).max(1)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms() as u64)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
