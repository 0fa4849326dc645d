//! Durable storage for the usage summary.
//!
//! Reads never fail: a missing, unreadable, or malformed file yields a fresh
//! state. Writes go to a temporary file in the target directory which then
//! replaces the final path, so concurrent readers only ever see a complete
//! document.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::types::{
    display_name, now_ms, DeviceProfile, UsageBucket, UsageSummaryState, BUCKET_SPAN_MS, DAY_MS,
    USAGE_SUMMARY_VERSION,
};
use crate::error::{Result, UsageError};

/// Well-known location shared with the display front end
pub const DEFAULT_STATE_PATH: &str = "/var/lib/cockpit/gpus/usage-summary.json";

const TEMP_PREFIX: &str = ".usage-summary";
const TEMP_SUFFIX: &str = ".tmp";

/// File-backed store for [`UsageSummaryState`]
#[derive(Debug, Clone)]
pub struct UsageStore {
    path: PathBuf,
}

/// Borrowed view used for serialization so `updatedAt` can be stamped
/// without cloning the device map.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSummary<'a> {
    version: u32,
    updated_at: i64,
    collector_enabled: bool,
    devices: &'a HashMap<String, DeviceProfile>,
}

impl UsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state, falling back to a fresh one
    pub fn load(&self) -> UsageSummaryState {
        let now = now_ms();

        if !self.path.exists() {
            log::info!("No usage summary at {:?}, starting fresh", self.path);
            return UsageSummaryState::new(now);
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to read usage summary {:?}: {}", self.path, e);
                return UsageSummaryState::new(now);
            }
        };

        match parse_state(&raw, now) {
            Ok(state) => {
                log::debug!(
                    "Loaded usage summary with {} device(s), {} bucket(s)",
                    state.devices.len(),
                    state.bucket_count()
                );
                state
            }
            Err(e) => {
                log::warn!("Discarding unreadable usage summary {:?}: {}", self.path, e);
                UsageSummaryState::new(now)
            }
        }
    }

    /// Atomically replace the persisted state, stamping `updatedAt` with the
    /// current time.
    pub fn write(&self, state: &UsageSummaryState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let payload = PersistedSummary {
            version: state.version,
            updated_at: now_ms(),
            collector_enabled: state.collector_enabled,
            devices: &state.devices,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &payload)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| UsageError::Io(e.error))?;
        Ok(())
    }

    /// Write the state, reporting failure instead of propagating it.
    ///
    /// Returns whether the write succeeded. The caller keeps its in-memory
    /// state either way and retries on the next tick.
    pub fn persist(&self, state: &UsageSummaryState) -> bool {
        match self.write(state) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to write usage summary {:?}: {}", self.path, e);
                false
            }
        }
    }
}

/// Validate and normalize a persisted summary document.
///
/// The top level must be an object with a `devices` (or legacy `gpus`)
/// object. Individual profiles or buckets that do not fit the schema are
/// dropped rather than failing the whole document. `version` is rewritten to
/// the current schema tag and `collectorEnabled` is never trusted from disk.
pub fn parse_state(raw: &str, now: i64) -> Result<UsageSummaryState> {
    let payload: Value = serde_json::from_str(raw)?;

    let object = payload
        .as_object()
        .ok_or_else(|| UsageError::invalid_state("top level is not an object"))?;

    let devices = object
        .get("devices")
        .or_else(|| object.get("gpus"))
        .and_then(Value::as_object)
        .ok_or_else(|| UsageError::invalid_state("missing devices mapping"))?;

    let updated_at = object
        .get("updatedAt")
        .and_then(Value::as_i64)
        .filter(|ts| *ts > 0)
        .unwrap_or(now);

    // No migration exists between schema versions; buckets are read as-is.
    match object.get("version").and_then(Value::as_u64) {
        Some(v) if v != u64::from(USAGE_SUMMARY_VERSION) => log::warn!(
            "Usage summary has schema version {}, reading it as version {}",
            v,
            USAGE_SUMMARY_VERSION
        ),
        _ => {}
    }

    let mut state = UsageSummaryState::new(updated_at);
    for (id, value) in devices {
        match parse_profile(id, value) {
            Some(profile) => {
                state.devices.insert(id.clone(), profile);
            }
            None => log::debug!("Dropping malformed profile for device {}", id),
        }
    }

    state.version = USAGE_SUMMARY_VERSION;
    state.collector_enabled = true;
    Ok(state)
}

fn parse_profile(id: &str, value: &Value) -> Option<DeviceProfile> {
    let object = value.as_object()?;

    let text = |key: &str| match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let id = match text("id") {
        stored if !stored.is_empty() => stored,
        _ => id.to_string(),
    };
    let name = text("name");

    let buckets = object
        .get("buckets")
        .or_else(|| object.get("days"))
        .and_then(Value::as_object)
        .map(parse_buckets)
        .unwrap_or_default();

    Some(DeviceProfile {
        index: text("index"),
        name: display_name(&id, &name),
        last_sample_ts: object.get("lastSampleTs").and_then(Value::as_i64),
        updated_at: object.get("updatedAt").and_then(Value::as_i64),
        buckets,
        id,
    })
}

fn parse_buckets(raw: &Map<String, Value>) -> BTreeMap<i64, UsageBucket> {
    let mut buckets = BTreeMap::new();

    for (key, value) in raw {
        let Ok(start) = key.parse::<i64>() else {
            continue;
        };
        if start.rem_euclid(BUCKET_SPAN_MS) != 0 {
            continue;
        }
        let Ok(mut bucket) = serde_json::from_value::<UsageBucket>(value.clone()) else {
            continue;
        };
        let stored_span = value.get("spanMs").and_then(Value::as_i64).unwrap_or(0);
        bucket.span_ms = if stored_span > 0 {
            stored_span
        } else {
            legacy_span(&bucket)
        };
        buckets.insert(start, bucket);
    }

    buckets
}

/// Span for buckets written without one. Older summaries kept one bucket
/// per day, recognisable by holding most of a day of sample time.
fn legacy_span(bucket: &UsageBucket) -> i64 {
    if bucket.sample_ms as f64 >= DAY_MS as f64 * 0.75 {
        DAY_MS
    } else {
        BUCKET_SPAN_MS
    }
}
