use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Schema tag written into every persisted summary
pub const USAGE_SUMMARY_VERSION: u32 = 3;

/// Span of a single usage bucket (1 hour)
pub const BUCKET_SPAN_MS: i64 = 60 * 60 * 1000;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Default maximum age of a bucket, in days
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Current wall clock time as epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Running statistics for one device over one bucket span.
///
/// `sum`/`count` give the plain average of GPU utilization, while
/// `active_sum`/`active_ms` integrate utilization over attributed time.
/// `sample_ms` is the total time attributed to the bucket regardless of
/// which metrics were present, so `active_ms <= sample_ms` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageBucket {
    pub span_ms: i64,
    pub sum: f64,
    pub count: u64,
    pub active_sum: f64,
    pub active_ms: i64,
    pub sample_ms: i64,
    pub utilization_memory_sum: f64,
    pub utilization_memory_count: u64,
    pub temperature_sum: f64,
    pub temperature_count: u64,
}

impl Default for UsageBucket {
    fn default() -> Self {
        Self {
            span_ms: BUCKET_SPAN_MS,
            sum: 0.0,
            count: 0,
            active_sum: 0.0,
            active_ms: 0,
            sample_ms: 0,
            utilization_memory_sum: 0.0,
            utilization_memory_count: 0,
            temperature_sum: 0.0,
            temperature_count: 0,
        }
    }
}

/// Historical record for one GPU, keyed by its stable identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub id: String,
    pub index: String,
    pub name: String,
    pub last_sample_ts: Option<i64>,
    pub updated_at: Option<i64>,
    /// Buckets keyed by their aligned start time. Keys serialize as strings.
    pub buckets: BTreeMap<i64, UsageBucket>,
}

impl DeviceProfile {
    pub fn new(id: &str, index: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            index: index.to_string(),
            name: display_name(id, name),
            ..Default::default()
        }
    }
}

/// Name shown for a device, falling back to its identifier
pub(crate) fn display_name(id: &str, name: &str) -> String {
    if name.trim().is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

/// Complete persisted usage summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummaryState {
    pub version: u32,
    pub updated_at: i64,
    pub collector_enabled: bool,
    pub devices: HashMap<String, DeviceProfile>,
}

impl UsageSummaryState {
    /// Fresh state with no devices, stamped at `now`
    pub fn new(now: i64) -> Self {
        Self {
            version: USAGE_SUMMARY_VERSION,
            updated_at: now,
            collector_enabled: true,
            devices: HashMap::new(),
        }
    }

    /// Total number of buckets across all devices
    pub fn bucket_count(&self) -> usize {
        self.devices.values().map(|d| d.buckets.len()).sum()
    }
}

/// One normalized reading for a single GPU.
///
/// Every metric may be absent; coercion of raw tool output into this shape
/// belongs to the sample source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuSample {
    pub id: String,
    pub index: String,
    pub name: String,
    pub utilization_gpu: Option<f64>,
    pub utilization_memory: Option<f64>,
    pub temperature: Option<f64>,
}

impl GpuSample {
    /// True when the sample carries none of the tracked metrics
    pub fn is_empty(&self) -> bool {
        self.utilization_gpu.is_none()
            && self.utilization_memory.is_none()
            && self.temperature.is_none()
    }
}
