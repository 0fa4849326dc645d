//! GPU usage aggregation and persistence.
//!
//! Samples are folded into hourly buckets per device, old buckets are pruned
//! to the retention window, and the result is persisted as a JSON document
//! that a display front end can read at any time.

mod aggregator;
mod pruner;
pub mod report;
mod source;
mod store;
mod types;

pub use aggregator::{aggregate, bucket_key, elapsed_ms, GAP_CLAMP_FACTOR};
pub use pruner::{day_key, prune, retention_cutoff};
pub use report::{build_report, sum_buckets, UsageReport, UsageStats, UsageTotals, UsageWindow};
pub use source::SampleSource;
pub use store::{parse_state, UsageStore, DEFAULT_STATE_PATH};
pub use types::{
    now_ms, DeviceProfile, GpuSample, UsageBucket, UsageSummaryState, BUCKET_SPAN_MS, DAY_MS,
    DEFAULT_RETENTION_DAYS, USAGE_SUMMARY_VERSION,
};
