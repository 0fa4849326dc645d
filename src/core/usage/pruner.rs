//! Retention window enforcement.

use super::types::{UsageSummaryState, DAY_MS};

/// Start of the UTC day containing `time_ms`
pub fn day_key(time_ms: i64) -> i64 {
    time_ms.div_euclid(DAY_MS) * DAY_MS
}

/// Oldest bucket key kept for a retention window of `retention_days`
pub fn retention_cutoff(now: i64, retention_days: u32) -> i64 {
    day_key(now - i64::from(retention_days) * DAY_MS)
}

/// Drop every bucket older than the retention cutoff.
///
/// Devices left without buckets are kept so their identity survives gaps.
/// Returns the number of buckets removed.
pub fn prune(state: &mut UsageSummaryState, now: i64, retention_days: u32) -> usize {
    let cutoff = retention_cutoff(now, retention_days);
    let mut removed = 0;

    for profile in state.devices.values_mut() {
        let before = profile.buckets.len();
        profile.buckets = profile.buckets.split_off(&cutoff);
        removed += before - profile.buckets.len();
    }

    if removed > 0 {
        log::debug!("Pruned {} bucket(s) older than {}", removed, cutoff);
    }

    removed
}
