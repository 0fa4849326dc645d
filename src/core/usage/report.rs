//! Derived statistics over stored buckets.
//!
//! Nothing here is persisted; reports are recomputed from the summary each
//! time they are requested.

use serde::Serialize;
use std::collections::BTreeMap;

use super::pruner::day_key;
use super::types::{UsageBucket, UsageSummaryState, DAY_MS};

/// Number of days in the daily utilization series
pub const DAILY_SERIES_DAYS: usize = 7;

/// Reporting window ending at the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageWindow {
    Day,
    Week,
    Month,
}

impl UsageWindow {
    pub const ALL: [UsageWindow; 3] = [UsageWindow::Day, UsageWindow::Week, UsageWindow::Month];

    pub fn duration_ms(&self) -> i64 {
        match self {
            UsageWindow::Day => DAY_MS,
            UsageWindow::Week => 7 * DAY_MS,
            UsageWindow::Month => 30 * DAY_MS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageWindow::Day => "24h",
            UsageWindow::Week => "7d",
            UsageWindow::Month => "30d",
        }
    }
}

/// Accumulators summed over a time range, scaled by bucket overlap
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub sum: f64,
    pub count: f64,
    pub active_sum: f64,
    pub active_ms: f64,
    pub sample_ms: f64,
    pub utilization_memory_sum: f64,
    pub utilization_memory_count: f64,
    pub temperature_sum: f64,
    pub temperature_count: f64,
}

impl UsageTotals {
    fn add_scaled(&mut self, bucket: &UsageBucket, fraction: f64) {
        self.sum += bucket.sum * fraction;
        self.count += bucket.count as f64 * fraction;
        self.active_sum += bucket.active_sum * fraction;
        self.active_ms += bucket.active_ms as f64 * fraction;
        self.sample_ms += bucket.sample_ms as f64 * fraction;
        self.utilization_memory_sum += bucket.utilization_memory_sum * fraction;
        self.utilization_memory_count += bucket.utilization_memory_count as f64 * fraction;
        self.temperature_sum += bucket.temperature_sum * fraction;
        self.temperature_count += bucket.temperature_count as f64 * fraction;
    }

    pub fn add(&mut self, other: &UsageTotals) {
        self.sum += other.sum;
        self.count += other.count;
        self.active_sum += other.active_sum;
        self.active_ms += other.active_ms;
        self.sample_ms += other.sample_ms;
        self.utilization_memory_sum += other.utilization_memory_sum;
        self.utilization_memory_count += other.utilization_memory_count;
        self.temperature_sum += other.temperature_sum;
        self.temperature_count += other.temperature_count;
    }

    pub fn stats(&self) -> UsageStats {
        UsageStats {
            average: ratio(self.sum, self.count),
            in_use_percent: ratio(self.active_sum, self.active_ms),
            in_use_ms: (self.active_ms > 0.0).then_some(self.active_ms),
            active_fraction: ratio(self.active_ms, self.sample_ms),
            memory_average: ratio(self.utilization_memory_sum, self.utilization_memory_count),
            temperature_average: ratio(self.temperature_sum, self.temperature_count),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

/// Averages derived from [`UsageTotals`]; absent when there is no data
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Plain mean of GPU utilization samples
    pub average: Option<f64>,
    /// Time-weighted GPU utilization
    pub in_use_percent: Option<f64>,
    pub in_use_ms: Option<f64>,
    pub active_fraction: Option<f64>,
    pub memory_average: Option<f64>,
    pub temperature_average: Option<f64>,
}

/// Sum the buckets overlapping `[from, to)`.
///
/// A bucket only partially inside the range contributes the overlapping
/// fraction of each accumulator.
pub fn sum_buckets(buckets: &BTreeMap<i64, UsageBucket>, from: i64, to: i64) -> UsageTotals {
    let mut total = UsageTotals::default();
    if from >= to {
        return total;
    }

    for (&start, bucket) in buckets {
        let span = bucket.span_ms.max(1);
        let end = start.saturating_add(span);
        let overlap_start = start.max(from);
        let overlap_end = end.min(to);
        if overlap_end <= overlap_start {
            continue;
        }

        let fraction = (overlap_end - overlap_start) as f64 / span as f64;
        total.add_scaled(bucket, fraction);
    }

    total
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub day: UsageStats,
    pub week: UsageStats,
    pub month: UsageStats,
}

impl WindowStats {
    pub fn get(&self, window: UsageWindow) -> &UsageStats {
        match window {
            UsageWindow::Day => &self.day,
            UsageWindow::Week => &self.week,
            UsageWindow::Month => &self.month,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    pub id: String,
    pub index: String,
    pub name: String,
    pub last_sample_ts: Option<i64>,
    pub windows: WindowStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    /// Start of the UTC day
    pub day_start: i64,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub generated_at: i64,
    pub updated_at: i64,
    pub overall: WindowStats,
    pub devices: Vec<DeviceReport>,
    pub daily: Vec<DailyPoint>,
}

/// Build the per-device and overall report for the windows ending at `now`
pub fn build_report(state: &UsageSummaryState, now: i64) -> UsageReport {
    let mut profiles: Vec<_> = state.devices.values().collect();
    profiles.sort_by(|a, b| {
        a.index
            .parse::<u32>()
            .unwrap_or(u32::MAX)
            .cmp(&b.index.parse::<u32>().unwrap_or(u32::MAX))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut overall = [UsageTotals::default(); 3];
    let mut devices = Vec::with_capacity(profiles.len());

    for profile in &profiles {
        let mut totals = [UsageTotals::default(); 3];
        for (slot, window) in UsageWindow::ALL.iter().enumerate() {
            totals[slot] = sum_buckets(&profile.buckets, now - window.duration_ms(), now);
            overall[slot].add(&totals[slot]);
        }

        devices.push(DeviceReport {
            id: profile.id.clone(),
            index: profile.index.clone(),
            name: profile.name.clone(),
            last_sample_ts: profile.last_sample_ts,
            windows: window_stats(&totals),
        });
    }

    let today = day_key(now);
    let daily = (0..DAILY_SERIES_DAYS as i64)
        .rev()
        .map(|days_ago| {
            let day_start = today - days_ago * DAY_MS;
            let mut total = UsageTotals::default();
            for profile in &profiles {
                total.add(&sum_buckets(&profile.buckets, day_start, day_start + DAY_MS));
            }
            DailyPoint {
                day_start,
                average: total.stats().average,
            }
        })
        .collect();

    UsageReport {
        generated_at: now,
        updated_at: state.updated_at,
        overall: window_stats(&overall),
        devices,
        daily,
    }
}

fn window_stats(totals: &[UsageTotals; 3]) -> WindowStats {
    WindowStats {
        day: totals[0].stats(),
        week: totals[1].stats(),
        month: totals[2].stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::usage::types::{DeviceProfile, BUCKET_SPAN_MS};

    fn bucket(sum: f64, count: u64, active_ms: i64, sample_ms: i64) -> UsageBucket {
        UsageBucket {
            sum,
            count,
            active_sum: sum / count.max(1) as f64 * active_ms as f64,
            active_ms,
            sample_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_sum_buckets_full_overlap() {
        let mut buckets = BTreeMap::new();
        buckets.insert(0, bucket(60.0, 3, 6000, 6000));
        buckets.insert(BUCKET_SPAN_MS, bucket(30.0, 1, 2000, 4000));

        let total = sum_buckets(&buckets, 0, 2 * BUCKET_SPAN_MS);
        assert_eq!(total.count, 4.0);
        assert_eq!(total.sum, 90.0);
        assert_eq!(total.sample_ms, 10_000.0);

        let stats = total.stats();
        assert_eq!(stats.average, Some(22.5));
        assert_eq!(stats.active_fraction, Some(0.8));
    }

    #[test]
    fn test_sum_buckets_partial_overlap() {
        let mut buckets = BTreeMap::new();
        buckets.insert(0, bucket(40.0, 4, 8000, 8000));

        let total = sum_buckets(&buckets, BUCKET_SPAN_MS / 2, 3 * BUCKET_SPAN_MS);
        assert_eq!(total.count, 2.0);
        assert_eq!(total.sample_ms, 4000.0);
        // Ratios are unaffected by the scaling
        assert_eq!(total.stats().average, Some(10.0));
    }

    #[test]
    fn test_sum_buckets_empty_range() {
        let mut buckets = BTreeMap::new();
        buckets.insert(0, bucket(40.0, 4, 8000, 8000));

        assert_eq!(sum_buckets(&buckets, 10, 10), UsageTotals::default());
        assert_eq!(sum_buckets(&buckets, 20, 10), UsageTotals::default());
    }

    #[test]
    fn test_stats_absent_without_data() {
        let stats = UsageTotals::default().stats();
        assert_eq!(stats.average, None);
        assert_eq!(stats.in_use_percent, None);
        assert_eq!(stats.in_use_ms, None);
        assert_eq!(stats.temperature_average, None);
    }

    #[test]
    fn test_sum_buckets_scales_by_stored_span() {
        let mut day_bucket = bucket(10.0, 1, 0, DAY_MS);
        day_bucket.span_ms = DAY_MS;
        let mut buckets = BTreeMap::new();
        buckets.insert(0, day_bucket);

        let total = sum_buckets(&buckets, 0, DAY_MS / 4);
        assert_eq!(total.sample_ms, (DAY_MS / 4) as f64);
    }

    #[test]
    fn test_build_report_orders_devices_and_aggregates() {
        let now = 40 * DAY_MS + 5 * BUCKET_SPAN_MS;
        let hour = now - now % BUCKET_SPAN_MS - BUCKET_SPAN_MS;

        let mut state = UsageSummaryState::new(now);
        for (id, index, value) in [("b", "1", 80.0), ("a", "0", 20.0)] {
            let mut profile = DeviceProfile::new(id, index, "");
            profile.buckets.insert(hour, bucket(value, 1, 1000, 1000));
            state.devices.insert(id.to_string(), profile);
        }

        let report = build_report(&state, now);
        let ids: Vec<_> = report.devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(report.devices[0].windows.day.average, Some(20.0));
        assert_eq!(report.overall.day.average, Some(50.0));
        assert_eq!(report.overall.get(UsageWindow::Month).in_use_ms, Some(2000.0));

        assert_eq!(report.daily.len(), DAILY_SERIES_DAYS);
        let last = report.daily.last().unwrap();
        assert_eq!(last.day_start, day_key(now));
        assert_eq!(last.average, Some(50.0));
        assert_eq!(report.daily[0].average, None);
    }
}
