//! Folds point samples into per-device hourly buckets.

use super::types::{
    display_name, DeviceProfile, GpuSample, UsageBucket, UsageSummaryState, BUCKET_SPAN_MS,
};

/// Upper bound on the time one sample may claim, in multiples of the
/// nominal interval.
pub const GAP_CLAMP_FACTOR: i64 = 3;

/// Start of the bucket containing `time_ms`
pub fn bucket_key(time_ms: i64) -> i64 {
    time_ms.div_euclid(BUCKET_SPAN_MS) * BUCKET_SPAN_MS
}

/// Time attributed to a sample taken at `now`.
///
/// Falls back to the nominal interval when there is no usable previous
/// sample, and never exceeds `GAP_CLAMP_FACTOR` intervals so a sample after
/// a suspend or a missed query cannot dominate the bucket.
pub fn elapsed_ms(last_sample_ts: Option<i64>, now: i64, interval_ms: i64) -> i64 {
    let interval_ms = interval_ms.max(1);
    let elapsed = match last_sample_ts {
        Some(last) if now > last => now
            .saturating_sub(last)
            .min(interval_ms.saturating_mul(GAP_CLAMP_FACTOR)),
        _ => interval_ms,
    };

    if elapsed <= 0 {
        interval_ms
    } else {
        elapsed
    }
}

impl UsageBucket {
    /// Accumulate one sample that was attributed `elapsed` milliseconds
    pub fn record(&mut self, sample: &GpuSample, elapsed: i64) {
        if let Some(value) = sample.utilization_gpu {
            self.sum += value;
            self.count += 1;
            self.active_sum += value * elapsed as f64;
            self.active_ms = self.active_ms.saturating_add(elapsed);
        }
        if let Some(value) = sample.utilization_memory {
            self.utilization_memory_sum += value;
            self.utilization_memory_count += 1;
        }
        if let Some(value) = sample.temperature {
            self.temperature_sum += value;
            self.temperature_count += 1;
        }
        self.sample_ms = self.sample_ms.saturating_add(elapsed);
    }
}

/// Merge `samples` taken at `now` into `previous`.
///
/// Samples without an id or without any metric are ignored. Devices and
/// buckets not touched by this batch are carried over unchanged.
pub fn aggregate(
    previous: UsageSummaryState,
    samples: &[GpuSample],
    now: i64,
    interval_ms: i64,
) -> UsageSummaryState {
    let mut state = UsageSummaryState {
        version: previous.version,
        updated_at: now,
        collector_enabled: true,
        devices: previous.devices,
    };
    let key = bucket_key(now);

    for sample in samples {
        if sample.is_empty() || sample.id.is_empty() {
            continue;
        }

        let profile = state
            .devices
            .entry(sample.id.clone())
            .or_insert_with(|| DeviceProfile::new(&sample.id, &sample.index, &sample.name));

        let elapsed = elapsed_ms(profile.last_sample_ts, now, interval_ms);

        profile.id = sample.id.clone();
        profile.index = sample.index.clone();
        profile.name = display_name(&sample.id, &sample.name);
        profile.last_sample_ts = Some(now);
        profile.updated_at = Some(now);

        profile.buckets.entry(key).or_default().record(sample, elapsed);
    }

    state
}
