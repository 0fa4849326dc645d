use gpu_usage::core::usage::{
    aggregate, bucket_key, parse_state, prune, retention_cutoff, GpuSample, UsageSummaryState,
    BUCKET_SPAN_MS, DAY_MS,
};

const INTERVAL_MS: i64 = 2000;

fn sample(gpu: Option<f64>, memory: Option<f64>, temperature: Option<f64>) -> GpuSample {
    GpuSample {
        id: "GPU-5f1c".to_string(),
        index: "0".to_string(),
        name: "NVIDIA A100".to_string(),
        utilization_gpu: gpu,
        utilization_memory: memory,
        temperature,
    }
}

/// Simulate a collector polling every interval for `ticks` ticks
fn run_ticks(mut state: UsageSummaryState, start: i64, ticks: i64, value: f64) -> UsageSummaryState {
    for i in 0..ticks {
        let now = start + i * INTERVAL_MS;
        state = aggregate(state, &[sample(Some(value), Some(10.0), Some(50.0))], now, INTERVAL_MS);
        prune(&mut state, now, 30);
    }
    state
}

#[test]
fn test_steady_polling_fills_one_bucket() {
    let start = 100 * DAY_MS;
    let state = run_ticks(UsageSummaryState::new(start), start, 100, 40.0);

    let profile = &state.devices["GPU-5f1c"];
    assert_eq!(profile.buckets.len(), 1);

    let bucket = &profile.buckets[&bucket_key(start)];
    assert_eq!(bucket.count, 100);
    assert_eq!(bucket.sample_ms, 100 * INTERVAL_MS);
    assert_eq!(bucket.active_ms, bucket.sample_ms);
    assert_eq!(bucket.active_sum / bucket.active_ms as f64, 40.0);
    assert_eq!(bucket.utilization_memory_count, 100);
    assert_eq!(bucket.temperature_sum / bucket.temperature_count as f64, 50.0);
    assert_eq!(profile.last_sample_ts, Some(start + 99 * INTERVAL_MS));
}

#[test]
fn test_suspend_gap_is_bounded() {
    let start = 100 * DAY_MS;
    let mut state = run_ticks(UsageSummaryState::new(start), start, 1, 100.0);

    // Machine was suspended for ten intervals
    let resumed = start + 10 * INTERVAL_MS;
    state = aggregate(state, &[sample(Some(100.0), None, None)], resumed, INTERVAL_MS);

    let bucket = &state.devices["GPU-5f1c"].buckets[&bucket_key(start)];
    assert_eq!(bucket.active_ms, INTERVAL_MS + 3 * INTERVAL_MS);
    assert_eq!(bucket.sample_ms, INTERVAL_MS + 3 * INTERVAL_MS);
}

#[test]
fn test_empty_sample_leaves_state_untouched() {
    let start = 100 * DAY_MS;
    let state = run_ticks(UsageSummaryState::new(start), start, 5, 20.0);
    let before = serde_json::to_string(&state.devices["GPU-5f1c"]).unwrap();

    let state = aggregate(state, &[sample(None, None, None)], start + DAY_MS, INTERVAL_MS);
    let after = serde_json::to_string(&state.devices["GPU-5f1c"]).unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_history_is_bounded_by_retention() {
    let mut state = UsageSummaryState::new(0);
    let start = 1_000 * DAY_MS;

    // One sample every six hours for sixty days
    for step in 0..(60 * 4) {
        let now = start + step * 6 * BUCKET_SPAN_MS;
        state = aggregate(state, &[sample(Some(5.0), None, None)], now, INTERVAL_MS);
        prune(&mut state, now, 30);
    }

    let now = start + (60 * 4 - 1) * 6 * BUCKET_SPAN_MS;
    let cutoff = retention_cutoff(now, 30);
    let buckets = &state.devices["GPU-5f1c"].buckets;

    assert!(buckets.keys().all(|k| *k >= cutoff));
    assert!(buckets.keys().all(|k| k % BUCKET_SPAN_MS == 0));
    assert!(buckets.len() <= 31 * 4);
    assert!(buckets.contains_key(&cutoff));
}

#[test]
fn test_corrupt_timestamp_on_disk_is_not_fatal() {
    let raw = r#"{"devices": {"GPU-5f1c": {"id": "GPU-5f1c", "lastSampleTs": -9223372036854775808}}}"#;
    let now = 100 * DAY_MS;
    let state = parse_state(raw, now).unwrap();
    assert_eq!(state.devices["GPU-5f1c"].last_sample_ts, Some(i64::MIN));

    let state = aggregate(state, &[sample(Some(80.0), None, None)], now, INTERVAL_MS);
    let bucket = &state.devices["GPU-5f1c"].buckets[&bucket_key(now)];
    assert_eq!(bucket.sample_ms, 3 * INTERVAL_MS);
    assert_eq!(bucket.active_sum / bucket.active_ms as f64, 80.0);
}
