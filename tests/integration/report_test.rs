use gpu_usage::core::usage::{
    aggregate, build_report, parse_state, sum_buckets, GpuSample, UsageStore, UsageSummaryState,
    UsageWindow, BUCKET_SPAN_MS, DAY_MS,
};
use tempfile::TempDir;

fn sample(id: &str, index: &str, gpu: f64) -> GpuSample {
    GpuSample {
        id: id.to_string(),
        index: index.to_string(),
        name: format!("GPU {}", index),
        utilization_gpu: Some(gpu),
        utilization_memory: None,
        temperature: Some(60.0),
    }
}

#[test]
fn test_report_from_persisted_summary() {
    let temp_dir = TempDir::new().unwrap();
    let store = UsageStore::new(temp_dir.path().join("usage-summary.json"));

    let now = 500 * DAY_MS + 12 * BUCKET_SPAN_MS;
    let mut state = UsageSummaryState::new(0);

    // Ten days ago: outside the day and week windows, inside the month
    let old = now - 10 * DAY_MS;
    state = aggregate(state, &[sample("GPU-a", "0", 90.0)], old, 1000);

    // Two hours ago
    let recent = now - 2 * BUCKET_SPAN_MS;
    state = aggregate(
        state,
        &[sample("GPU-a", "0", 30.0), sample("GPU-b", "1", 10.0)],
        recent,
        1000,
    );

    store.write(&state).unwrap();
    let report = build_report(&store.load(), now);

    assert_eq!(report.devices.len(), 2);
    let gpu_a = &report.devices[0];
    assert_eq!(gpu_a.id, "GPU-a");
    assert_eq!(gpu_a.windows.get(UsageWindow::Day).average, Some(30.0));
    assert_eq!(gpu_a.windows.get(UsageWindow::Week).average, Some(30.0));
    assert_eq!(gpu_a.windows.get(UsageWindow::Month).average, Some(60.0));
    assert_eq!(gpu_a.windows.day.temperature_average, Some(60.0));

    assert_eq!(report.overall.day.average, Some(20.0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["devices"][1]["id"], "GPU-b");
    assert!(json["overall"]["month"]["inUsePercent"].is_number());
}

#[test]
fn test_report_for_empty_state() {
    let report = build_report(&UsageSummaryState::new(0), DAY_MS);

    assert!(report.devices.is_empty());
    assert_eq!(report.overall.week.average, None);
    assert!(report.daily.iter().all(|p| p.average.is_none()));
}

#[test]
fn test_legacy_day_bucket_without_span() {
    let raw = r#"{
        "version": 2,
        "gpus": {
            "GPU-a": {
                "id": "GPU-a",
                "days": {
                    "0": {"sum": 400, "count": 10, "activeSum": 3200000000,
                          "activeMs": 80000000, "sampleMs": 80000000},
                    "86400000": {"sum": 20, "count": 1, "activeSum": 40000,
                                 "activeMs": 2000, "sampleMs": 2000}
                }
            }
        }
    }"#;

    let state = parse_state(raw, 3 * DAY_MS).unwrap();
    let buckets = &state.devices["GPU-a"].buckets;
    assert_eq!(buckets[&0].span_ms, DAY_MS);
    assert_eq!(buckets[&DAY_MS].span_ms, BUCKET_SPAN_MS);

    // Half of the day bucket falls inside the window
    let total = sum_buckets(buckets, 0, DAY_MS / 2);
    assert_eq!(total.sample_ms, 40_000_000.0);
    assert_eq!(total.count, 5.0);
    assert_eq!(total.stats().average, Some(40.0));
}
