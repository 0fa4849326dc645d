use gpu_usage::core::usage::{
    aggregate, now_ms, GpuSample, UsageStore, UsageSummaryState, BUCKET_SPAN_MS,
    USAGE_SUMMARY_VERSION,
};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn sample(id: &str, gpu: f64) -> GpuSample {
    GpuSample {
        id: id.to_string(),
        index: "0".to_string(),
        name: "Test GPU".to_string(),
        utilization_gpu: Some(gpu),
        utilization_memory: Some(12.0),
        temperature: Some(48.0),
    }
}

fn assert_fresh(state: &UsageSummaryState, before: i64) {
    assert_eq!(state.version, USAGE_SUMMARY_VERSION);
    assert!(state.collector_enabled);
    assert!(state.devices.is_empty());
    assert!(state.updated_at >= before);
}

#[test]
fn test_load_missing_file_returns_fresh_state() {
    let temp_dir = TempDir::new().unwrap();
    let store = UsageStore::new(temp_dir.path().join("usage-summary.json"));

    let before = now_ms();
    assert_fresh(&store.load(), before);
}

#[test]
fn test_load_corrupt_file_returns_fresh_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("usage-summary.json");
    let store = UsageStore::new(&path);

    for content in [
        "",
        "{\"version\": 3, \"devices\": {\"GPU-1\": {",
        "[]",
        "42",
        "null",
        "{\"version\": 3, \"devices\": \"nope\"}",
        "not json at all",
    ] {
        fs::write(&path, content).unwrap();
        let before = now_ms();
        assert_fresh(&store.load(), before);
    }
}

#[test]
fn test_load_directory_instead_of_file_returns_fresh_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("usage-summary.json");
    fs::create_dir(&path).unwrap();

    let before = now_ms();
    assert_fresh(&UsageStore::new(&path).load(), before);
}

#[test]
fn test_roundtrip_preserves_devices_and_forces_flags() {
    let temp_dir = TempDir::new().unwrap();
    let store = UsageStore::new(temp_dir.path().join("state").join("usage-summary.json"));

    let mut state = aggregate(
        UsageSummaryState::new(0),
        &[sample("GPU-1", 30.0), sample("GPU-2", 70.0)],
        5 * BUCKET_SPAN_MS + 10,
        2000,
    );
    state.version = 1;
    state.collector_enabled = false;

    store.write(&state).unwrap();
    let loaded = store.load();

    assert_eq!(loaded.devices, state.devices);
    assert_eq!(loaded.version, USAGE_SUMMARY_VERSION);
    assert!(loaded.collector_enabled);
}

#[test]
fn test_write_failure_is_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    // Parent "directory" is a regular file, so creating it must fail
    let store = UsageStore::new(blocker.join("usage-summary.json"));
    let state = UsageSummaryState::new(now_ms());

    assert!(store.write(&state).is_err());
    assert!(!store.persist(&state));
}

#[test]
fn test_concurrent_reader_never_sees_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("usage-summary.json");
    let store = UsageStore::new(&path);

    let mut state = UsageSummaryState::new(0);
    let samples: Vec<_> = (0..64).map(|i| sample(&format!("GPU-{}", i), i as f64)).collect();
    for hour in 0..24 {
        state = aggregate(state, &samples, hour * BUCKET_SPAN_MS, 2000);
    }
    store.write(&state).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader_done = done.clone();
    let reader_path = path.clone();
    let reader = thread::spawn(move || {
        let mut reads = 0;
        loop {
            let raw = fs::read_to_string(&reader_path).unwrap();
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(value["devices"].as_object().unwrap().len(), 64);
            reads += 1;
            if reader_done.load(Ordering::Relaxed) {
                break;
            }
        }
        reads
    });

    for _ in 0..50 {
        store.write(&state).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    assert!(reader.join().unwrap() > 0);
}
