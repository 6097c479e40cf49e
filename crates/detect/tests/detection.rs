//! End-to-end detection behavior through the public API

use opsense_detect::{
    register_builtin, DetectorConfig, FileEvent, FileOperation, InMemoryRegistry,
    OperationDetector, OperationType, StreamingDetector,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const MS: u64 = 1_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fixed(
    op_type: OperationType,
    path: &'static str,
    confidence: f64,
) -> impl Fn(&[FileEvent]) -> anyhow::Result<Option<FileOperation>> + Send + Sync + 'static {
    move |events: &[FileEvent]| {
        Ok(Some(FileOperation::new(
            op_type.clone(),
            path,
            confidence,
            events.to_vec(),
        )))
    }
}

fn builtin_detector(window_ms: u64) -> OperationDetector {
    let registry = Arc::new(InMemoryRegistry::new());
    register_builtin(&registry);
    OperationDetector::new(DetectorConfig::new(window_ms, 0.5).unwrap(), registry).unwrap()
}

#[test]
fn test_events_within_window_share_a_group() {
    init_tracing();
    let detector = builtin_detector(100);

    let ops = detector.detect(vec![
        FileEvent::created(0, "/w/new.txt"),
        FileEvent::modified(80 * MS, "/w/new.txt"),
    ]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].operation_type, OperationType::Create);
    assert_eq!(ops[0].events.len(), 2);
}

#[test]
fn test_window_anchored_to_group_start() {
    init_tracing();
    let detector = builtin_detector(100);

    // Every gap is 60ms, but the third event is 120ms past the anchor
    let ops = detector.detect(vec![
        FileEvent::modified(0, "/w/a.txt"),
        FileEvent::modified(60 * MS, "/w/a.txt"),
        FileEvent::modified(120 * MS, "/w/a.txt"),
    ]);

    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].events.len(), 2);
    assert_eq!(ops[1].events.len(), 1);
}

#[test]
fn test_priority_short_circuit() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register_fn("b", 50, fixed(OperationType::Modify, "/w/a.txt", 0.99));
    registry.register_fn("a", 100, fixed(OperationType::Rename, "/w/a.txt", 0.96));
    let detector =
        OperationDetector::new(DetectorConfig::new(100, 0.5).unwrap(), registry).unwrap();

    let ops = detector.detect(vec![FileEvent::modified(0, "/w/a.txt")]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].confidence, 0.96);
    assert_eq!(ops[0].operation_type, OperationType::Rename);
}

#[test]
fn test_noise_is_never_reported() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register_fn("silent", 10, |_: &[FileEvent]| Ok(None));
    registry.register_fn("unsure", 5, fixed(OperationType::Modify, "/w/a.txt", 0.3));
    registry.register_fn("broken", 1, |_: &[FileEvent]| Err(anyhow::anyhow!("oops")));
    let detector =
        OperationDetector::new(DetectorConfig::new(100, 0.5).unwrap(), registry).unwrap();

    let ops = detector.detect(vec![
        FileEvent::modified(0, "/w/a.txt"),
        FileEvent::modified(10 * MS, "/w/a.txt"),
    ]);

    assert!(ops.is_empty());
}

#[test]
fn test_temp_correction_resolvable() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register_fn("naive", 1, fixed(OperationType::AtomicSave, "/w/.tmp123", 0.9));
    let detector =
        OperationDetector::new(DetectorConfig::new(100, 0.5).unwrap(), registry).unwrap();

    let ops = detector.detect(vec![
        FileEvent::created(0, "/w/.tmp123"),
        FileEvent::modified(10 * MS, "/w/.tmp123"),
        FileEvent::moved(20 * MS, "/w/.tmp123", "/w/report.txt"),
    ]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].primary_path, PathBuf::from("/w/report.txt"));
}

#[test]
fn test_temp_correction_unresolvable() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register_fn("naive", 1, fixed(OperationType::Create, "/w/.tmp123", 0.99));
    let detector =
        OperationDetector::new(DetectorConfig::new(100, 0.5).unwrap(), registry).unwrap();

    let ops = detector.detect(vec![
        FileEvent::created(0, "/w/.tmp123"),
        FileEvent::deleted(10 * MS, "/w/.tmp123"),
    ]);

    assert!(ops.is_empty());
}

#[test]
fn test_two_bursts_stay_separate() {
    init_tracing();
    let detector = builtin_detector(100);

    let ops = detector.detect(vec![
        FileEvent::created(0, "/w/.report.txt.tmp"),
        FileEvent::modified(5 * MS, "/w/.report.txt.tmp"),
        FileEvent::moved(10 * MS, "/w/.report.txt.tmp", "/w/report.txt"),
        FileEvent::moved(500 * MS, "/w/report.txt", "/w/final.txt"),
    ]);

    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].operation_type, OperationType::AtomicSave);
    assert_eq!(ops[0].primary_path, PathBuf::from("/w/report.txt"));
    assert_eq!(ops[1].operation_type, OperationType::Rename);
    assert_eq!(ops[1].primary_path, PathBuf::from("/w/final.txt"));
}

#[test]
fn test_unsorted_input_is_ordered_first() {
    init_tracing();
    let detector = builtin_detector(100);

    let ops = detector.detect(vec![
        FileEvent::moved(20 * MS, "/w/.doc.md.tmp", "/w/doc.md"),
        FileEvent::created(0, "/w/.doc.md.tmp"),
    ]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].confidence, 0.97);
    assert_eq!(ops[0].events[0].timestamp, 0);
}

#[tokio::test(start_paused = true)]
async fn test_streaming_idempotent_empty_flush() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    register_builtin(&registry);
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let sink = emitted.clone();
    let detector = StreamingDetector::new(
        DetectorConfig::default(),
        registry,
        move |op: FileOperation| sink.lock().push(op),
    )
    .unwrap();

    assert!(detector.flush().is_empty());
    assert!(detector.flush().is_empty());
    assert!(emitted.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_streaming_vim_save_sequence() {
    init_tracing();
    let registry = Arc::new(InMemoryRegistry::new());
    register_builtin(&registry);
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let sink = emitted.clone();
    let detector = StreamingDetector::new(
        DetectorConfig::new(200, 0.5).unwrap(),
        registry,
        move |op: FileOperation| sink.lock().push(op),
    )
    .unwrap();

    detector.detect_streaming(vec![
        FileEvent::created(0, "/w/.main.c.swp"),
        FileEvent::modified(MS, "/w/.main.c.swp"),
        FileEvent::moved(2 * MS, "/w/main.c", "/w/main.c~"),
        FileEvent::created(3 * MS, "/w/main.c"),
    ]);

    {
        let ops = emitted.lock();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation_type, OperationType::AtomicSave);
        assert_eq!(ops[0].primary_path, PathBuf::from("/w/main.c"));
    }

    // Trailing cleanup of the backup lands in a fresh window and is dropped
    detector.add_event(FileEvent::deleted(4 * MS, "/w/main.c~"));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(emitted.lock().len(), 1);
    assert_eq!(detector.pending_len(), 0);
}

#[test]
fn test_surviving_create_after_scratch_file() {
    init_tracing();
    let detector = builtin_detector(100);

    let ops = detector.detect(vec![
        FileEvent::created(0, "/w/scratch.txt"),
        FileEvent::deleted(10 * MS, "/w/scratch.txt"),
        FileEvent::created(20 * MS, "/w/keep.txt"),
    ]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].operation_type, OperationType::Create);
    assert_eq!(ops[0].primary_path, PathBuf::from("/w/keep.txt"));
}

#[test]
fn test_versioned_names_are_real_files() {
    init_tracing();
    let detector = builtin_detector(100);

    let ops = detector.detect(vec![FileEvent::created(0, "/w/Report.Q3.2024")]);

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].primary_path, PathBuf::from("/w/Report.Q3.2024"));
}
