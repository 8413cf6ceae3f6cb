//! Liveness marker tests.

use coredrain::LivenessState;
use coredrain::engine::LivenessReporter;
use coredrain::error::LivenessError;

fn marker(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_ready_writes_started() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("startupcheck");
    let liveness = LivenessReporter::new(&path);

    liveness.mark_ready().unwrap();

    assert_eq!(marker(&path), "started\n");
    assert_eq!(liveness.current(), Some(LivenessState::Ready));
}

#[test]
fn test_dead_writes_dead() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("startupcheck");
    let liveness = LivenessReporter::new(&path);

    liveness.mark_ready().unwrap();
    liveness.mark_dead().unwrap();

    assert_eq!(marker(&path), "dead\n");
    assert_eq!(liveness.current(), Some(LivenessState::Dead));
}

#[test]
fn test_marks_are_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("startupcheck");
    let liveness = LivenessReporter::new(&path);

    liveness.mark_ready().unwrap();
    liveness.mark_ready().unwrap();
    assert_eq!(marker(&path), "started\n");

    liveness.mark_dead().unwrap();
    liveness.mark_dead().unwrap();
    assert_eq!(marker(&path), "dead\n");
}

#[test]
fn test_starting_clears_stale_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("startupcheck");
    std::fs::write(&path, "started\n").unwrap();
    let liveness = LivenessReporter::new(&path);

    liveness.mark_starting().unwrap();

    assert!(!path.exists());
    assert_eq!(liveness.current(), Some(LivenessState::Starting));
    // Nothing to clear the second time.
    liveness.mark_starting().unwrap();
}

#[test]
fn test_unknown_marker_content() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("startupcheck");
    std::fs::write(&path, "maybe\n").unwrap();

    assert_eq!(LivenessReporter::new(&path).current(), None);
}

#[test]
fn test_write_failure_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing-dir").join("startupcheck");
    let liveness = LivenessReporter::new(&path);

    let err = liveness.mark_ready().unwrap_err();

    assert!(matches!(err, LivenessError::Write { .. }));
    assert!(err.to_string().contains("startupcheck"));
}

#[test]
fn test_clear_failure_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    // A directory where the marker should be cannot be removed as a file.
    let path = tmp.path().join("startupcheck");
    std::fs::create_dir(&path).unwrap();

    let err = LivenessReporter::new(&path).mark_starting().unwrap_err();

    assert!(matches!(err, LivenessError::Clear { .. }));
}

#[test]
fn test_marker_content_per_state() {
    assert_eq!(LivenessState::Starting.marker(), None);
    assert_eq!(LivenessState::Ready.marker(), Some("started\n"));
    assert_eq!(LivenessState::Dead.marker(), Some("dead\n"));
}
