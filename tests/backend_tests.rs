//! Tests for the file backend abstraction.

use filer_core::mode::OpenMode;
use filer_core::traits::FileBackend;
use filer_fs::{FileGate, StdBackend};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

mod common;
use common::mock_backend::MockBackend;

/// Tests that any backend can be driven by the same gate code.
async fn exercise_gate<B: FileBackend>(gate: FileGate<B>, existing: &Path, scratch_dir: &Path) {
    assert_eq!(gate.limit(), 2);

    // Regular open and close
    let mut file = gate.open(existing).await.unwrap();
    assert_eq!(gate.stats().admitted, 1);
    file.close().unwrap();

    // Temporary file holds a slot like any other
    let mut temp = gate.temp_file(scratch_dir, "abs-", ".tmp").await.unwrap();
    let mut again = gate.open(existing).await.unwrap();
    assert!(gate.try_open(existing, &OpenMode::read_only()).unwrap().is_none());
    temp.close().unwrap();
    again.close().unwrap();

    // Shutdown with nothing open drains immediately
    timeout(Duration::from_secs(1), gate.shutdown(Some(Duration::from_secs(1))))
        .await
        .unwrap()
        .unwrap();

    let stats = gate.stats();
    assert_eq!(stats.admitted, 0);
    assert_eq!(stats.peak, 2);
    assert_eq!(stats.total_admitted, 3);
    assert!(stats.shutting_down);
}

#[tokio::test]
async fn test_std_backend_through_gate() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("existing");
    std::fs::write(&existing, "x").unwrap();

    let gate = FileGate::builder().limit(2).backend(StdBackend::new()).build();
    exercise_gate(gate, &existing, dir.path()).await;
}

#[tokio::test]
async fn test_mock_backend_through_gate() {
    let backend = MockBackend::new();
    backend.add_file("existing");

    let gate = FileGate::builder().limit(2).backend(backend.clone()).build();
    exercise_gate(gate, Path::new("existing"), Path::new("/scratch")).await;

    assert_eq!(backend.open_count(), 0);
    assert_eq!(backend.removed().len(), 1);
}

#[tokio::test]
async fn test_limit_derived_from_backend_ceiling() {
    let gate = FileGate::builder()
        .backend(MockBackend::with_ceiling(1000))
        .build();
    assert_eq!(gate.limit(), 900);

    let gate = FileGate::builder()
        .limit(5)
        .backend(MockBackend::with_ceiling(1000))
        .build();
    assert_eq!(gate.limit(), 5);
}

#[tokio::test]
async fn test_gate_exposes_backend() {
    let backend = MockBackend::new();
    backend.add_file("a");
    let gate = FileGate::builder().limit(1).backend(backend).build();

    let mut file = gate.open("a").await.unwrap();
    assert!(gate.backend().is_open(Path::new("a")));
    file.close().unwrap();
    assert!(!gate.backend().is_open(Path::new("a")));
}

#[test]
fn test_mock_backend_tracks_files() {
    let backend = MockBackend::new();
    backend.add_file("a");

    let file = backend.open(Path::new("a"), &OpenMode::read_only()).unwrap();
    assert!(backend.is_open(Path::new("a")));
    backend.close(file).unwrap();
    assert!(!backend.is_open(Path::new("a")));
    assert_eq!(backend.closed(), vec![PathBuf::from("a")]);

    let err = backend.open(Path::new("missing"), &OpenMode::read_only()).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn test_mock_backend_collisions() {
    let backend = MockBackend::new();
    backend.set_collisions(1);
    let mode = OpenMode::exclusive_create();
    assert!(backend.open(Path::new("t"), &mode).is_err());
    assert!(backend.open(Path::new("t"), &mode).is_ok());
    assert!(backend.open(Path::new("t"), &mode).is_err());
}
