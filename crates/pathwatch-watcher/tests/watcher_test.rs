//! Live filesystem tests for the watcher supervisor
//!
//! Files whose size is asserted are written outside the watched directory
//! and renamed in, so the creation event never sees a partially written file.

use pathwatch_metrics::{LabelSet, MetricsStore, SeriesValues};
use pathwatch_watcher::{WatchSupervisor, WatchTarget};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

async fn wait_for<F>(store: &MetricsStore, labels: &LabelSet, predicate: F) -> SeriesValues
where
    F: Fn(&SeriesValues) -> bool,
{
    let deadline = tokio::time::Instant::now() + POLL_TIMEOUT;
    loop {
        let current = store.values(labels).unwrap_or_default();
        if predicate(&current) || tokio::time::Instant::now() >= deadline {
            return current;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn place(staging: &Path, watched: &Path, name: &str, size: usize) {
    let staged = staging.join(name);
    fs::write(&staged, vec![0u8; size]).unwrap();
    fs::rename(&staged, watched.join(name)).unwrap();
}

fn store_for(targets: &[WatchTarget]) -> MetricsStore {
    MetricsStore::new(WatchTarget::label_names(targets)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_creation_and_removal_flow() {
    let watched = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let target = WatchTarget::new("d", watched.path(), "csv").with_label("team", "x");
    let labels = target.labels.clone();
    let store = store_for(std::slice::from_ref(&target));

    let mut supervisor = WatchSupervisor::new(store.clone());
    supervisor.start(vec![target]).unwrap();

    place(staging.path(), watched.path(), "a.csv", 100);
    let values = wait_for(&store, &labels, |v| v.file_count == 1 && v.current_file_size == 100).await;
    assert_eq!(values.file_count, 1);
    assert_eq!(values.file_size, 100);
    assert_eq!(values.current_file_count, 1);
    assert_eq!(values.current_file_size, 100);

    place(staging.path(), watched.path(), "b.csv", 50);
    let values = wait_for(&store, &labels, |v| v.file_count == 2 && v.current_file_size == 150).await;
    assert_eq!(values.file_count, 2);
    assert_eq!(values.file_size, 150);
    assert_eq!(values.current_file_count, 2);
    assert_eq!(values.current_file_size, 150);

    fs::remove_file(watched.path().join("a.csv")).unwrap();
    let values = wait_for(&store, &labels, |v| v.current_file_count == 1).await;
    assert_eq!(values.file_count, 2);
    assert_eq!(values.file_size, 150);
    assert_eq!(values.current_file_count, 1);
    assert_eq!(values.current_file_size, 50);

    supervisor.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_within_directory_counts_once() {
    let watched = TempDir::new().unwrap();
    let target = WatchTarget::new("d", watched.path(), "csv");
    let labels = target.labels.clone();
    let store = store_for(std::slice::from_ref(&target));

    let mut supervisor = WatchSupervisor::new(store.clone());
    supervisor.start(vec![target]).unwrap();

    let staged = watched.path().join("a.tmp");
    fs::write(&staged, vec![0u8; 100]).unwrap();
    fs::rename(&staged, watched.path().join("a.csv")).unwrap();

    let values = wait_for(&store, &labels, |v| v.file_count >= 1 && v.current_file_count == 1).await;
    assert_eq!(values.file_count, 1);

    // let any duplicate notification for the same rename land
    tokio::time::sleep(Duration::from_millis(500)).await;
    let values = store.values(&labels).unwrap();
    assert_eq!(values.file_count, 1);
    assert_eq!(values.file_size, 100);
    assert_eq!(values.current_file_count, 1);
    assert_eq!(values.current_file_size, 100);

    supervisor.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unmatched_extension_leaves_counters() {
    let watched = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    fs::write(watched.path().join("seed.csv"), vec![0u8; 10]).unwrap();

    let target = WatchTarget::new("d", watched.path(), "csv");
    let labels = target.labels.clone();
    let store = store_for(std::slice::from_ref(&target));

    let mut supervisor = WatchSupervisor::new(store.clone());
    supervisor.start(vec![target]).unwrap();

    place(staging.path(), watched.path(), "notes.txt", 500);
    place(staging.path(), watched.path(), "c.csv", 5);
    let values = wait_for(&store, &labels, |v| v.file_count == 1 && v.current_file_count == 2).await;

    assert_eq!(values.file_count, 1);
    assert_eq!(values.file_size, 5);
    assert_eq!(values.current_file_count, 2);
    assert_eq!(values.current_file_size, 15);

    supervisor.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_existing_files_only_seed_gauges() {
    let watched = TempDir::new().unwrap();
    fs::write(watched.path().join("a.log"), vec![0u8; 7]).unwrap();
    fs::write(watched.path().join("b.log"), vec![0u8; 3]).unwrap();

    let target = WatchTarget::new("logs", watched.path(), "log");
    let labels = target.labels.clone();
    let store = store_for(std::slice::from_ref(&target));

    let mut supervisor = WatchSupervisor::new(store.clone());
    supervisor.start(vec![target]).unwrap();

    let values = store.values(&labels).unwrap();
    assert_eq!(values.file_count, 0);
    assert_eq!(values.file_size, 0);
    assert_eq!(values.current_file_count, 2);
    assert_eq!(values.current_file_size, 10);

    supervisor.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_identical_label_sets_share_counters() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();

    let targets = vec![
        WatchTarget::new("first", first.path(), "csv").with_label("path", "shared"),
        WatchTarget::new("second", second.path(), "csv").with_label("path", "shared"),
    ];
    let labels = targets[0].labels.clone();
    assert_eq!(labels, targets[1].labels);
    let store = store_for(&targets);

    let mut supervisor = WatchSupervisor::new(store.clone());
    supervisor.start(targets).unwrap();

    place(staging.path(), first.path(), "a.csv", 10);
    let values = wait_for(&store, &labels, |v| v.file_count == 1).await;
    assert_eq!(values.file_count, 1);

    place(staging.path(), second.path(), "b.csv", 20);
    let values = wait_for(&store, &labels, |v| v.file_count == 2).await;
    assert_eq!(values.file_count, 2);
    assert_eq!(values.file_size, 30);

    supervisor.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_watcher_stops_counting() {
    let watched = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let target = WatchTarget::new("d", watched.path(), "csv");
    let labels = target.labels.clone();
    let store = store_for(std::slice::from_ref(&target));

    let mut supervisor = WatchSupervisor::new(store.clone());
    let ids = supervisor.start(vec![target]).unwrap();
    assert!(supervisor.cancel(ids[0]).await);

    place(staging.path(), watched.path(), "a.csv", 10);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let values = store.values(&labels).unwrap();
    assert_eq!(values.file_count, 0);
    assert_eq!(values.current_file_count, 0);
}
