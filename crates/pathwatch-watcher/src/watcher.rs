// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Per-target watcher
//!
//! A [`TargetWatcher`] owns the filesystem subscription for one
//! [`WatchTarget`] and keeps that target's series in the [`MetricsStore`] in
//! step with the directory:
//!
//! - a creation with an accepted extension bumps the cumulative counters by
//!   one file and its size;
//! - every creation and every deletion triggers a full rescan that overwrites
//!   the current-state gauges.
//!
//! Events are handled strictly one after another, in delivery order, so two
//! rescans of the same target never race on its gauges.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pathwatch_metrics::MetricsStore;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::WatcherError;
use crate::scanner::{scan, ScanSummary};
use crate::target::WatchTarget;

/// Filesystem change relevant to the metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// A path appeared under the target
    Created(PathBuf),
    /// A path disappeared from the target
    Removed(PathBuf),
}

/// Paths remembered from unpaired rename halves
const RENAME_MEMORY: usize = 64;

/// Reduces raw notifications to creations and deletions
///
/// Renames are treated as a deletion of the old path and a creation of the
/// new one. Modifications and accesses are dropped.
///
/// Some backends (inotify) report a rename inside the watched directory three
/// times: as a `From` half, a `To` half and a combined `Both` event. The
/// halves are what renames across the directory boundary produce, so they are
/// always applied, and a `Both` event whose destination already arrived as a
/// `To` half is dropped.
#[derive(Debug, Default)]
pub struct EventClassifier {
    renamed_to: VecDeque<PathBuf>,
}

impl EventClassifier {
    /// Classifier with no rename history
    pub fn new() -> Self {
        Self::default()
    }

    /// File events carried by one notification
    pub fn classify(&mut self, event: &Event) -> Vec<FileEvent> {
        match &event.kind {
            EventKind::Create(_) => event.paths.iter().cloned().map(FileEvent::Created).collect(),
            EventKind::Remove(_) => event.paths.iter().cloned().map(FileEvent::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::To => {
                    for path in &event.paths {
                        self.remember(path);
                    }
                    event.paths.iter().cloned().map(FileEvent::Created).collect()
                }
                RenameMode::From => event.paths.iter().cloned().map(FileEvent::Removed).collect(),
                RenameMode::Both => match event.paths.as_slice() {
                    [from, to, ..] => {
                        if self.forget(to) {
                            return Vec::new();
                        }
                        vec![
                            FileEvent::Removed(from.clone()),
                            FileEvent::Created(to.clone()),
                        ]
                    }
                    _ => Vec::new(),
                },
                // Direction unknown (e.g. FSEvents): decide by what is on disk now
                _ => event
                    .paths
                    .iter()
                    .map(|path| {
                        if path.exists() {
                            FileEvent::Created(path.clone())
                        } else {
                            FileEvent::Removed(path.clone())
                        }
                    })
                    .collect(),
            },
            _ => Vec::new(),
        }
    }

    fn remember(&mut self, path: &Path) {
        if self.renamed_to.len() == RENAME_MEMORY {
            self.renamed_to.pop_front();
        }
        self.renamed_to.push_back(path.to_path_buf());
    }

    fn forget(&mut self, path: &Path) -> bool {
        match self.renamed_to.iter().position(|seen| seen == path) {
            Some(index) => {
                self.renamed_to.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Rescan the target and overwrite its gauges
///
/// A failed scan is logged and leaves the previous gauge values in place.
pub fn refresh_current(target: &WatchTarget, store: &MetricsStore) -> Option<ScanSummary> {
    match scan(&target.path, &target.formats) {
        Ok(summary) => {
            store.set_current(&target.labels, summary.count, summary.total_bytes);
            debug!(
                target_name = %target.name,
                path = %target.path.display(),
                count = summary.count,
                bytes = summary.total_bytes,
                "Updated current file metrics"
            );
            Some(summary)
        }
        Err(e) => {
            error!(
                target_name = %target.name,
                path = %target.path.display(),
                error = %e,
                "Scan failed, keeping previous current file metrics"
            );
            None
        }
    }
}

/// Apply one file event to the store
pub fn handle_file_event(target: &WatchTarget, store: &MetricsStore, event: &FileEvent) {
    match event {
        FileEvent::Created(path) => {
            debug!(target_name = %target.name, path = %path.display(), "File created");
            record_creation(target, store, path);
            refresh_current(target, store);
        }
        FileEvent::Removed(path) => {
            debug!(target_name = %target.name, path = %path.display(), "File deleted");
            refresh_current(target, store);
        }
    }
}

fn record_creation(target: &WatchTarget, store: &MetricsStore, path: &Path) {
    if !target.formats.matches(path) {
        debug!(path = %path.display(), "File format did not match");
        return;
    }

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            debug!(path = %path.display(), "Created entry is a directory, counters untouched");
        }
        Ok(metadata) => {
            store.record_creation(&target.labels, metadata.len());
            info!(
                target_name = %target.name,
                path = %path.display(),
                bytes = metadata.len(),
                "Recorded matching file"
            );
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to read metadata of created file, counters untouched"
            );
        }
    }
}

/// Watcher bound to one target's filesystem subscription
pub struct TargetWatcher {
    target: Arc<WatchTarget>,
    store: MetricsStore,
    // Dropping the watcher ends the subscription
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    classifier: EventClassifier,
}

impl TargetWatcher {
    /// Subscribe to notifications for the target's directory
    ///
    /// Fails when the directory is missing or the subscription cannot be
    /// established. Events are buffered from this point on, so nothing is
    /// lost between subscribing and [`run`](Self::run).
    pub fn subscribe(target: Arc<WatchTarget>, store: MetricsStore) -> Result<Self, WatcherError> {
        if !target.path.is_dir() {
            return Err(WatcherError::NotADirectory(target.path.clone()));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |result| {
            // The receiver only goes away together with this watcher
            let _ = events_tx.send(result);
        })?;

        let mode = if target.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&target.path, mode)
            .map_err(|source| WatcherError::WatchPath {
                path: target.path.clone(),
                source,
            })?;

        info!(
            target_name = %target.name,
            path = %target.path.display(),
            recursive = target.recursive,
            "Watching path"
        );

        Ok(Self {
            target,
            store,
            _watcher: watcher,
            events: events_rx,
            classifier: EventClassifier::new(),
        })
    }

    /// The watched target
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Seed or refresh the target's gauges from a full scan
    pub fn refresh(&self) -> Option<ScanSummary> {
        refresh_current(&self.target, &self.store)
    }

    /// Process events until cancelled or the subscription closes
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(target_name = %self.target.name, "Watcher cancelled");
                    break;
                }
                received = self.events.recv() => match received {
                    Some(Ok(event)) => self.dispatch(event).await,
                    Some(Err(e)) => {
                        warn!(target_name = %self.target.name, error = %e, "Watch error");
                    }
                    None => {
                        info!(target_name = %self.target.name, "Watch subscription closed");
                        break;
                    }
                },
            }
        }
    }

    /// Handle one notification on the blocking pool and wait for it
    async fn dispatch(&mut self, event: Event) {
        let file_events = self.classifier.classify(&event);
        if file_events.is_empty() {
            return;
        }

        let target = Arc::clone(&self.target);
        let store = self.store.clone();
        let handled = tokio::task::spawn_blocking(move || {
            for file_event in &file_events {
                handle_file_event(&target, &store, file_event);
            }
        })
        .await;

        if let Err(e) = handled {
            error!(target_name = %self.target.name, error = %e, "Event handler failed");
        }
    }
}
