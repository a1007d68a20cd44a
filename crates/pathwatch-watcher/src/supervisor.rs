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
//! Supervisor fanning out one watcher task per target

use pathwatch_metrics::MetricsStore;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::WatcherError;
use crate::target::WatchTarget;
use crate::watcher::TargetWatcher;

/// Identifier of a supervised target, its position in start order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct WatchTask {
    target: Arc<WatchTarget>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Starts and tracks the watcher tasks
///
/// Watchers are independent of each other: none waits for another and a
/// watcher that stops does not affect the rest. Every task carries its own
/// cancellation token, derived from the supervisor's.
pub struct WatchSupervisor {
    store: MetricsStore,
    cancel: CancellationToken,
    tasks: BTreeMap<TargetId, WatchTask>,
    next_id: usize,
}

impl WatchSupervisor {
    /// Supervisor feeding `store`
    pub fn new(store: MetricsStore) -> Self {
        Self {
            store,
            cancel: CancellationToken::new(),
            tasks: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Start a watcher for every target
    ///
    /// Each target's gauges are populated before this returns. Stops at the
    /// first target whose directory cannot be subscribed to.
    pub fn start<I>(&mut self, targets: I) -> Result<Vec<TargetId>, WatcherError>
    where
        I: IntoIterator<Item = WatchTarget>,
    {
        targets.into_iter().map(|target| self.spawn(target)).collect()
    }

    /// Subscribe, seed the gauges, then launch the event loop
    ///
    /// Subscribing before the initial scan means a file created while the
    /// scan runs is still delivered as an event afterwards.
    pub fn spawn(&mut self, target: WatchTarget) -> Result<TargetId, WatcherError> {
        let target = Arc::new(target);
        let watcher = TargetWatcher::subscribe(Arc::clone(&target), self.store.clone())?;
        watcher.refresh();

        let id = TargetId(self.next_id);
        self.next_id += 1;

        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(watcher.run(cancel.clone()));
        info!(id = %id, target_name = %target.name, "Started watcher");

        self.tasks.insert(
            id,
            WatchTask {
                target,
                cancel,
                handle,
            },
        );
        Ok(id)
    }

    /// Number of supervised targets
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no target is supervised
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Supervised targets in start order
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &WatchTarget)> {
        self.tasks.iter().map(|(id, task)| (*id, task.target.as_ref()))
    }

    /// Whether the target's event loop is still running
    pub fn is_running(&self, id: TargetId) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Stop one watcher and wait for its loop to exit
    pub async fn cancel(&mut self, id: TargetId) -> bool {
        let Some(task) = self.tasks.remove(&id) else {
            return false;
        };
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!(id = %id, error = %e, "Watcher task ended abnormally");
        }
        true
    }

    /// Stop every watcher and wait for all loops to exit
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        for (id, task) in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.handle.await {
                warn!(id = %id, error = %e, "Watcher task ended abnormally");
            }
        }
        info!("All watchers stopped");
    }
}
