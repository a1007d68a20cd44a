//! Pathwatch Watcher Module
//!
//! Keeps the pathwatch metrics in sync with watched directories.
//!
//! # Components
//!
//! - [`scan`]: recursive count and size of files with accepted extensions
//! - [`EventClassifier`]: reduces notifications to creations and deletions
//! - [`TargetWatcher`]: one filesystem subscription per [`WatchTarget`],
//!   turning creations into counter increments and every change into a gauge
//!   rescan
//! - [`WatchSupervisor`]: starts one independent task per target after
//!   seeding its gauges
//!
//! # Example
//!
//! ```ignore
//! use pathwatch_metrics::MetricsStore;
//! use pathwatch_watcher::{WatchSupervisor, WatchTarget};
//!
//! let targets: Vec<WatchTarget> = config.watcher.iter().map(WatchTarget::from_config).collect();
//! let store = MetricsStore::new(WatchTarget::label_names(&targets))?;
//!
//! let mut supervisor = WatchSupervisor::new(store.clone());
//! supervisor.start(targets)?;
//! ```

pub mod error;
pub mod formats;
pub mod scanner;
pub mod supervisor;
pub mod target;
pub mod watcher;

pub use error::{ScanError, WatcherError};
pub use formats::{extension_of, FormatSet};
pub use scanner::{scan, ScanSummary};
pub use supervisor::{TargetId, WatchSupervisor};
pub use target::WatchTarget;
pub use watcher::{
    handle_file_event, refresh_current, EventClassifier, FileEvent, TargetWatcher,
};
