//! Pathwatch Metrics Module
//!
//! Prometheus-backed store for the watched-directory series and the HTTP
//! endpoint that exposes them.
//!
//! # Key Metrics
//!
//! - `path_watcher_total`: matching files ever created (counter)
//! - `path_watcher_size_total`: bytes of matching files ever created (counter)
//! - `path_watcher_current_file_count`: matching files present now (gauge)
//! - `path_watcher_current_file_size`: bytes of matching files present now (gauge)
//!
//! # Example
//!
//! ```ignore
//! use pathwatch_metrics::{LabelSet, MetricsConfig, MetricsServer, MetricsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MetricsStore::new(["project"])?;
//!
//!     let server = MetricsServer::new(store.clone(), MetricsConfig::new(2012, "/metrics"));
//!     let listener = server.bind().await?;
//!     tokio::spawn(server.serve_on(listener));
//!
//!     let labels: LabelSet = [("path", "/data"), ("project", "billing")].into_iter().collect();
//!     store.record_creation(&labels, 1024);
//!     store.set_current(&labels, 1, 1024);
//!
//!     Ok(())
//! }
//! ```

pub mod server;
pub mod store;
pub mod types;

pub use server::MetricsServer;
pub use store::{
    MetricsStore, CURRENT_FILE_COUNT_METRIC, CURRENT_FILE_SIZE_METRIC, FILE_COUNT_METRIC,
    FILE_SIZE_METRIC, PATH_LABEL,
};
pub use types::{LabelSet, MetricsConfig, SeriesValues};

// Re-export prometheus types for convenience
pub use prometheus::{Encoder, TextEncoder};
