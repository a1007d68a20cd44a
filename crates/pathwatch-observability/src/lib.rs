//! Pathwatch Observability Module
//!
//! Structured logging for the pathwatch exporter, built on `tracing`.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: Dynamic log level control via `RUST_LOG`
//! - **Rotated File Sink**: Daily rotation with bounded retention via `tracing-appender`
//!
//! # Example
//!
//! ```ignore
//! use pathwatch_observability::{init_tracing_with_config, LogConfig, LogOutput};
//!
//! let config = LogConfig::new().with_output(LogOutput::from_log_path("/var/log/pathwatch.log"));
//! let _guard = init_tracing_with_config(config)?;
//! tracing::info!("Application started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput, DEFAULT_MAX_LOG_FILES};
pub use initialization::{build_file_appender, init_tracing_with_config};
pub use tracing_appender::non_blocking::WorkerGuard;
