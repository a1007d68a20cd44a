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
//! Logging initialization and setup.
//!
//! This module provides functions to initialize the tracing system with
//! different configurations, output formats and destinations.

use crate::config::{split_log_path, LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Initialize tracing with a detailed configuration.
///
/// For file output the returned [`WorkerGuard`] flushes the background writer
/// when dropped, so it must be held for the lifetime of the process.
///
/// # Example
///
/// ```ignore
/// use pathwatch_observability::{init_tracing_with_config, LogConfig, LogOutput};
///
/// let config = LogConfig::new()
///     .with_level("debug")
///     .with_output(LogOutput::file("/var/log/pathwatch.log"));
///
/// let _guard = init_tracing_with_config(config)?;
/// tracing::info!("Application started");
/// ```
pub fn init_tracing_with_config(config: LogConfig) -> Result<Option<WorkerGuard>, LogError> {
    let env_filter = build_env_filter(&config)?;
    let (writer, guard) = build_writer(&config.output)?;
    let ansi = config.effective_color();
    let registry = Registry::default().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(true)
                .pretty();

            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .compact();

            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .json()
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(true);

            if config.use_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
    };

    result.map_err(|e| {
        LogError::ConfigError(format!("Failed to set global default subscriber: {}", e))
    })?;

    Ok(guard)
}

/// Build a daily rotating appender for `path`, keeping at most `max_files` files
pub fn build_file_appender(path: &Path, max_files: usize) -> Result<RollingFileAppender, LogError> {
    let (directory, file_name) = split_log_path(path)?;
    std::fs::create_dir_all(&directory)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(max_files)
        .build(&directory)
        .map_err(|e| {
            LogError::ConfigError(format!(
                "Failed to open log file in {}: {}",
                directory.display(),
                e
            ))
        })
}

/// Get the writer for the specified output
fn build_writer(output: &LogOutput) -> Result<(BoxMakeWriter, Option<WorkerGuard>), LogError> {
    match output {
        LogOutput::Stderr => Ok((BoxMakeWriter::new(io::stderr), None)),
        LogOutput::Stdout => Ok((BoxMakeWriter::new(io::stdout), None)),
        LogOutput::File { path, max_files } => {
            let appender = build_file_appender(path, *max_files)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            Ok((BoxMakeWriter::new(non_blocking), Some(guard)))
        }
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| {
        LogError::ConfigError(format!("Failed to parse log filter '{}': {}", level_str, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installing the global subscriber is a one-shot per process, so these
    // tests only exercise the pieces that feed into it.

    #[test]
    fn test_env_filter_parsing() {
        assert!(build_env_filter(&LogConfig::new().with_level("debug")).is_ok());
        assert!(build_env_filter(&LogConfig::new().with_level("pathwatch_watcher=trace")).is_ok());
    }

    #[test]
    fn test_invalid_env_filter() {
        let result = build_env_filter(&LogConfig::new().with_level("[[invalid"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stderr_writer_has_no_guard() {
        let (_writer, guard) = build_writer(&LogOutput::Stderr).unwrap();
        assert!(guard.is_none());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("pathwatch.log");

        let (_writer, guard) = build_writer(&LogOutput::file(&log_path)).unwrap();
        assert!(guard.is_some());
        assert!(temp_dir.path().join("logs").is_dir());
    }
}
