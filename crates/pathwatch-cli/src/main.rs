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

//! `pathwatch` binary: exports file counts and sizes of watched directories
//! as Prometheus metrics.

use anyhow::{Context, Result};
use clap::Parser;
use pathwatch_config::{Config, ConfigLoader};
use pathwatch_metrics::{MetricsConfig, MetricsServer, MetricsStore};
use pathwatch_observability::{init_tracing_with_config, LogConfig, LogOutput, WorkerGuard};
use pathwatch_watcher::{WatchSupervisor, WatchTarget};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pathwatch")]
#[command(version, about = "Prometheus exporter for file counts and sizes in watched directories")]
#[command(
    long_about = "pathwatch watches configured directories and exports, per target, the number and
total size of files created since startup and of matching files currently present."
)]
struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(long = "config.file", value_name = "PATH", default_value = "config.yaml")]
    config_file: PathBuf,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", Config::sample().to_yaml()?);
        return Ok(());
    }

    let config = ConfigLoader::new()
        .load_with_overrides(&cli.config_file)
        .await
        .with_context(|| format!("Failed to load config {}", cli.config_file.display()))?;

    let _guard = init_logging(&config)?;
    info!(
        config = %cli.config_file.display(),
        watchers = config.watcher.len(),
        "Starting pathwatch {}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run(config).await {
        error!(error = %format!("{:#}", e), "pathwatch stopped");
        return Err(e);
    }
    Ok(())
}

fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let mut log_config = LogConfig::new().with_output(LogOutput::from_log_path(&config.log_path));
    if let Some(level) = &config.log_level {
        log_config = log_config.with_level(level.as_str());
    }
    init_tracing_with_config(log_config).context("Failed to initialize logging")
}

async fn run(config: Config) -> Result<()> {
    let targets: Vec<WatchTarget> = config.watcher.iter().map(WatchTarget::from_config).collect();
    let store = MetricsStore::new(WatchTarget::label_names(&targets))?;

    let server = MetricsServer::new(
        store.clone(),
        MetricsConfig::new(config.exporter.port, config.exporter.endpoint.as_str()),
    );
    let listener = server.bind().await?;
    let server_task = tokio::spawn(server.serve_on(listener));

    let mut supervisor = WatchSupervisor::new(store);
    supervisor
        .start(targets)
        .context("Failed to start directory watchers")?;
    info!(targets = supervisor.len(), "All watchers running");

    tokio::select! {
        served = server_task => {
            supervisor.shutdown().await;
            served.context("Metrics server task failed")?
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            supervisor.shutdown().await;
            Ok(())
        }
    }
}
