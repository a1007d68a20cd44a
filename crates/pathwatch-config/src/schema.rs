use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Metrics endpoint settings
    pub exporter: ExporterConfig,

    /// Log file location. Empty means log to stderr.
    pub log_path: String,

    /// Log level filter (e.g. "info", "pathwatch_watcher=debug").
    /// Falls back to `RUST_LOG`, then "info".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Watched directories
    pub watcher: Vec<WatcherConfig>,
}

impl Config {
    /// Sample configuration printed by `--print-config`
    pub fn sample() -> Self {
        Config {
            exporter: ExporterConfig {
                port: 2012,
                endpoint: "/metric".to_string(),
            },
            log_path: "path/to/your/logfile.log".to_string(),
            log_level: None,
            watcher: vec![
                WatcherConfig {
                    name: "test".to_string(),
                    path: "/mnt/extra/dir1".to_string(),
                    format: "all".to_string(),
                    labels: vec![label("path", "test"), label("name", "test")],
                    recursive: false,
                },
                WatcherConfig {
                    name: "test2".to_string(),
                    path: "/mnt/extra/dir2".to_string(),
                    format: "py, csv".to_string(),
                    labels: vec![label("project", "myProj"), label("app_name", "app1")],
                    recursive: false,
                },
            ],
        }
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn label(key: &str, value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(key.to_string(), value.to_string())])
}

/// Metrics endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExporterConfig {
    /// Port the HTTP endpoint listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP path serving the metrics (e.g. "/metrics"). Required.
    #[serde(default)]
    pub endpoint: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        ExporterConfig {
            port: default_port(),
            endpoint: String::new(),
        }
    }
}

/// One watched directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherConfig {
    /// Human readable name, not required to be unique
    #[serde(default)]
    pub name: String,

    /// Directory root to watch
    pub path: String,

    /// Comma-separated file extensions without the leading dot
    #[serde(default)]
    pub format: String,

    /// Sequence of single-entry label maps; later entries win on collision
    #[serde(default)]
    pub labels: Vec<BTreeMap<String, String>>,

    /// Subscribe to notifications from nested directories too
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
}

fn default_port() -> u16 {
    2012
}

fn is_false(value: &bool) -> bool {
    !*value
}
