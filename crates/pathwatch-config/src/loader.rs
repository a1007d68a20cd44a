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
use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;
use crate::validation::Validator;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    ///
    /// `.json` and `.toml` select those formats; any other extension, or
    /// none at all, is read as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
            ConfigFormat::Toml => "TOML",
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path);
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };

        debug!(
            watchers = config.watcher.len(),
            "Configuration parsed from {}",
            format.name()
        );

        if self.validate {
            config.validate()?;
            debug!("Configuration validated successfully");
        }

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// Overrides are applied before validation so an override cannot sneak an
    /// invalid value past the validator.
    pub async fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let mut config = Self::without_validation().load_file(path).await?;
        self.apply_env_overrides(&mut config)?;

        if self.validate {
            config.validate()?;
            debug!("Configuration validated successfully");
        }

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        if let Ok(value) = std::env::var("PATHWATCH_EXPORTER_PORT") {
            config.exporter.port = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "PATHWATCH_EXPORTER_PORT",
                    &value,
                    "expected valid port number (1-65535)",
                )
            })?;
        }
        if let Ok(value) = std::env::var("PATHWATCH_EXPORTER_ENDPOINT") {
            config.exporter.endpoint = value;
        }
        if let Ok(value) = std::env::var("PATHWATCH_LOG_PATH") {
            config.log_path = value;
        }
        if let Ok(value) = std::env::var("PATHWATCH_LOG_LEVEL") {
            config.log_level = Some(value);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("config.yaml"), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.yml"), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.json"), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path("config.toml"), ConfigFormat::Toml);
    }

    #[test]
    fn test_format_detection_falls_back_to_yaml() {
        assert_eq!(ConfigFormat::from_path("config.conf"), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("/etc/pathwatch/config"), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(".pathwatch"), ConfigFormat::Yaml);
    }

    #[test]
    fn test_missing_exporter_section_rejected() {
        let loader = ConfigLoader::new();
        let yaml = "log_path: \"\"\nwatcher: []\n";
        let result = loader.load_from_string(yaml, ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::MissingRequired(field)) if field == "exporter.endpoint"));
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let loader = ConfigLoader::new();
        let yaml = "exporter:\n  port: 9100\nwatcher: []\n";
        assert!(matches!(
            loader.load_from_string(yaml, ConfigFormat::Yaml),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_parse_yaml() {
        let loader = ConfigLoader::new();
        let yaml = r#"exporter:
  port: 9100
  endpoint: /metrics
log_path: /var/log/pathwatch.log
watcher:
  - name: incoming
    path: /data/incoming
    format: "csv, json"
    labels:
      - project: billing
      - app_name: ingest"#;
        let config = loader.load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.exporter.port, 9100);
        assert_eq!(config.watcher.len(), 1);
        assert_eq!(config.watcher[0].format, "csv, json");
        assert_eq!(config.watcher[0].labels.len(), 2);
        assert!(!config.watcher[0].recursive);
    }

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new();
        let json = r#"
        {
            "exporter": { "port": 9100, "endpoint": "/metrics" },
            "log_path": "",
            "watcher": [
                { "name": "a", "path": "/tmp/a", "format": "txt", "recursive": true }
            ]
        }
        "#;
        let config = loader.load_from_string(json, ConfigFormat::Json).unwrap();
        assert!(config.watcher[0].recursive);
        assert!(config.watcher[0].labels.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new();
        let toml = r#"
        log_path = ""

        [exporter]
        port = 9100
        endpoint = "/metrics"

        [[watcher]]
        name = "a"
        path = "/tmp/a"
        format = "log"
        labels = [{ team = "ops" }]
        "#;
        let config = loader.load_from_string(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.watcher[0].labels[0]["team"], "ops");
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let loader = ConfigLoader::new();
        let yaml = "exporter:\n  port: 9100\n  endpoint: \"\"\n";
        assert!(loader.load_from_string(yaml, ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_loader_without_validation() {
        let loader = ConfigLoader::without_validation();
        let yaml = "exporter:\n  port: 9100\n  endpoint: \"\"\n";
        let config = loader.load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.exporter.endpoint.is_empty());
    }

    #[test]
    fn test_malformed_yaml() {
        let loader = ConfigLoader::new();
        let result = loader.load_from_string("exporter: [unclosed", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::YamlParseError(_))));
    }
}
