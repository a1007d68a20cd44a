use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;

/// Path reserved for the liveness probe served next to the metrics
pub const HEALTH_ENDPOINT: &str = "/health";

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, naming the first offending field
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.exporter.validate()?;
        for (index, watcher) in self.watcher.iter().enumerate() {
            watcher.validate().map_err(|e| match e {
                ConfigError::InvalidValue { field, reason } => {
                    ConfigError::invalid_value(format!("watcher[{}].{}", index, field), reason)
                }
                ConfigError::MissingRequired(field) => {
                    ConfigError::MissingRequired(format!("watcher[{}].{}", index, field))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

impl Validator for ExporterConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "exporter.port",
                "port must be between 1 and 65535",
            ));
        }

        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingRequired("exporter.endpoint".to_string()));
        }

        if !self.endpoint.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "exporter.endpoint",
                format!("must start with '/', got '{}'", self.endpoint),
            ));
        }

        if let Some(c) = self
            .endpoint
            .chars()
            .find(|c| matches!(c, '{' | '}' | '*' | ':' | '?' | '#'))
        {
            return Err(ConfigError::invalid_value(
                "exporter.endpoint",
                format!("'{}' may not appear in a route path", c),
            ));
        }

        if self.endpoint == HEALTH_ENDPOINT {
            return Err(ConfigError::invalid_value(
                "exporter.endpoint",
                format!("'{}' is reserved for the health check", HEALTH_ENDPOINT),
            ));
        }

        Ok(())
    }
}

impl Validator for WatcherConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.path.is_empty() {
            return Err(ConfigError::MissingRequired("path".to_string()));
        }

        for name in self.labels.iter().flat_map(|entry| entry.keys()) {
            if !is_valid_label_name(name) {
                return Err(ConfigError::invalid_value(
                    "labels",
                    format!("'{}' is not a valid metric label name", name),
                ));
            }
        }

        Ok(())
    }
}

/// Check a label name against the Prometheus data model
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("__")
}
