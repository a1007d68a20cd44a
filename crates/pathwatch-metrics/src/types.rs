//! Common types for metrics collection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Configuration for the metrics server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Port for metrics HTTP server (0 picks a free port)
    pub port: u16,

    /// HTTP path serving the exposition text
    pub endpoint: String,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 2012,
            endpoint: "/metrics".to_string(),
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create new config with port and endpoint
    pub fn new(port: u16, endpoint: impl Into<String>) -> Self {
        Self {
            port,
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Override the bind address
    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = bind_address.into();
        self
    }

    /// Get bind address with port
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Label name to value mapping keying one series of every metric
///
/// Ordered so that two sets with the same entries compare, hash and print
/// identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, returning the previous value for that name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Value of a label
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Label names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Label pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}=\"{}\"", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Point-in-time values of the four series for one label set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesValues {
    /// Matching creation events ever observed
    pub file_count: u64,
    /// Bytes attributed to matching creation events
    pub file_size: u64,
    /// Matching files present at the last scan
    pub current_file_count: i64,
    /// Bytes of matching files present at the last scan
    pub current_file_size: i64,
}
