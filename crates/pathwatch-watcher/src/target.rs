//! Resolved watch targets

use pathwatch_config::WatcherConfig;
use pathwatch_metrics::{LabelSet, PATH_LABEL};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::formats::FormatSet;

/// One directory under observation, with its extension filter and label set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Human readable name, not required to be unique
    pub name: String,
    /// Directory root
    pub path: PathBuf,
    /// Accepted extensions
    pub formats: FormatSet,
    /// Fully resolved labels keying this target's series
    pub labels: LabelSet,
    /// Subscribe to nested directories as well as the root
    pub recursive: bool,
}

impl WatchTarget {
    /// Target labelled only with its path
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, formats: &str) -> Self {
        let path = path.into();
        let mut labels = LabelSet::new();
        labels.insert(PATH_LABEL, path.to_string_lossy());

        WatchTarget {
            name: name.into(),
            path,
            formats: FormatSet::parse(formats),
            labels,
            recursive: false,
        }
    }

    /// Add or override a label
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name, value);
        self
    }

    /// Subscribe to nested directories too
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Resolve a configured watcher
    ///
    /// The implicit `path` label comes first, then the configured label maps
    /// in order, so a configured `path` label or a later duplicate key wins.
    pub fn from_config(config: &WatcherConfig) -> Self {
        let mut target = WatchTarget::new(&config.name, &config.path, &config.format)
            .with_recursive(config.recursive);
        for (name, value) in config.labels.iter().flatten() {
            target.labels.insert(name.clone(), value.clone());
        }
        target
    }

    /// Union of label names across targets, the schema of the metrics store
    pub fn label_names<'a>(targets: impl IntoIterator<Item = &'a WatchTarget>) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = targets
            .into_iter()
            .flat_map(|target| target.labels.names().map(str::to_string))
            .collect();
        names.insert(PATH_LABEL.to_string());
        names
    }
}
