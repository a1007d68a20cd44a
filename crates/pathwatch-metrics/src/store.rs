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
//! Metrics store binding watched-directory observations to Prometheus series

use prometheus::{proto::MetricFamily, Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::types::{LabelSet, SeriesValues};

/// Creation events ever observed with a matching extension
pub const FILE_COUNT_METRIC: &str = "path_watcher_total";
/// Bytes ever attributed to matching creation events
pub const FILE_SIZE_METRIC: &str = "path_watcher_size_total";
/// Matching files present at the last scan
pub const CURRENT_FILE_COUNT_METRIC: &str = "path_watcher_current_file_count";
/// Bytes of matching files present at the last scan
pub const CURRENT_FILE_SIZE_METRIC: &str = "path_watcher_current_file_size";

/// Label every series carries
pub const PATH_LABEL: &str = "path";

/// Process-wide store of the four watcher series
///
/// Cheap to clone; clones share the same registry. Every series is an atomic,
/// so writers from several watchers and readers from the endpoint never see a
/// torn value. There is no atomicity across series.
///
/// Prometheus vectors have a fixed label schema, so the store is created with
/// the union of label names used by all targets. A label set missing one of
/// those names exports it with an empty value, which Prometheus treats the
/// same as an absent label.
#[derive(Clone)]
pub struct MetricsStore {
    inner: Arc<MetricsStoreInner>,
}

struct MetricsStoreInner {
    registry: Registry,
    label_names: Vec<String>,
    file_count: IntCounterVec,
    file_size: IntCounterVec,
    current_file_count: IntGaugeVec,
    current_file_size: IntGaugeVec,
}

impl MetricsStore {
    /// Create a store whose series are keyed by `label_names` plus `path`
    pub fn new<I, S>(label_names: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = label_names.into_iter().map(Into::into).collect();
        names.insert(PATH_LABEL.to_string());
        let label_names: Vec<String> = names.into_iter().collect();
        let schema: Vec<&str> = label_names.iter().map(String::as_str).collect();

        let registry = Registry::new();

        let file_count = IntCounterVec::new(
            Opts::new(FILE_COUNT_METRIC, "Total number of files watched"),
            &schema,
        )?;
        registry.register(Box::new(file_count.clone()))?;

        let file_size = IntCounterVec::new(
            Opts::new(FILE_SIZE_METRIC, "Total size of files watched"),
            &schema,
        )?;
        registry.register(Box::new(file_size.clone()))?;

        let current_file_count = IntGaugeVec::new(
            Opts::new(
                CURRENT_FILE_COUNT_METRIC,
                "Current number of files in the watched directories",
            ),
            &schema,
        )?;
        registry.register(Box::new(current_file_count.clone()))?;

        let current_file_size = IntGaugeVec::new(
            Opts::new(
                CURRENT_FILE_SIZE_METRIC,
                "Current total size of files in the watched directories",
            ),
            &schema,
        )?;
        registry.register(Box::new(current_file_size.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsStoreInner {
                registry,
                label_names,
                file_count,
                file_size,
                current_file_count,
                current_file_size,
            }),
        })
    }

    /// Label names of the series schema, sorted
    pub fn label_names(&self) -> &[String] {
        &self.inner.label_names
    }

    /// Count one matching file creation of `size_bytes` bytes
    pub fn record_creation(&self, labels: &LabelSet, size_bytes: u64) {
        let Some(values) = self.label_values(labels) else {
            return;
        };

        match (
            self.inner.file_count.get_metric_with_label_values(&values),
            self.inner.file_size.get_metric_with_label_values(&values),
        ) {
            (Ok(count), Ok(size)) => {
                count.inc();
                size.inc_by(size_bytes);
                trace!(labels = %labels, size_bytes, "Recorded file creation");
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(labels = %labels, error = %e, "Failed to record file creation");
            }
        }
    }

    /// Overwrite the current-state gauges with a fresh scan result
    pub fn set_current(&self, labels: &LabelSet, count: u64, total_bytes: u64) {
        let Some(values) = self.label_values(labels) else {
            return;
        };

        match (
            self.inner.current_file_count.get_metric_with_label_values(&values),
            self.inner.current_file_size.get_metric_with_label_values(&values),
        ) {
            (Ok(count_gauge), Ok(size_gauge)) => {
                count_gauge.set(saturating_i64(count));
                size_gauge.set(saturating_i64(total_bytes));
                trace!(labels = %labels, count, total_bytes, "Updated current file gauges");
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(labels = %labels, error = %e, "Failed to update current file gauges");
            }
        }
    }

    /// Gather every series currently registered
    pub fn snapshot(&self) -> Vec<MetricFamily> {
        self.inner.registry.gather()
    }

    /// Render the snapshot in Prometheus text exposition format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.snapshot(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Read the four series for one label set
    ///
    /// Reading materialises zero-valued series for that label set if they did
    /// not exist yet. Returns `None` when the label set does not fit the schema.
    pub fn values(&self, labels: &LabelSet) -> Option<SeriesValues> {
        let values = self.label_values(labels)?;
        let inner = &self.inner;

        Some(SeriesValues {
            file_count: inner.file_count.get_metric_with_label_values(&values).ok()?.get(),
            file_size: inner.file_size.get_metric_with_label_values(&values).ok()?.get(),
            current_file_count: inner
                .current_file_count
                .get_metric_with_label_values(&values)
                .ok()?
                .get(),
            current_file_size: inner
                .current_file_size
                .get_metric_with_label_values(&values)
                .ok()?
                .get(),
        })
    }

    /// Map a label set onto the schema order, empty for missing names
    fn label_values<'a>(&'a self, labels: &'a LabelSet) -> Option<Vec<&'a str>> {
        if let Some(unknown) = labels
            .names()
            .find(|name| !self.inner.label_names.iter().any(|known| known == name))
        {
            warn!(
                labels = %labels,
                label = unknown,
                "Label is not part of the metrics schema, dropping update"
            );
            return None;
        }

        Some(
            self.inner
                .label_names
                .iter()
                .map(|name| labels.get(name).unwrap_or(""))
                .collect(),
        )
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
