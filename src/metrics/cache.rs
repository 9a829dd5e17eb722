//! Process-lifetime cache of metric instruments.
//!
//! Key metrics:
//! - rmq_actors_calls_total: Counter of observed calls
//! - rmq_actors_success_total: Counter of calls whose callable succeeded
//! - rmq_actors_failed_total: Counter of calls whose callable failed
//! - rmq_actors_latency_seconds: Histogram of call latency
//!
//! All four are labelled by `operation` and `queue`. Entries are never
//! evicted, so the set of (operation, queue) pairs must stay bounded.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

use super::data::{MetricData, MetricSnapshot};
use super::key::MetricKey;
use super::registry::MetricRegistry;
use crate::error::Result;

const LABELS: &[&str] = &["operation", "queue"];

/// Labelled metric families backing every [`MetricData`].
#[derive(Clone)]
pub struct MetricFamilies {
    total: IntCounterVec,
    success: IntCounterVec,
    failed: IntCounterVec,
    latency: HistogramVec,
}

impl MetricFamilies {
    /// Create the families without registering them anywhere.
    pub fn new() -> Result<Self> {
        Ok(Self {
            total: IntCounterVec::new(
                Opts::new("rmq_actors_calls_total", "Total number of observed calls"),
                LABELS,
            )?,
            success: IntCounterVec::new(
                Opts::new(
                    "rmq_actors_success_total",
                    "Observed calls whose callable succeeded",
                ),
                LABELS,
            )?,
            failed: IntCounterVec::new(
                Opts::new(
                    "rmq_actors_failed_total",
                    "Observed calls whose callable failed",
                ),
                LABELS,
            )?,
            latency: HistogramVec::new(
                HistogramOpts::new(
                    "rmq_actors_latency_seconds",
                    "Latency of observed calls, failures included",
                ),
                LABELS,
            )?,
        })
    }

    /// Register all four families with `registry`.
    ///
    /// All or nothing: if one family is rejected, the ones registered
    /// before it are unregistered again.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        for (registered, collector) in self.collectors().into_iter().enumerate() {
            if let Err(e) = registry.register(collector) {
                for earlier in self.collectors().into_iter().take(registered) {
                    if let Err(rollback) = registry.unregister(earlier) {
                        tracing::warn!(error = %rollback, "Failed to roll back metric family");
                    }
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn collectors(&self) -> Vec<Box<dyn Collector>> {
        vec![
            Box::new(self.total.clone()),
            Box::new(self.success.clone()),
            Box::new(self.failed.clone()),
            Box::new(self.latency.clone()),
        ]
    }

    /// Labelled instruments for one key.
    pub(crate) fn data_for(&self, key: &MetricKey) -> MetricData {
        let labels = [key.operation(), key.queue_name()];
        let labels = &labels[..];
        MetricData::new(
            self.total.with_label_values(labels),
            self.success.with_label_values(labels),
            self.failed.with_label_values(labels),
            self.latency.with_label_values(labels),
        )
    }
}

impl fmt::Debug for MetricFamilies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricFamilies").finish_non_exhaustive()
    }
}

/// Concurrent map from [`MetricKey`] to its [`MetricData`].
///
/// Sharded, so first-access inserts for one key only contend with keys
/// that hash to the same shard.
#[derive(Debug)]
pub struct MetricCache {
    families: MetricFamilies,
    entries: DashMap<MetricKey, Arc<MetricData>>,
}

impl MetricCache {
    /// Create a cache over the families shared by `registry`.
    ///
    /// Caches on one registry feed the same labelled series.
    pub fn new(registry: &MetricRegistry) -> Result<Self> {
        Ok(Self::with_families(registry.families()?))
    }

    /// Create a cache over already constructed families.
    pub fn with_families(families: MetricFamilies) -> Self {
        Self {
            families,
            entries: DashMap::new(),
        }
    }

    /// Existing entry for `key`, or a freshly inserted one.
    ///
    /// Creation holds the shard lock, so concurrent first calls for the
    /// same key all receive the single instance that won the insert.
    pub fn get_or_create(&self, key: MetricKey) -> Arc<MetricData> {
        if let Some(existing) = self.entries.get(&key) {
            return Arc::clone(existing.value());
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                tracing::debug!(
                    operation = entry.key().operation(),
                    queue = entry.key().queue_name(),
                    "Creating metric entry"
                );
                let data = Arc::new(self.families.data_for(entry.key()));
                entry.insert(Arc::clone(&data));
                data
            }
        }
    }

    /// Existing entry for `key`. Never creates.
    pub fn get(&self, key: &MetricKey) -> Option<Arc<MetricData>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every entry, ordered by key.
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        let mut snapshots: Vec<_> = self
            .entries
            .iter()
            .map(|entry| entry.value().snapshot(entry.key()))
            .collect();
        snapshots.sort_by(|a, b| {
            (&a.operation, &a.queue_name).cmp(&(&b.operation, &b.queue_name))
        });
        snapshots
    }
}
