//! Shared helpers for observer tests.
//!
//! Provides:
//! - Observer construction over a fresh registry
//! - Stand-in publish callables
//! - Metric assertions

#![allow(dead_code)]

use prometheus::{Encoder, TextEncoder};
use rmq_observer::{Headers, MetricConfig, MetricData, MetricKey, MetricObserver, MetricRegistry};

/// Failure raised by the stand-in publish callables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("publish failed: {0}")]
pub struct PublishFailed(pub String);

/// Observer plus the registry its families were registered with.
pub struct TestObserver {
    pub observer: MetricObserver,
    pub registry: MetricRegistry,
}

impl TestObserver {
    /// Create an observer over a fresh registry.
    pub fn new(config: MetricConfig) -> Self {
        Self::on_registry(config, MetricRegistry::new())
    }

    /// Create an observer recording into an existing registry.
    pub fn on_registry(config: MetricConfig, registry: MetricRegistry) -> Self {
        rmq_observer::observability::tracing::init_test_tracing();
        let observer = MetricObserver::new(config, &registry).expect("failed to create observer");
        Self { observer, registry }
    }

    /// Entry for `(operation, queue)`, if one was created.
    pub fn data(&self, operation: &str, queue: &str) -> Option<std::sync::Arc<MetricData>> {
        self.observer
            .metric_cache()
            .get(&MetricKey::new(operation, queue))
    }

    /// Registry contents in Prometheus text format.
    pub fn exposition(&self) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.registry().gather(), &mut buffer)
            .expect("failed to encode metrics");
        String::from_utf8(buffer).expect("exposition is not utf-8")
    }
}

/// Publish callable that always succeeds with 1.
pub fn terminate(_headers: Headers) -> Result<i32, PublishFailed> {
    Ok(1)
}

/// Publish callable that always fails.
pub fn terminate_with_error(_headers: Headers) -> Result<i32, PublishFailed> {
    Err(PublishFailed("connection reset".into()))
}

/// Assert every instrument of `data` after `success` + `failed` calls.
pub fn assert_metrics(data: &MetricData, success: u64, failed: u64) {
    assert_eq!(data.total(), success + failed, "total");
    assert_eq!(data.timer_count(), success + failed, "timer count");
    assert_eq!(data.success(), success, "success");
    assert_eq!(data.failed(), failed, "failed");
}
