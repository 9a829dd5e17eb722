//! Instruments recorded for one metric key.

use prometheus::{Histogram, IntCounter};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::key::MetricKey;

/// How an observed call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The callable returned `Ok`.
    Success,
    /// The callable returned `Err` or panicked.
    Failure,
}

/// Counters and latency timer for one [`MetricKey`].
///
/// Instruments are lock-free prometheus atomics, so concurrent calls for
/// the same key never serialize on each other. Reads are exposed here;
/// writes only happen through [`MetricData::record`] from an observer.
pub struct MetricData {
    total: IntCounter,
    success: IntCounter,
    failed: IntCounter,
    timer: Histogram,
}

impl MetricData {
    pub(crate) fn new(
        total: IntCounter,
        success: IntCounter,
        failed: IntCounter,
        timer: Histogram,
    ) -> Self {
        Self {
            total,
            success,
            failed,
            timer,
        }
    }

    /// Record one completed call.
    ///
    /// Exactly one timer sample and one total increment per call; the
    /// outcome picks which of success/failed is bumped.
    pub(crate) fn record(&self, outcome: Outcome, elapsed: Duration) {
        self.timer.observe(elapsed.as_secs_f64());
        self.total.inc();
        match outcome {
            Outcome::Success => self.success.inc(),
            Outcome::Failure => self.failed.inc(),
        }
    }

    /// Completed calls.
    pub fn total(&self) -> u64 {
        self.total.get()
    }

    /// Calls whose callable succeeded.
    pub fn success(&self) -> u64 {
        self.success.get()
    }

    /// Calls whose callable failed.
    pub fn failed(&self) -> u64 {
        self.failed.get()
    }

    /// Number of latency samples.
    pub fn timer_count(&self) -> u64 {
        self.timer.get_sample_count()
    }

    /// Sum of latency samples in seconds.
    pub fn timer_sum_seconds(&self) -> f64 {
        self.timer.get_sample_sum()
    }

    /// Point-in-time copy of all instruments.
    pub fn snapshot(&self, key: &MetricKey) -> MetricSnapshot {
        MetricSnapshot {
            operation: key.operation().to_string(),
            queue_name: key.queue_name().to_string(),
            total: self.total(),
            success: self.success(),
            failed: self.failed(),
            timer_count: self.timer_count(),
            timer_sum_seconds: self.timer_sum_seconds(),
        }
    }
}

impl fmt::Debug for MetricData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricData")
            .field("total", &self.total())
            .field("success", &self.success())
            .field("failed", &self.failed())
            .field("timer_count", &self.timer_count())
            .finish()
    }
}

/// Serializable copy of one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub operation: String,
    pub queue_name: String,
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub timer_count: u64,
    pub timer_sum_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricFamilies;

    fn data() -> MetricData {
        MetricFamilies::new()
            .unwrap()
            .data_for(&MetricKey::new("PUBLISH", "default"))
    }

    #[test]
    fn test_new_data_is_zero() {
        let data = data();
        assert_eq!(data.total(), 0);
        assert_eq!(data.success(), 0);
        assert_eq!(data.failed(), 0);
        assert_eq!(data.timer_count(), 0);
    }

    #[test]
    fn test_record_success() {
        let data = data();
        data.record(Outcome::Success, Duration::from_millis(5));
        assert_eq!(data.total(), 1);
        assert_eq!(data.success(), 1);
        assert_eq!(data.failed(), 0);
        assert_eq!(data.timer_count(), 1);
        assert!((data.timer_sum_seconds() - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_record_failure() {
        let data = data();
        data.record(Outcome::Failure, Duration::from_millis(1));
        data.record(Outcome::Success, Duration::from_millis(1));
        assert_eq!(data.total(), 2);
        assert_eq!(data.success(), 1);
        assert_eq!(data.failed(), 1);
        assert_eq!(data.timer_count(), 2);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let key = MetricKey::new("PUBLISH", "default");
        let data = data();
        data.record(Outcome::Success, Duration::ZERO);

        let json = serde_json::to_value(data.snapshot(&key)).unwrap();
        assert_eq!(json["operation"], "PUBLISH");
        assert_eq!(json["queueName"], "default");
        assert_eq!(json["total"], 1);
        assert_eq!(json["timerCount"], 1);
    }
}
