//! Enablement policy for metric observers.
//!
//! Decides per call whether an operation on a queue is instrumented:
//! 1. no metric section configured: not instrumented
//! 2. `enabled_for_all`: instrumented
//! 3. otherwise: instrumented iff the queue is allow-listed
//!
//! The operation is accepted but not consulted.

use crate::config::MetricConfig;

/// Whether a call for `operation` on `queue_name` should record metrics.
///
/// Pure: reads `config` and nothing else, never allocates.
pub fn is_applicable(_operation: &str, queue_name: &str, config: Option<&MetricConfig>) -> bool {
    let Some(config) = config else {
        return false;
    };

    config.enabled_for_all || config.allowed_queues.contains(queue_name)
}
