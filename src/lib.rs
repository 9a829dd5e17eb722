//! rmq-observer: metric-recording observers for message-queue actors.
//!
//! Wraps publish and consume calls, recording per (operation, queue)
//! call counts, success and failure counts and latency, without changing
//! what the wrapped call returns, fails with or panics with.
//!
//! # Architecture
//!
//! - **Policy-gated**: a pure enablement check runs on every call
//! - **Lazy**: instruments are created on the first applicable call per key
//! - **Lock-free recording**: prometheus atomics behind a sharded cache
//! - **Composable**: observers chain statically down to [`TerminalObserver`]
//!
//! # Modules
//!
//! - [`config`]: Metric configuration, swappable handle and CLI
//! - [`error`]: Setup errors
//! - [`metrics`]: Metric keys, instruments and cache
//! - [`observability`]: Tracing setup
//! - [`observer`]: Observer trait, contexts and implementations
//! - [`policy`]: Enablement policy
//!
//! # Example
//!
//! ```
//! use rmq_observer::{
//!     Headers, MetricConfig, MetricKey, MetricObserver, MetricRegistry, PublishObserverContext,
//!     RmqObserver,
//! };
//!
//! let registry = MetricRegistry::new();
//! let observer = MetricObserver::new(MetricConfig::enabled_for_all(), &registry).unwrap();
//! let context = PublishObserverContext::publish("default");
//!
//! let sent: Result<u32, String> = observer.execute_publish(&context, |_headers: Headers| Ok(1), Headers::new());
//! assert_eq!(sent, Ok(1));
//!
//! let data = observer.metric_cache().get(&MetricKey::new("PUBLISH", "default")).unwrap();
//! assert_eq!(data.success(), 1);
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // metrics::MetricKey is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod observer;
pub mod policy;

pub use config::{MetricConfig, MetricConfigHandle};
pub use error::{Error, Result};
pub use metrics::{MetricCache, MetricData, MetricKey, MetricRegistry, MetricSnapshot};
pub use observer::{
    ConsumeObserverContext, Headers, MetricObserver, PublishObserverContext, RmqObserver,
    RmqOperation, TerminalObserver,
};
