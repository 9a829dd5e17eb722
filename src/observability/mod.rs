//! Logging infrastructure.
//!
//! Provides structured tracing for the simulator and tests. Metric
//! instruments live in [`crate::metrics`].

pub mod tracing;
