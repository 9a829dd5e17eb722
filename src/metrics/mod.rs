//! Per-(operation, queue) metric bookkeeping.
//!
//! - [`MetricKey`]: identity a measurement is aggregated under
//! - [`MetricData`]: the total/success/failed counters and latency timer
//! - [`MetricCache`]: lazily populated map from key to data
//! - [`MetricRegistry`]: prometheus registry shared by observers

pub mod cache;
pub mod data;
pub mod key;
pub mod registry;

pub use cache::{MetricCache, MetricFamilies};
pub use data::{MetricData, MetricSnapshot, Outcome};
pub use key::MetricKey;
pub use registry::MetricRegistry;
