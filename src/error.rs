//! Error types for observer setup.
//!
//! Failures of the wrapped publish/consume callables never show up here;
//! they are handed back to the caller as the callable's own error type.

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while wiring observers together.
#[derive(Error, Debug)]
pub enum Error {
    /// Metric families could not be registered with the prometheus registry.
    #[error("metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    /// Metric configuration could not be parsed.
    #[error("invalid metric configuration: {0}")]
    Config(#[from] serde_json::Error),
}
