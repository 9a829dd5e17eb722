//! Configuration for metric observers.
//!
//! Supports:
//! - `MetricConfig`: the metric section of an actor configuration (serde)
//! - `MetricConfigHandle`: a shared, swappable snapshot read on every call
//! - `Config`: CLI arguments and environment overrides for the simulator

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::Result;
use crate::policy;

/// Metric section of the actor configuration.
///
/// A missing field deserializes to its disabled default, so an empty
/// object turns instrumentation off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricConfig {
    /// Record metrics for every operation on every queue.
    pub enabled_for_all: bool,
    /// Queues that are instrumented when `enabled_for_all` is off.
    pub allowed_queues: HashSet<String>,
}

impl MetricConfig {
    /// Config that instruments everything.
    pub fn enabled_for_all() -> Self {
        Self {
            enabled_for_all: true,
            ..Self::default()
        }
    }

    /// Config that instruments only the given queues.
    pub fn for_queues<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_queues: queues.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a metric section from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Shared handle to the current metric configuration.
///
/// Cloning is cheap and all clones observe the same snapshot. Updates are
/// visible to the next observed call; a call in flight keeps the decision
/// it made when it started.
#[derive(Debug, Clone)]
pub struct MetricConfigHandle {
    tx: Arc<watch::Sender<Option<MetricConfig>>>,
}

impl MetricConfigHandle {
    /// Create a handle with an initial snapshot.
    ///
    /// `None` means no metric section was configured.
    pub fn new(initial: Option<MetricConfig>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current snapshot.
    pub fn update(&self, config: Option<MetricConfig>) {
        tracing::info!(
            enabled_for_all = config.as_ref().is_some_and(|c| c.enabled_for_all),
            configured = config.is_some(),
            "Metric configuration updated"
        );
        self.tx.send_replace(config);
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> Option<MetricConfig> {
        self.tx.borrow().clone()
    }

    /// Receiver notified whenever the snapshot is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Option<MetricConfig>> {
        self.tx.subscribe()
    }

    /// Evaluate the enablement policy against the current snapshot.
    pub fn is_applicable(&self, operation: &str, queue_name: &str) -> bool {
        let current = self.tx.borrow();
        policy::is_applicable(operation, queue_name, current.as_ref())
    }
}

impl Default for MetricConfigHandle {
    fn default() -> Self {
        Self::new(None)
    }
}

impl From<MetricConfig> for MetricConfigHandle {
    fn from(config: MetricConfig) -> Self {
        Self::new(Some(config))
    }
}

/// Output format for the simulator's final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Prometheus text exposition format.
    Prometheus,
    /// JSON array of metric snapshots.
    Json,
}

/// rmq-observer: drive simulated publishers through a metric observer.
#[derive(Parser, Debug, Clone)]
#[command(name = "rmq-observer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of concurrent publishers
    #[arg(short, long, env = "RMQ_OBSERVER_PUBLISHERS", default_value_t = 4)]
    pub publishers: usize,

    /// Publish calls per publisher
    #[arg(short, long, env = "RMQ_OBSERVER_CALLS", default_value_t = 1000)]
    pub calls: usize,

    /// Destination queues, published to round-robin
    #[arg(
        short,
        long,
        env = "RMQ_OBSERVER_QUEUES",
        value_delimiter = ',',
        default_value = "default"
    )]
    pub queues: Vec<String>,

    /// Every Nth publish fails (0 disables failures)
    #[arg(long, env = "RMQ_OBSERVER_FAIL_EVERY", default_value_t = 10)]
    pub fail_every: usize,

    /// Record metrics for all queues
    #[arg(
        long,
        env = "RMQ_OBSERVER_ENABLED_FOR_ALL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub enabled_for_all: bool,

    /// Queues to record when metrics are not enabled for all
    #[arg(long, env = "RMQ_OBSERVER_ALLOWED_QUEUES", value_delimiter = ',')]
    pub allowed_queues: Vec<String>,

    /// Report format
    #[arg(long, env = "RMQ_OBSERVER_OUTPUT", value_enum, default_value_t = OutputFormat::Prometheus)]
    pub output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "RMQ_OBSERVER_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Metric section derived from the CLI flags.
    pub fn metric_config(&self) -> MetricConfig {
        MetricConfig {
            enabled_for_all: self.enabled_for_all,
            allowed_queues: self.allowed_queues.iter().cloned().collect(),
        }
    }

    /// Create a small configuration for testing.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            publishers: 2,
            calls: 10,
            queues: vec!["default".into()],
            fail_every: 5,
            enabled_for_all: false,
            allowed_queues: vec!["orders".into()],
            output: OutputFormat::Json,
            log_level: "debug".into(),
            log_json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_disabled() {
        let config = MetricConfig::from_json("{}").unwrap();
        assert_eq!(config, MetricConfig::default());
        assert!(!config.enabled_for_all);
    }

    #[test]
    fn test_camel_case_fields() {
        let config = MetricConfig::from_json(
            r#"{"enabledForAll": false, "allowedQueues": ["orders", "billing"]}"#,
        )
        .unwrap();
        assert!(!config.enabled_for_all);
        assert!(config.allowed_queues.contains("orders"));
        assert!(config.allowed_queues.contains("billing"));
    }

    #[test]
    fn test_malformed_json_is_error() {
        let result = MetricConfig::from_json(r#"{"enabledForAll": "yes"}"#);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_handle_update_is_visible_to_clones() {
        let handle = MetricConfigHandle::from(MetricConfig::default());
        let clone = handle.clone();
        assert!(!clone.is_applicable("PUBLISH", "default"));

        handle.update(Some(MetricConfig::enabled_for_all()));
        assert!(clone.is_applicable("PUBLISH", "default"));

        handle.update(None);
        assert!(!clone.is_applicable("PUBLISH", "default"));
        assert_eq!(clone.snapshot(), None);
    }

    #[test]
    fn test_subscribe_sees_updates() {
        let handle = MetricConfigHandle::default();
        let mut rx = handle.subscribe();
        handle.update(Some(MetricConfig::for_queues(["orders"])));
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, Some(MetricConfig::for_queues(["orders"])));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let config =
            MetricConfig::from_json(r#"{"enabledForAll": true, "allowedOperations": ["CONSUME"]}"#)
                .unwrap();
        assert!(config.enabled_for_all);
        assert!(config.allowed_queues.is_empty());
    }

    #[test]
    fn test_metric_config_from_cli() {
        let config = Config::test_config();
        let metric_config = config.metric_config();
        assert!(!metric_config.enabled_for_all);
        assert_eq!(metric_config, MetricConfig::for_queues(["orders"]));
    }

    #[test]
    fn test_cli_defaults() {
        let config = Config::try_parse_from(["rmq-observer"]).unwrap();
        assert_eq!(config.publishers, 4);
        assert_eq!(config.calls, 1000);
        assert_eq!(config.queues, vec!["default".to_string()]);
        assert!(config.enabled_for_all);
        assert_eq!(config.output, OutputFormat::Prometheus);
    }
}
