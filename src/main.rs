//! rmq-observer: drive simulated publishers through a metric observer.
//!
//! # Usage
//!
//! ```bash
//! rmq-observer --publishers 8 --calls 500 --queues orders,billing --fail-every 20
//! ```
//!
//! Environment variables can also be used:
//! - `RMQ_OBSERVER_PUBLISHERS`: Number of concurrent publishers
//! - `RMQ_OBSERVER_QUEUES`: Comma-separated destination queues
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use prometheus::{Encoder, TextEncoder};
use rmq_observer::config::{Config, OutputFormat};
use rmq_observer::observability::tracing::init_tracing;
use rmq_observer::{
    ConsumeObserverContext, Headers, MetricObserver, MetricRegistry, PublishObserverContext,
    RmqObserver,
};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;

/// Failure returned by the simulated broker.
#[derive(Debug, thiserror::Error)]
#[error("broker rejected message {sequence} on queue {queue}")]
struct PublishRejected {
    sequence: usize,
    queue: String,
}

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  rmq-observer v{}

  Configuration:
    Publishers:      {}
    Calls/publisher: {}
    Queues:          {}
    Fail every:      {}
    Enabled for all: {}

  Press Ctrl+C to stop early and print the report.
"#,
        version,
        config.publishers,
        config.calls,
        config.queues.join(","),
        config.fail_every,
        config.enabled_for_all
    );
}

/// Stand-in for a broker round trip.
async fn simulated_publish(
    sequence: usize,
    queue: String,
    fail_every: usize,
    _headers: Headers,
) -> Result<usize, PublishRejected> {
    tokio::task::yield_now().await;
    if fail_every > 0 && sequence % fail_every == 0 {
        return Err(PublishRejected { sequence, queue });
    }
    Ok(sequence)
}

/// Run one publisher until it has sent `config.calls` messages or shutdown is signalled.
async fn run_publisher(
    id: usize,
    observer: Arc<MetricObserver>,
    config: Arc<Config>,
    shutdown_rx: watch::Receiver<bool>,
) -> (usize, usize) {
    let mut sent = 0;
    let mut rejected = 0;

    for call in 1..=config.calls {
        let stopping = *shutdown_rx.borrow();
        if stopping {
            break;
        }

        let queue = config.queues[(id + call) % config.queues.len()].clone();
        let publish_context = PublishObserverContext::publish(queue.clone());
        let mut headers = Headers::new();
        headers.insert("publisher".into(), serde_json::json!(id));

        let fail_every = config.fail_every;
        let outcome = observer
            .execute_publish_async(
                &publish_context,
                move |headers| simulated_publish(call, queue, fail_every, headers),
                headers,
            )
            .await;

        match outcome {
            Ok(_) => {
                sent += 1;
                let consume_context = ConsumeObserverContext::new(&publish_context.queue_name);
                let consumed = observer
                    .execute_consume_async(&consume_context, || async {
                        tokio::task::yield_now().await;
                        Ok::<_, PublishRejected>(())
                    })
                    .await;
                if let Err(e) = consumed {
                    tracing::debug!(publisher = id, error = %e, "Consume failed");
                }
            }
            Err(e) => {
                rejected += 1;
                tracing::debug!(publisher = id, error = %e, "Publish rejected");
            }
        }
    }

    (sent, rejected)
}

/// Wait for Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received Ctrl+C, stopping publishers..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping publishers..."),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                ctrl_c.await;
                tracing::info!("Received Ctrl+C, stopping publishers...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Received Ctrl+C, stopping publishers...");
    }
}

/// Write the final report to stdout.
fn write_report(
    config: &Config,
    observer: &MetricObserver,
    registry: &MetricRegistry,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match config.output {
        OutputFormat::Prometheus => {
            let mut buffer = Vec::new();
            TextEncoder::new()
                .encode(&registry.registry().gather(), &mut buffer)
                .context("failed to encode metrics")?;
            stdout.write_all(&buffer)?;
        }
        OutputFormat::Json => {
            let snapshot = observer.metric_cache().snapshot();
            serde_json::to_writer_pretty(&mut stdout, &snapshot)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();
    anyhow::ensure!(!config.queues.is_empty(), "at least one queue is required");

    // Initialize tracing/logging
    init_tracing(&config.log_level, config.log_json);

    // Print startup banner
    print_banner(&config);

    let registry = MetricRegistry::new();
    let observer = Arc::new(
        MetricObserver::new(config.metric_config(), &registry)
            .context("failed to create metric observer")?,
    );
    let config = Arc::new(config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let handles: Vec<_> = (0..config.publishers)
        .map(|id| {
            tokio::spawn(run_publisher(
                id,
                Arc::clone(&observer),
                Arc::clone(&config),
                shutdown_rx.clone(),
            ))
        })
        .collect();

    let mut sent = 0;
    let mut rejected = 0;
    for handle in handles {
        let (s, r) = handle.await.context("publisher task failed")?;
        sent += s;
        rejected += r;
    }

    tracing::info!(
        sent,
        rejected,
        keys = observer.metric_cache().len(),
        "Simulation complete"
    );

    write_report(&config, &observer, &registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rmq_observer::MetricKey;

    fn config(args: &[&str]) -> Arc<Config> {
        let args = std::iter::once("rmq-observer").chain(args.iter().copied());
        Arc::new(Config::try_parse_from(args).unwrap())
    }

    fn observer() -> Arc<MetricObserver> {
        let config = rmq_observer::MetricConfig::enabled_for_all();
        Arc::new(MetricObserver::new(config, &MetricRegistry::new()).unwrap())
    }

    #[tokio::test]
    async fn test_publisher_consumes_every_sent_message() {
        let config = config(&["--calls", "10", "--fail-every", "5", "--queues", "orders"]);
        let observer = observer();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let (sent, rejected) = run_publisher(0, Arc::clone(&observer), config, shutdown_rx).await;

        assert_eq!((sent, rejected), (8, 2));
        let cache = observer.metric_cache();
        let published = cache.get(&MetricKey::new("PUBLISH", "orders")).unwrap();
        assert_eq!((published.success(), published.failed()), (8, 2));
        let consumed = cache.get(&MetricKey::new("CONSUME", "orders")).unwrap();
        assert_eq!((consumed.success(), consumed.failed()), (8, 0));
    }

    #[tokio::test]
    async fn test_publisher_stops_on_shutdown() {
        let config = config(&["--calls", "10"]);
        let observer = observer();
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        let (sent, rejected) = run_publisher(0, Arc::clone(&observer), config, shutdown_rx).await;

        assert_eq!((sent, rejected), (0, 0));
        assert!(observer.metric_cache().is_empty());
    }
}
