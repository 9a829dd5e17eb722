//! Metric-recording observer.
//!
//! For every applicable call:
//! - times the wrapped callable, failures included
//! - bumps `total` and exactly one of `success` / `failed`
//! - hands back the callable's value, error or panic unchanged
//!
//! Calls the enablement policy rejects go straight to the next observer
//! and never touch the metric cache.

use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::context::{ConsumeObserverContext, PublishObserverContext};
use super::terminal::TerminalObserver;
use super::RmqObserver;
use crate::config::MetricConfigHandle;
use crate::error::Result;
use crate::metrics::{MetricCache, MetricData, MetricKey, MetricRegistry, Outcome};

/// Observer recording call volume, outcome and latency per
/// (operation, queue).
#[derive(Debug)]
pub struct MetricObserver<N = TerminalObserver> {
    config: MetricConfigHandle,
    metric_cache: MetricCache,
    next: N,
}

impl MetricObserver<TerminalObserver> {
    /// Create an observer at the end of a chain, recording into the
    /// families shared by `registry`.
    pub fn new(config: impl Into<MetricConfigHandle>, registry: &MetricRegistry) -> Result<Self> {
        Self::with_next(config, registry, TerminalObserver)
    }
}

impl<N: RmqObserver> MetricObserver<N> {
    /// Create an observer that delegates the call to `next`.
    pub fn with_next(
        config: impl Into<MetricConfigHandle>,
        registry: &MetricRegistry,
        next: N,
    ) -> Result<Self> {
        Ok(Self::from_parts(
            config.into(),
            MetricCache::new(registry)?,
            next,
        ))
    }

    /// Assemble an observer from an existing cache.
    pub fn from_parts(config: MetricConfigHandle, metric_cache: MetricCache, next: N) -> Self {
        Self {
            config,
            metric_cache,
            next,
        }
    }

    /// Cache of everything recorded so far.
    pub fn metric_cache(&self) -> &MetricCache {
        &self.metric_cache
    }

    /// Handle to the configuration consulted on every call.
    pub fn config(&self) -> &MetricConfigHandle {
        &self.config
    }

    /// The observer the call is delegated to.
    pub fn next(&self) -> &N {
        &self.next
    }

    fn observe<T, E>(
        &self,
        operation: &str,
        queue_name: &str,
        call: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        if !self.config.is_applicable(operation, queue_name) {
            return call();
        }

        let data = self
            .metric_cache
            .get_or_create(MetricKey::new(operation, queue_name));
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(call));
        complete(&data, operation, queue_name, start.elapsed(), result)
    }

    async fn observe_async<T, E, C>(
        &self,
        operation: &str,
        queue_name: &str,
        call: C,
    ) -> std::result::Result<T, E>
    where
        C: Future<Output = std::result::Result<T, E>>,
    {
        if !self.config.is_applicable(operation, queue_name) {
            return call.await;
        }

        let data = self
            .metric_cache
            .get_or_create(MetricKey::new(operation, queue_name));
        let start = Instant::now();
        let result = AssertUnwindSafe(call).catch_unwind().await;
        complete(&data, operation, queue_name, start.elapsed(), result)
    }
}

/// Record the outcome of a finished call, then resume whatever it produced.
fn complete<T, E>(
    data: &MetricData,
    operation: &str,
    queue_name: &str,
    elapsed: Duration,
    result: std::thread::Result<std::result::Result<T, E>>,
) -> std::result::Result<T, E> {
    let outcome = match &result {
        Ok(Ok(_)) => Outcome::Success,
        Ok(Err(_)) | Err(_) => Outcome::Failure,
    };
    data.record(outcome, elapsed);

    tracing::trace!(
        operation,
        queue = queue_name,
        ?outcome,
        latency_us = elapsed.as_micros() as u64,
        panicked = result.is_err(),
        "Recorded observed call"
    );

    result.unwrap_or_else(|payload| panic::resume_unwind(payload))
}

impl<N: RmqObserver> RmqObserver for MetricObserver<N> {
    fn execute_publish<I, T, E, F>(
        &self,
        context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(I) -> std::result::Result<T, E>,
    {
        self.observe(&context.operation, &context.queue_name, || {
            self.next.execute_publish(context, publish, input)
        })
    }

    fn execute_consume<T, E, F>(
        &self,
        context: &ConsumeObserverContext,
        consume: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.observe(context.operation(), &context.queue_name, || {
            self.next.execute_consume(context, consume)
        })
    }

    fn execute_publish_async<I, T, E, F, Fut>(
        &self,
        context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> impl Future<Output = std::result::Result<T, E>> + Send
    where
        I: Send,
        F: FnOnce(I) -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        async move {
            let call = self.next.execute_publish_async(context, publish, input);
            self.observe_async(&context.operation, &context.queue_name, call)
                .await
        }
    }

    fn execute_consume_async<T, E, F, Fut>(
        &self,
        context: &ConsumeObserverContext,
        consume: F,
    ) -> impl Future<Output = std::result::Result<T, E>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        async move {
            let call = self.next.execute_consume_async(context, consume);
            self.observe_async(context.operation(), &context.queue_name, call)
                .await
        }
    }
}
