//! Observers wrapped around publish and consume calls.
//!
//! Observers form a statically typed chain: each one decides what to do
//! around the call and hands the callable to its `next` observer, ending
//! at [`TerminalObserver`], which invokes it.

use std::future::Future;

pub mod context;
pub mod metric;
pub mod terminal;

pub use context::{ConsumeObserverContext, Headers, PublishObserverContext, RmqOperation};
pub use metric::MetricObserver;
pub use terminal::TerminalObserver;

/// Hook around publish and consume calls.
///
/// Implementations must hand back exactly what the callable produced,
/// including its error value and any panic.
pub trait RmqObserver: Send + Sync {
    /// Run `publish(input)` under this observer.
    fn execute_publish<I, T, E, F>(
        &self,
        context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> Result<T, E>
    where
        F: FnOnce(I) -> Result<T, E>;

    /// Run `consume()` under this observer.
    fn execute_consume<T, E, F>(&self, context: &ConsumeObserverContext, consume: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>;

    /// Async form of [`RmqObserver::execute_publish`].
    fn execute_publish_async<I, T, E, F, Fut>(
        &self,
        context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        I: Send,
        F: FnOnce(I) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;

    /// Async form of [`RmqObserver::execute_consume`].
    fn execute_consume_async<T, E, F, Fut>(
        &self,
        context: &ConsumeObserverContext,
        consume: F,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;
}
