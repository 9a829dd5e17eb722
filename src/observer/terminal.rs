//! End of every observer chain.

use std::future::Future;

use super::context::{ConsumeObserverContext, PublishObserverContext};
use super::RmqObserver;

/// Observer that only invokes the wrapped callable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalObserver;

impl RmqObserver for TerminalObserver {
    fn execute_publish<I, T, E, F>(
        &self,
        _context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> Result<T, E>
    where
        F: FnOnce(I) -> Result<T, E>,
    {
        publish(input)
    }

    fn execute_consume<T, E, F>(&self, _context: &ConsumeObserverContext, consume: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        consume()
    }

    fn execute_publish_async<I, T, E, F, Fut>(
        &self,
        _context: &PublishObserverContext,
        publish: F,
        input: I,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        I: Send,
        F: FnOnce(I) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        async move { publish(input).await }
    }

    fn execute_consume_async<T, E, F, Fut>(
        &self,
        _context: &ConsumeObserverContext,
        consume: F,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        async move { consume().await }
    }
}
