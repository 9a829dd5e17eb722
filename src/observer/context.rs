//! Call contexts handed to observers.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Message headers forwarded untouched to the wrapped publish call.
pub type Headers = HashMap<String, Value>;

/// Operations the actor framework routes through observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RmqOperation {
    Publish,
    PublishWithDelay,
    PublishWithExpiry,
    Consume,
}

impl RmqOperation {
    /// Name used as the `operation` part of a metric key.
    pub fn as_str(&self) -> &'static str {
        match self {
            RmqOperation::Publish => "PUBLISH",
            RmqOperation::PublishWithDelay => "PUBLISH_WITH_DELAY",
            RmqOperation::PublishWithExpiry => "PUBLISH_WITH_EXPIRY",
            RmqOperation::Consume => "CONSUME",
        }
    }
}

impl fmt::Display for RmqOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context of one publish attempt.
///
/// Operation is kept as a plain string so callers outside
/// [`RmqOperation`] can still be observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishObserverContext {
    pub operation: String,
    pub queue_name: String,
}

impl PublishObserverContext {
    /// Context for `operation` on `queue_name`.
    pub fn new(operation: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            queue_name: queue_name.into(),
        }
    }

    /// Context for a plain publish to `queue_name`.
    pub fn publish(queue_name: impl Into<String>) -> Self {
        Self::new(RmqOperation::Publish.as_str(), queue_name)
    }
}

/// Context of one message delivery to a consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeObserverContext {
    pub queue_name: String,
    pub redelivered: bool,
}

impl ConsumeObserverContext {
    /// Context for a first delivery from `queue_name`.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            redelivered: false,
        }
    }

    /// Mark the delivery as a redelivery.
    pub fn redelivered(mut self, redelivered: bool) -> Self {
        self.redelivered = redelivered;
        self
    }

    /// Operation name consume calls are keyed under.
    pub fn operation(&self) -> &'static str {
        RmqOperation::Consume.as_str()
    }
}
