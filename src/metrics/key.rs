//! Metric identity.

/// Identity under which publish/consume measurements are aggregated.
///
/// Equality and hashing are structural over both fields.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct MetricKey {
    operation: String,
    queue_name: String,
}

impl MetricKey {
    /// Create a key for an operation on a queue.
    pub fn new(operation: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            queue_name: queue_name.into(),
        }
    }

    /// Logical operation name, e.g. `PUBLISH`.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Destination queue.
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = MetricKey::new("PUBLISH", "default");
        let b = MetricKey::new(String::from("PUBLISH"), String::from("default"));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_fields_are_not_interchangeable() {
        let a = MetricKey::new("PUBLISH", "default");
        let b = MetricKey::new("default", "PUBLISH");
        assert_ne!(a, b);
    }

    #[test]
    fn test_accessors() {
        let key = MetricKey::new("CONSUME", "orders");
        assert_eq!(key.operation(), "CONSUME");
        assert_eq!(key.queue_name(), "orders");
    }
}
