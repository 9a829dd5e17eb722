//! Shared registry handle for observers.
//!
//! Every observer built on one [`MetricRegistry`] records into the same
//! metric families, registered with the underlying prometheus registry
//! on first use.

use prometheus::Registry;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::cache::MetricFamilies;
use crate::error::Result;

/// Cheap-to-clone handle pairing a prometheus registry with the metric
/// families registered on it.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    registry: Registry,
    families: Mutex<Option<MetricFamilies>>,
}

impl MetricRegistry {
    /// Handle over a fresh prometheus registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle over an existing prometheus registry.
    ///
    /// The families must not already be registered on `registry` by
    /// another handle.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                registry,
                families: Mutex::new(None),
            }),
        }
    }

    /// The underlying prometheus registry, for gathering.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Families registered on this registry, registering them on first call.
    ///
    /// A failed registration leaves nothing behind, so a later call can
    /// retry.
    pub fn families(&self) -> Result<MetricFamilies> {
        let mut families = self
            .inner
            .families
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = families.as_ref() {
            return Ok(existing.clone());
        }

        let created = MetricFamilies::new()?;
        created.register(&self.inner.registry)?;
        tracing::debug!("Registered observer metric families");
        *families = Some(created.clone());
        Ok(created)
    }
}

impl From<Registry> for MetricRegistry {
    fn from(registry: Registry) -> Self {
        Self::with_registry(registry)
    }
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricKey, Outcome};
    use prometheus::IntCounter;
    use std::time::Duration;

    #[test]
    fn test_families_are_registered_once() {
        let registry = MetricRegistry::new();
        let first = registry.families().unwrap();
        let second = registry.clone().families().unwrap();

        let key = MetricKey::new("PUBLISH", "default");
        first.data_for(&key).record(Outcome::Success, Duration::ZERO);
        assert_eq!(second.data_for(&key).total(), 1);
    }

    #[test]
    fn test_failed_registration_can_be_retried() {
        let prometheus_registry = Registry::new();
        let conflict = IntCounter::new("rmq_actors_failed_total", "conflicting").unwrap();
        prometheus_registry
            .register(Box::new(conflict.clone()))
            .unwrap();

        let registry = MetricRegistry::with_registry(prometheus_registry);
        assert!(matches!(
            registry.families(),
            Err(crate::Error::Registry(_))
        ));

        registry
            .registry()
            .unregister(Box::new(conflict))
            .unwrap();
        assert!(registry.families().is_ok());
    }
}
