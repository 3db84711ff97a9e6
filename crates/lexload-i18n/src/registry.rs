//! Namespace → loader registry.

use crate::error::{LoadError, ResourceError, ResourceResult};
use crate::loader::ResourceLoader;
use dashmap::DashMap;
use lexload_common::{Bundle, COMMON_NAMESPACE};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A registered loader, shared between the registry and running fetches.
pub type SharedLoader = Arc<dyn ResourceLoader>;

/// Maps namespace names to the loader that knows how to fetch them.
pub struct LoaderRegistry {
    loaders: DashMap<String, SharedLoader>,
    reserved: String,
}

impl LoaderRegistry {
    /// Create an empty registry whose reserved namespace is `"common"`.
    pub fn new() -> Self {
        Self::with_reserved(COMMON_NAMESPACE)
    }

    /// Create an empty registry preserving `reserved` across [`clear_all`](Self::clear_all).
    pub fn with_reserved(reserved: impl Into<String>) -> Self {
        Self {
            loaders: DashMap::new(),
            reserved: reserved.into(),
        }
    }

    /// Registers `loader` for `namespace`, replacing (with a warning) any
    /// loader already registered for it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidArgument`] when `namespace` is empty
    /// or carries leading/trailing whitespace.
    pub fn register(&self, namespace: &str, loader: SharedLoader) -> ResourceResult<()> {
        if namespace.is_empty() || namespace.trim() != namespace {
            return Err(ResourceError::invalid_argument(
                format!("namespace must be a non-empty trimmed string, got {namespace:?}"),
                "namespace",
            ));
        }

        if self.loaders.insert(namespace.to_string(), loader).is_some() {
            warn!("Loader for namespace '{}' was already registered; overwriting", namespace);
        } else {
            debug!("Registered loader for namespace '{}'", namespace);
        }

        Ok(())
    }

    /// Registers an async closure as the loader for `namespace`.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_fn<F, Fut>(&self, namespace: &str, loader: F) -> ResourceResult<()>
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bundle, LoadError>> + Send + 'static,
    {
        self.register(namespace, Arc::new(loader))
    }

    /// Get the loader registered for `namespace`
    pub fn get(&self, namespace: &str) -> Option<SharedLoader> {
        self.loaders.get(namespace).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a loader is registered for `namespace`
    pub fn contains(&self, namespace: &str) -> bool {
        self.loaders.contains_key(namespace)
    }

    /// Names of all registered namespaces, in no particular order
    pub fn list(&self) -> Vec<String> {
        self.loaders.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Removes the loader for `namespace`, returning whether one was registered
    pub fn unregister(&self, namespace: &str) -> bool {
        self.loaders.remove(namespace).is_some()
    }

    /// Removes every registration except the reserved namespace.
    pub fn clear_all(&self) {
        let mut removed = 0usize;
        self.loaders.retain(|namespace, _| {
            let keep = *namespace == self.reserved;
            if !keep {
                removed += 1;
            }
            keep
        });
        info!(
            "Cleared {} loader registrations (kept '{}': {})",
            removed,
            self.reserved,
            self.loaders.contains_key(&self.reserved)
        );
    }

    /// Number of registered namespaces
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Whether no loader is registered
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// The namespace preserved by [`clear_all`](Self::clear_all)
    pub fn reserved(&self) -> &str {
        &self.reserved
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("namespaces", &self.list())
            .field("reserved", &self.reserved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexload_common::test_utils::bundle_fixtures::greeting_bundle;

    fn ok_loader() -> SharedLoader {
        Arc::new(|_ns: String, _lang: String| async { Ok::<_, LoadError>(greeting_bundle()) })
    }

    #[test]
    fn test_register_and_get() {
        let registry = LoaderRegistry::new();
        registry.register("foo", ok_loader()).unwrap();

        assert!(registry.get("foo").is_some());
        assert!(registry.get("bar").is_none());
        assert_eq!(registry.list(), vec!["foo".to_string()]);
    }

    #[test]
    fn test_register_rejects_bad_namespace() {
        let registry = LoaderRegistry::new();

        for bad in ["", " ", " foo", "foo\n"] {
            let err = registry.register(bad, ok_loader()).unwrap_err();
            assert!(matches!(err, ResourceError::InvalidArgument { .. }), "{bad:?}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_all_keeps_common() {
        let registry = LoaderRegistry::new();
        registry.register("common", ok_loader()).unwrap();
        registry.register("foo", ok_loader()).unwrap();

        registry.clear_all();

        assert!(registry.contains("common"));
        assert!(!registry.contains("foo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_all_without_common() {
        let registry = LoaderRegistry::new();
        registry.register("foo", ok_loader()).unwrap();

        registry.clear_all();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_all_races_with_register() {
        let registry = LoaderRegistry::new();
        registry.register("common", ok_loader()).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..2_000 {
                    registry.register(&format!("ns{}", i % 50), ok_loader()).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..2_000 {
                    registry.clear_all();
                }
            });
        });

        registry.clear_all();
        assert_eq!(registry.list(), vec!["common".to_string()]);
    }

    #[test]
    fn test_unregister() {
        let registry = LoaderRegistry::new();
        registry.register("foo", ok_loader()).unwrap();

        assert!(registry.unregister("foo"));
        assert!(!registry.unregister("foo"));
    }
}
