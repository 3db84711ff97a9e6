//! Process-wide home of the loader registry and the resource cache.

use crate::cache::ResourceCache;
use crate::coordinator::ResourceCoordinator;
use crate::engine::BundleEngine;
use crate::registry::LoaderRegistry;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

static GLOBAL_STORE: OnceCell<Arc<ResourceStore>> = OnceCell::new();

/// Owns the registry and cache shared by every coordinator.
///
/// Construct one per test for isolation, or install one process-wide with
/// [`init_global`](Self::init_global).
#[derive(Debug, Default)]
pub struct ResourceStore {
    registry: Arc<LoaderRegistry>,
    cache: Arc<ResourceCache>,
}

impl ResourceStore {
    /// Create an empty store reserving the `"common"` namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store reserving `namespace` in its registry
    pub fn with_reserved_namespace(namespace: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(LoaderRegistry::with_reserved(namespace)),
            cache: Arc::new(ResourceCache::new()),
        }
    }

    /// Installs `store` as the process-wide store.
    ///
    /// # Errors
    ///
    /// Returns the already-installed store if there is one.
    pub fn init_global(store: Self) -> Result<Arc<Self>, Arc<Self>> {
        let store = Arc::new(store);
        match GLOBAL_STORE.set(Arc::clone(&store)) {
            Ok(()) => Ok(store),
            Err(_) => Err(Self::global()),
        }
    }

    /// The process-wide store, created empty on first use
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_STORE.get_or_init(|| Arc::new(Self::new())))
    }

    /// The loader registry
    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.registry
    }

    /// The resource cache
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// A coordinator over this store's registry and cache
    pub fn coordinator(&self, engine: Arc<dyn BundleEngine>) -> Arc<ResourceCoordinator> {
        Arc::new(ResourceCoordinator::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.cache),
            engine,
        ))
    }

    /// Empties the cache and every registration except the reserved namespace
    pub fn clear(&self) {
        self.cache.clear_all();
        self.registry.clear_all();
        info!("Cleared resource store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::error::LoadError;
    use lexload_common::test_utils::bundle_fixtures::greeting_bundle;
    use lexload_common::CacheKey;

    #[tokio::test]
    async fn test_coordinators_share_the_store() {
        let store = ResourceStore::new();
        store
            .registry()
            .register_fn("foo", |_, _| async { Ok::<_, LoadError>(greeting_bundle()) })
            .unwrap();

        let first = store.coordinator(Arc::new(MemoryEngine::new("en")));
        let second = store.coordinator(Arc::new(MemoryEngine::new("en")));

        first.ensure_resource_loaded("foo", "en").await.unwrap();
        assert!(second.cache().is_cached(&CacheKey::new("foo", "en")));
    }

    #[test]
    fn test_clear_keeps_reserved() {
        let store = ResourceStore::with_reserved_namespace("core");
        store
            .registry()
            .register_fn("core", |_, _| async { Ok::<_, LoadError>(greeting_bundle()) })
            .unwrap();
        store
            .registry()
            .register_fn("foo", |_, _| async { Ok::<_, LoadError>(greeting_bundle()) })
            .unwrap();

        store.clear();

        assert_eq!(store.registry().list(), vec!["core".to_string()]);
    }

    #[test]
    fn test_global_is_singleton() {
        let a = ResourceStore::global();
        let b = ResourceStore::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(ResourceStore::init_global(ResourceStore::new()).is_err());
    }
}
