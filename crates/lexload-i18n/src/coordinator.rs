//! The single entry point for making a bundle available.

use crate::cache::{Claim, ResourceCache, SharedFetch};
use crate::engine::BundleEngine;
use crate::error::{ResourceError, ResourceResult};
use crate::registry::LoaderRegistry;
use futures::future::join_all;
use futures::FutureExt;
use lexload_common::{Bundle, CacheKey};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Makes bundles available, guaranteeing at most one fetch per
/// `(namespace, language)` at a time.
pub struct ResourceCoordinator {
    registry: Arc<LoaderRegistry>,
    cache: Arc<ResourceCache>,
    engine: Arc<dyn BundleEngine>,
}

impl ResourceCoordinator {
    /// Create a coordinator over the given registry, cache and engine
    pub fn new(
        registry: Arc<LoaderRegistry>,
        cache: Arc<ResourceCache>,
        engine: Arc<dyn BundleEngine>,
    ) -> Self {
        Self {
            registry,
            cache,
            engine,
        }
    }

    /// Resolves once a bundle for `(namespace, language)` is available.
    ///
    /// Fast path first: a bundle the engine already applied short-circuits
    /// everything, then a stored bundle, then an in-flight fetch is joined,
    /// and only then is the registered loader invoked.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NoLoaderRegistered`] on a cold start without a loader,
    /// [`ResourceError::LoadFailure`] when the loader rejects (every caller
    /// joined on that fetch receives the same error).
    #[instrument(skip(self))]
    pub async fn ensure_resource_loaded(&self, namespace: &str, language: &str) -> ResourceResult<()> {
        self.ensure_bundle(namespace, language).await.map(|_| ())
    }

    /// Like [`ensure_resource_loaded`](Self::ensure_resource_loaded), but
    /// hands back the bundle. `None` means the engine already had it applied.
    ///
    /// # Errors
    ///
    /// See [`ensure_resource_loaded`](Self::ensure_resource_loaded).
    pub async fn ensure_bundle(
        &self,
        namespace: &str,
        language: &str,
    ) -> ResourceResult<Option<Arc<Bundle>>> {
        if self.engine.has_bundle(language, namespace) {
            debug!("Namespace '{}' already applied for language '{}'", namespace, language);
            return Ok(None);
        }

        let key = CacheKey::new(namespace, language);
        let fetch = match self.cache.claim(&key, |ticket| self.start_fetch(&key, ticket))? {
            Claim::Cached(bundle) => return Ok(Some(bundle)),
            Claim::Joined(fetch) | Claim::Started(fetch) => fetch,
        };

        fetch.wait().await.map(Some)
    }

    /// Ensures several namespaces for one language concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error in `namespaces` order; every load still runs
    /// to completion.
    pub async fn ensure_all<S: AsRef<str>>(&self, namespaces: &[S], language: &str) -> ResourceResult<()> {
        let results = join_all(
            namespaces
                .iter()
                .map(|namespace| self.ensure_resource_loaded(namespace.as_ref(), language)),
        )
        .await;

        results.into_iter().collect()
    }

    /// Drops the cached bundle and any in-flight entry for one pair, so the
    /// next request fetches again.
    pub fn invalidate(&self, namespace: &str, language: &str) {
        self.cache.clear_one(namespace, language);
    }

    /// The loader registry
    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.registry
    }

    /// The resource cache
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// The bundle engine
    pub fn engine(&self) -> &Arc<dyn BundleEngine> {
        &self.engine
    }

    /// Spawns the fetch for `key` and returns the future all callers share.
    /// Runs under the cache lock, so it only looks up the loader and spawns.
    fn start_fetch(&self, key: &CacheKey, ticket: u64) -> ResourceResult<SharedFetch> {
        let loader = self
            .registry
            .get(key.namespace())
            .ok_or_else(|| ResourceError::NoLoaderRegistered {
                namespace: key.namespace().to_string(),
            })?;

        let cache = Arc::clone(&self.cache);
        let namespace = key.namespace().to_string();
        let language = key.language().to_string();
        let key = key.clone();

        // The task owns the fetch, so it finishes and publishes its result
        // even if every caller stops waiting.
        let task = tokio::spawn(async move {
            let (namespace, language) = (key.namespace(), key.language());
            let outcome = AssertUnwindSafe(async { loader.load(namespace, language).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(bundle)) => {
                    let bundle = Arc::new(bundle);
                    if cache.complete(&key, ticket, Arc::clone(&bundle)) {
                        info!("Loaded namespace '{}' for language '{}'", namespace, language);
                    }
                    Ok(bundle)
                }
                Ok(Err(source)) => {
                    cache.abandon(&key, ticket);
                    error!(
                        namespace = %namespace,
                        language = %language,
                        error = %source,
                        "Failed to load namespace '{}' for language '{}'",
                        namespace,
                        language
                    );
                    Err(ResourceError::load_failure(namespace, language, source))
                }
                Err(_) => {
                    cache.abandon(&key, ticket);
                    error!(
                        namespace = %namespace,
                        language = %language,
                        "Loader panicked while loading namespace '{}' for language '{}'",
                        namespace,
                        language
                    );
                    Err(ResourceError::LoaderPanicked {
                        namespace: namespace.to_string(),
                        language: language.to_string(),
                    })
                }
            }
        });

        Ok(async move {
            task.await
                .unwrap_or(Err(ResourceError::LoaderPanicked { namespace, language }))
        }
        .boxed()
        .shared())
    }
}

impl std::fmt::Debug for ResourceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCoordinator")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::error::{load_error_msg, LoadError};
    use lexload_common::test_utils::bundle_fixtures::greeting_bundle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator() -> (ResourceCoordinator, Arc<MemoryEngine>) {
        let engine = Arc::new(MemoryEngine::new("en"));
        let coordinator = ResourceCoordinator::new(
            Arc::new(LoaderRegistry::new()),
            Arc::new(ResourceCache::new()),
            engine.clone(),
        );
        (coordinator, engine)
    }

    #[tokio::test]
    async fn test_engine_fast_path_skips_loader() {
        let (coordinator, engine) = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        coordinator
            .registry()
            .register_fn("foo", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, LoadError>(greeting_bundle()) }
            })
            .unwrap();
        engine
            .apply_namespace("foo", "en", Arc::new(greeting_bundle()))
            .await
            .unwrap();

        assert!(coordinator.ensure_bundle("foo", "en").await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!coordinator.cache().is_cached(&CacheKey::new("foo", "en")));
    }

    #[tokio::test]
    async fn test_no_loader_registered() {
        let (coordinator, _) = coordinator();
        let err = coordinator.ensure_resource_loaded("missing", "en").await.unwrap_err();

        assert!(matches!(err, ResourceError::NoLoaderRegistered { ref namespace } if namespace == "missing"));
        assert!(!coordinator.cache().is_loading(&CacheKey::new("missing", "en")));
    }

    #[tokio::test]
    async fn test_cached_bundle_is_returned() {
        let (coordinator, _) = coordinator();
        coordinator
            .registry()
            .register_fn("foo", |_, _| async { Ok::<_, LoadError>(greeting_bundle()) })
            .unwrap();

        let first = coordinator.ensure_bundle("foo", "en").await.unwrap().unwrap();
        let second = coordinator.ensure_bundle("foo", "en").await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(coordinator.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_panicking_loader_leaves_key_retryable() {
        let (coordinator, _) = coordinator();
        coordinator
            .registry()
            .register_fn("boom", |_, _| async {
                if true {
                    panic!("loader exploded");
                }
                Ok::<_, LoadError>(greeting_bundle())
            })
            .unwrap();

        let err = coordinator.ensure_resource_loaded("boom", "en").await.unwrap_err();
        assert!(matches!(
            err,
            ResourceError::LoaderPanicked { ref namespace, ref language }
                if namespace == "boom" && language == "en"
        ));
        assert!(!coordinator.cache().is_loading(&CacheKey::new("boom", "en")));
    }

    #[tokio::test]
    async fn test_ensure_all_reports_first_error() {
        let (coordinator, _) = coordinator();
        coordinator
            .registry()
            .register_fn("ok", |_, _| async { Ok::<_, LoadError>(greeting_bundle()) })
            .unwrap();
        coordinator
            .registry()
            .register_fn("bad", |_, _| async { Err::<Bundle, _>(load_error_msg("network")) })
            .unwrap();

        let err = coordinator.ensure_all(&["ok", "bad"], "en").await.unwrap_err();
        assert!(matches!(err, ResourceError::LoadFailure { .. }));
        assert!(coordinator.cache().is_cached(&CacheKey::new("ok", "en")));

        assert!(coordinator.ensure_all(&["ok"], "en").await.is_ok());
    }
}
