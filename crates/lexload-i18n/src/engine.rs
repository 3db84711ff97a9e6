//! Bundle-consuming engine interface and an in-memory implementation.

use crate::error::{ResourceError, ResourceResult};
use async_trait::async_trait;
use lexload_common::{Bundle, CacheKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The engine that applies fetched bundles and owns the active language.
#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// The currently active language.
    fn language(&self) -> String;

    /// Whether a bundle for `(language, namespace)` has been applied.
    fn has_bundle(&self, language: &str, namespace: &str) -> bool;

    /// Makes a fetched bundle usable.
    async fn apply_namespace(
        &self,
        namespace: &str,
        language: &str,
        bundle: Arc<Bundle>,
    ) -> ResourceResult<()>;

    /// Subscribes to active-language changes. Dropping the returned handle
    /// unsubscribes.
    fn subscribe_language(&self) -> LanguageSubscription;

    /// Number of live language subscriptions.
    fn listener_count(&self) -> usize;
}

/// A live subscription to active-language changes.
///
/// Rapid successive changes may be coalesced: a subscriber that falls behind
/// observes only the most recent language.
#[derive(Debug)]
pub struct LanguageSubscription {
    receiver: watch::Receiver<String>,
}

impl LanguageSubscription {
    /// Wraps a watch receiver.
    pub const fn new(receiver: watch::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// The language at the time of the last observed change.
    pub fn current(&self) -> String {
        self.receiver.borrow().clone()
    }

    /// Waits for the next language change. Returns `None` once the engine is gone.
    pub async fn changed(&mut self) -> Option<String> {
        self.receiver.changed().await.ok()?;
        let language = self.receiver.borrow_and_update().clone();
        Some(language)
    }
}

/// In-memory engine storing applied bundles per `(language, namespace)`.
#[derive(Debug)]
pub struct MemoryEngine {
    bundles: RwLock<HashMap<CacheKey, Arc<Bundle>>>,
    language: watch::Sender<String>,
    fallback_language: Option<String>,
    applied: AtomicUsize,
}

impl MemoryEngine {
    /// Create an engine with `language` active and no fallback.
    pub fn new(language: impl Into<String>) -> Self {
        let (language, _) = watch::channel(language.into());
        Self {
            bundles: RwLock::new(HashMap::new()),
            language,
            fallback_language: None,
            applied: AtomicUsize::new(0),
        }
    }

    /// Consult `fallback` when a message is missing from the active language.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_language = Some(fallback.into());
        self
    }

    /// The fallback language, if any.
    pub fn fallback_language(&self) -> Option<&str> {
        self.fallback_language.as_deref()
    }

    /// Switches the active language, notifying subscribers. Returns `false`
    /// when `language` was already active.
    pub fn change_language(&self, language: &str) -> bool {
        let changed = self.language.send_if_modified(|current| {
            if current == language {
                false
            } else {
                *current = language.to_string();
                true
            }
        });

        if changed {
            info!("Active language changed to '{}'", language);
        }
        changed
    }

    /// The applied bundle for `(language, namespace)`.
    pub fn bundle(&self, language: &str, namespace: &str) -> Option<Arc<Bundle>> {
        self.bundles
            .read()
            .get(&CacheKey::new(namespace, language))
            .cloned()
    }

    /// Resolves `path` in `namespace` for the active language, then the fallback.
    pub fn translate(&self, namespace: &str, path: &str) -> Option<String> {
        let active = self.language();
        let languages = std::iter::once(active.as_str()).chain(self.fallback_language.as_deref());

        for language in languages {
            if let Some(message) = self
                .bundle(language, namespace)
                .and_then(|bundle| bundle.message(path).map(str::to_string))
            {
                return Some(message);
            }
        }

        warn!("Message '{}' not found in namespace '{}'", path, namespace);
        None
    }

    /// Number of successful `apply_namespace` calls.
    pub fn applied_count(&self) -> usize {
        self.applied.load(Ordering::Relaxed)
    }

    /// Removes every applied bundle.
    pub fn reset(&self) {
        self.bundles.write().clear();
        debug!("Cleared all applied bundles");
    }
}

#[async_trait]
impl BundleEngine for MemoryEngine {
    fn language(&self) -> String {
        self.language.borrow().clone()
    }

    fn has_bundle(&self, language: &str, namespace: &str) -> bool {
        self.bundles
            .read()
            .contains_key(&CacheKey::new(namespace, language))
    }

    async fn apply_namespace(
        &self,
        namespace: &str,
        language: &str,
        bundle: Arc<Bundle>,
    ) -> ResourceResult<()> {
        if namespace.is_empty() || language.is_empty() {
            return Err(ResourceError::engine(format!(
                "cannot apply bundle for namespace {namespace:?} and language {language:?}"
            )));
        }

        self.bundles
            .write()
            .insert(CacheKey::new(namespace, language), bundle);
        self.applied.fetch_add(1, Ordering::Relaxed);
        debug!("Applied namespace '{}' for language '{}'", namespace, language);
        Ok(())
    }

    fn subscribe_language(&self) -> LanguageSubscription {
        LanguageSubscription::new(self.language.subscribe())
    }

    fn listener_count(&self) -> usize {
        self.language.receiver_count()
    }
}
