//! Bundle cache and in-flight fetch table.
//!
//! Both tables sit behind one mutex so that "is it cached, is it loading,
//! otherwise start it" happens as a single step. A fetch that finishes
//! removes its in-flight entry and stores its bundle in the same critical
//! section, so no caller can observe the key as neither cached nor loading
//! while the result is being published.

use crate::error::ResourceResult;
use futures::future::{BoxFuture, Shared};
use lexload_common::{Bundle, CacheKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// The shared, cloneable future every caller of one fetch awaits.
pub type SharedFetch = Shared<BoxFuture<'static, ResourceResult<Arc<Bundle>>>>;

/// A pending fetch recorded in the in-flight table.
#[derive(Clone)]
pub struct InFlight {
    ticket: u64,
    fetch: SharedFetch,
}

impl InFlight {
    /// Identifies which fetch owns the entry.
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Waits for the fetch to finish.
    pub async fn wait(self) -> ResourceResult<Arc<Bundle>> {
        self.fetch.await
    }
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight").field("ticket", &self.ticket).finish_non_exhaustive()
    }
}

/// Outcome of [`ResourceCache::claim`].
#[derive(Debug)]
pub enum Claim {
    /// A bundle is stored and nothing is loading.
    Cached(Arc<Bundle>),
    /// Another caller already started the fetch.
    Joined(InFlight),
    /// This caller started the fetch.
    Started(InFlight),
}

#[derive(Default)]
struct Tables {
    bundles: HashMap<CacheKey, Arc<Bundle>>,
    in_flight: HashMap<CacheKey, InFlight>,
    next_ticket: u64,
}

impl Tables {
    fn insert_in_flight(&mut self, key: CacheKey, fetch: SharedFetch) -> InFlight {
        self.next_ticket += 1;
        let entry = InFlight {
            ticket: self.next_ticket,
            fetch,
        };
        self.in_flight.insert(key, entry.clone());
        entry
    }

    fn owns(&self, key: &CacheKey, ticket: u64) -> bool {
        self.in_flight.get(key).is_some_and(|entry| entry.ticket == ticket)
    }
}

/// Counters describing cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored bundles.
    pub bundles: usize,
    /// Fetches currently in flight.
    pub in_flight: usize,
    /// Claims answered from a stored bundle.
    pub hits: u64,
    /// Claims that joined an existing fetch.
    pub joins: u64,
    /// Claims that started a new fetch.
    pub misses: u64,
}

/// Completed bundles and in-flight fetches keyed by `(namespace, language)`.
#[derive(Default)]
pub struct ResourceCache {
    tables: Mutex<Tables>,
    hits: AtomicU64,
    joins: AtomicU64,
    misses: AtomicU64,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored bundle for `key`
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Bundle>> {
        self.tables.lock().bundles.get(key).cloned()
    }

    /// Store a bundle for `key`, replacing any previous one
    pub fn set(&self, key: CacheKey, bundle: Arc<Bundle>) {
        debug!("Storing bundle for key: {}", key);
        self.tables.lock().bundles.insert(key, bundle);
    }

    /// Get the in-flight fetch for `key`
    pub fn get_in_flight(&self, key: &CacheKey) -> Option<InFlight> {
        self.tables.lock().in_flight.get(key).cloned()
    }

    /// Record `fetch` as the in-flight fetch for `key`, returning the entry
    pub fn set_in_flight(&self, key: CacheKey, fetch: SharedFetch) -> InFlight {
        self.tables.lock().insert_in_flight(key, fetch)
    }

    /// Drop the in-flight entry for `key`, whoever owns it
    pub fn clear_in_flight(&self, key: &CacheKey) {
        self.tables.lock().in_flight.remove(key);
    }

    /// Whether a fetch for `key` is in flight
    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.tables.lock().in_flight.contains_key(key)
    }

    /// Whether a bundle for `key` is stored
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.tables.lock().bundles.contains_key(key)
    }

    /// Atomically resolve `key` to a stored bundle, an existing fetch, or a
    /// new fetch produced by `start`.
    ///
    /// `start` runs under the cache lock and must not call back into the
    /// cache. It receives the ticket the new entry will carry.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `start`; nothing is recorded then.
    pub fn claim<E>(
        &self,
        key: &CacheKey,
        start: impl FnOnce(u64) -> Result<SharedFetch, E>,
    ) -> Result<Claim, E> {
        let mut tables = self.tables.lock();

        if let Some(entry) = tables.in_flight.get(key) {
            self.joins.fetch_add(1, Ordering::Relaxed);
            debug!("Joining in-flight fetch for key: {}", key);
            return Ok(Claim::Joined(entry.clone()));
        }

        if let Some(bundle) = tables.bundles.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for key: {}", key);
            return Ok(Claim::Cached(Arc::clone(bundle)));
        }

        let fetch = start(tables.next_ticket + 1)?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for key: {}, fetch started", key);
        Ok(Claim::Started(tables.insert_in_flight(key.clone(), fetch)))
    }

    /// Publish the result of fetch `ticket`: store the bundle and release the
    /// in-flight entry in one step.
    ///
    /// Returns `false` and stores nothing if the entry was invalidated (or
    /// replaced by a newer fetch) while the fetch was running.
    pub fn complete(&self, key: &CacheKey, ticket: u64, bundle: Arc<Bundle>) -> bool {
        let mut tables = self.tables.lock();
        if !tables.owns(key, ticket) {
            debug!("Discarding result of invalidated fetch for key: {}", key);
            return false;
        }
        tables.in_flight.remove(key);
        tables.bundles.insert(key.clone(), bundle);
        true
    }

    /// Release the in-flight entry of a failed fetch `ticket`, leaving the
    /// key retryable. Returns whether the entry was still owned by `ticket`.
    pub fn abandon(&self, key: &CacheKey, ticket: u64) -> bool {
        let mut tables = self.tables.lock();
        if !tables.owns(key, ticket) {
            return false;
        }
        tables.in_flight.remove(key);
        true
    }

    /// Empty both tables
    pub fn clear_all(&self) {
        let mut tables = self.tables.lock();
        let (bundles, in_flight) = (tables.bundles.len(), tables.in_flight.len());
        tables.bundles.clear();
        tables.in_flight.clear();
        info!(
            "Cleared resource cache ({} bundles, {} in-flight fetches)",
            bundles, in_flight
        );
    }

    /// Remove the bundle and any in-flight entry for one pair
    pub fn clear_one(&self, namespace: &str, language: &str) {
        let key = CacheKey::new(namespace, language);
        let mut tables = self.tables.lock();
        tables.bundles.remove(&key);
        tables.in_flight.remove(&key);
        debug!("Cleared cache entry for key: {}", key);
    }

    /// Keys of all stored bundles
    pub fn cached_keys(&self) -> Vec<CacheKey> {
        self.tables.lock().bundles.keys().cloned().collect()
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        let tables = self.tables.lock();
        CacheStats {
            bundles: tables.bundles.len(),
            in_flight: tables.in_flight.len(),
            hits: self.hits.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache").field("stats", &self.stats()).finish()
    }
}
