//! Request-scoped batched loading.
//!
//! A [`Loader`] wraps one [`BatchFn`] and splits every resolution tick into
//! two explicit phases:
//!
//! 1. **Collect**: resolvers call [`Loader::register`]. The key is looked up
//!    in the per-pass cache; on a miss it is queued (deduplicated) and the
//!    caller receives a [`PendingLoad`]. No storage access happens here.
//! 2. **Flush**: [`Loader::dispatch`] hands every queued key to the batch
//!    function in a single call, caches the values and broadcasts each one to
//!    all handles waiting on that key.
//!
//! [`Loader::load`] folds both phases into one call for code that simply
//! awaits a value. It yields once between the phases so that sibling futures
//! polled in the same wave register their keys into the same batch.
//!
//! Loaders hold no global state. They are created per resolution pass (see
//! [`RequestPass`](crate::resolver::RequestPass)) and dropped with it.

mod cache;
mod pending;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, instrument, trace, warn};

use crate::error::{DomainError, DomainResult};

pub use cache::PassCache;
pub use pending::PendingLoad;

use pending::KeyCollector;

/// A bulk fetch strategy for one relation or entity type.
#[async_trait]
pub trait BatchFn: Send + Sync + 'static {
    /// The key shape this loader is addressed by.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    /// The value produced per key. "Not found" is a value (`None` or empty).
    type Value: Clone + Send + Sync + 'static;

    /// Loader name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fetches values for `keys`.
    ///
    /// Must return exactly one value per key, in the order of `keys`.
    async fn load(&self, keys: &[Self::Key]) -> DomainResult<Vec<Self::Value>>;
}

/// Configuration shared by the loaders of one pass.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Memoize values for the rest of the pass.
    ///
    /// When disabled, keys registered in the same tick are still fetched once,
    /// but a later tick fetches them again.
    pub cache_enabled: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

impl LoaderConfig {
    /// Enables or disables the per-pass cache.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

/// Batching loader bound to one [`BatchFn`] for the lifetime of one pass.
pub struct Loader<F: BatchFn> {
    batch_fn: F,
    cache: PassCache<F::Key, F::Value>,
    collector: Mutex<KeyCollector<F::Key, F::Value>>,
}

impl<F: BatchFn> std::fmt::Debug for Loader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collector = self.collector();
        f.debug_struct("Loader")
            .field("name", &self.name())
            .field("cached", &self.cache.len())
            .field("queued", &collector.queued_len())
            .field("in_flight", &collector.in_flight_len())
            .finish()
    }
}

impl<F: BatchFn> Loader<F> {
    /// Creates a loader with an empty cache and queue.
    pub fn new(batch_fn: F, config: &LoaderConfig) -> Self {
        Self {
            batch_fn,
            cache: PassCache::new(config.cache_enabled),
            collector: Mutex::new(KeyCollector::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.batch_fn.name()
    }

    // The lock is never held across an await, so a poisoned guard still
    // protects a consistent collector.
    fn collector(&self) -> MutexGuard<'_, KeyCollector<F::Key, F::Value>> {
        self.collector.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collect phase: registers `key` and returns a handle to its value.
    ///
    /// Resolves immediately on a cache hit. Otherwise the key joins the
    /// current batch, or the in-flight fetch if it is already being loaded.
    pub fn register(&self, key: F::Key) -> PendingLoad<F::Value> {
        let mut collector = self.collector();
        // Checked under the collector lock: dispatch fills the cache while
        // holding it, so a key is either cached or still has waiters.
        if let Some(value) = self.cache.get(&key) {
            trace!(loader = self.name(), ?key, "cache hit");
            return PendingLoad::ready(self.name(), Ok(value));
        }
        PendingLoad::waiting(self.name(), collector.register(key))
    }

    /// True if keys are waiting for the next dispatch.
    pub fn has_queued(&self) -> bool {
        self.collector().queued_len() > 0
    }

    /// Flush phase: fetches every queued key with one batch call.
    ///
    /// Returns the number of distinct keys dispatched. The outcome, including
    /// a failure, is delivered through the keys' [`PendingLoad`] handles.
    /// Failures are neither cached nor retried.
    #[instrument(skip(self), fields(loader = self.name()))]
    pub async fn dispatch(&self) -> usize {
        let keys = self.collector().take_batch();
        if keys.is_empty() {
            return 0;
        }

        debug!(batch_size = keys.len(), "dispatching batch");
        let guard = DispatchGuard::new(self, &keys);

        let outcome = self.batch_fn.load(&keys).await.and_then(|values| {
            if values.len() == keys.len() {
                Ok(values)
            } else {
                Err(DomainError::BatchLengthMismatch {
                    loader: self.name(),
                    expected: keys.len(),
                    actual: values.len(),
                })
            }
        });

        let mut collector = self.collector();
        match outcome {
            Ok(values) => {
                for (key, value) in keys.iter().zip(values) {
                    self.cache.insert(key.clone(), value.clone());
                    if let Some(tx) = collector.complete(key) {
                        // No receivers left is fine
                        let _ = tx.send(Ok(value));
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, batch_size = keys.len(), "batch fetch failed");
                for key in &keys {
                    if let Some(tx) = collector.complete(key) {
                        let _ = tx.send(Err(err.clone()));
                    }
                }
            }
        }
        drop(collector);
        guard.complete();

        keys.len()
    }

    /// Loads one value, coalescing with keys registered by sibling futures.
    pub async fn load(&self, key: F::Key) -> DomainResult<F::Value> {
        let pending = self.register(key);
        if !pending.is_ready() {
            // Give the rest of this wave a turn to register before flushing
            tokio::task::yield_now().await;
            self.dispatch().await;
        }
        pending.await
    }

    /// Loads many values with at most one batch call, in input order.
    pub async fn load_many(
        &self,
        keys: impl IntoIterator<Item = F::Key>,
    ) -> DomainResult<Vec<F::Value>> {
        let pending: Vec<_> = keys.into_iter().map(|key| self.register(key)).collect();
        if pending.iter().any(|p| !p.is_ready()) {
            self.dispatch().await;
        }
        try_join_all(pending.into_iter().map(PendingLoad::wait)).await
    }

    /// Seeds the cache with a value obtained elsewhere in the pass.
    ///
    /// An existing entry is kept.
    pub fn prime(&self, key: F::Key, value: F::Value) {
        let _collector = self.collector();
        if self.cache.get(&key).is_none() {
            self.cache.insert(key, value);
        }
    }

    /// Number of cached values.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Releases in-flight keys if a dispatch is dropped before delivering.
///
/// Dropping the senders wakes every waiter with
/// [`DomainError::LoadCancelled`] instead of leaving it pending forever.
struct DispatchGuard<'a, F: BatchFn> {
    loader: &'a Loader<F>,
    keys: &'a [F::Key],
    completed: bool,
}

impl<'a, F: BatchFn> DispatchGuard<'a, F> {
    fn new(loader: &'a Loader<F>, keys: &'a [F::Key]) -> Self {
        Self {
            loader,
            keys,
            completed: false,
        }
    }

    /// Mark as completed (normal path).
    fn complete(mut self) {
        self.completed = true;
    }
}

impl<F: BatchFn> Drop for DispatchGuard<'_, F> {
    fn drop(&mut self) {
        if !self.completed {
            let mut collector = self.loader.collector();
            for key in self.keys {
                collector.complete(key);
            }
        }
    }
}

/// Object-safe view of a loader, used to flush a pass's loaders together.
#[async_trait]
pub trait Dispatch: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_queued(&self) -> bool;

    async fn dispatch(&self) -> usize;
}

#[async_trait]
impl<F: BatchFn> Dispatch for Loader<F> {
    fn name(&self) -> &'static str {
        Loader::name(self)
    }

    fn has_queued(&self) -> bool {
        Loader::has_queued(self)
    }

    async fn dispatch(&self) -> usize {
        Loader::dispatch(self).await
    }
}
