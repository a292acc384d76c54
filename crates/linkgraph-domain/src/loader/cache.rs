//! Per-pass result cache.
//!
//! Memoizes `key -> value` for the lifetime of one [`Loader`](super::Loader),
//! which lives exactly as long as its resolution pass. There is no TTL and no
//! eviction: the whole cache is dropped with the pass.

use std::hash::Hash;

use dashmap::DashMap;

/// Unbounded memo table scoped to one resolution pass.
#[derive(Debug)]
pub struct PassCache<K, V>
where
    K: Hash + Eq,
{
    enabled: bool,
    entries: DashMap<K, V>,
}

impl<K, V> PassCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Creates a cache. A disabled cache never stores anything.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    /// Returns a copy of the cached value, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Stores a value. No-op when the cache is disabled.
    pub fn insert(&self, key: K, value: V) {
        if self.enabled {
            self.entries.insert(key, value);
        }
    }

    /// Removes one entry, returning true if it was present.
    pub fn remove(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
