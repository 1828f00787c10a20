//! Bounded cache for streaming-availability lookups.
//!
//! Watch-provider lookups are the hottest, most repetitive external call the
//! orchestrator makes (every candidate, every genre, every run) and the
//! answer barely changes title to title run to run, so it's worth capping
//! memory with an LRU instead of an unbounded map.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Default capacity for the streaming-availability cache.
pub const STREAMING_CACHE_CAPACITY: usize = 500;

/// Thin wrapper over [`lru::LruCache`] with value semantics (`get` clones
/// out rather than handing back a reference) — callers treat this like a
/// cache of query results, not a borrowed store.
pub struct BoundedCache<K, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: LruCache::new(cap),
        }
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.inner.get(key).cloned()
    }

    /// Insert or overwrite `key`, evicting the least-recently-used entry if
    /// the cache was already at capacity.
    pub fn put(&mut self, key: K, value: V) {
        self.inner.put(key, value);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for BoundedCache<K, V> {
    fn default() -> Self {
        Self::new(STREAMING_CACHE_CAPACITY)
    }
}
