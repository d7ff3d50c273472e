// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Bounded least-recently-used caches shared between a store and its
//! staging shards.

use parking_lot::Mutex;
use schnellru::{ByLength, LruMap};
use std::hash::Hash;

struct LruCacheInner<K: Hash + PartialEq, V> {
    map: LruMap<K, V, ByLength>,
    /// bumped by every `insert`, `remove` and `clear`
    generation: u64,
}

/// A thread safe LRU map with a fixed capacity.
///
/// Reads clone the value out so callers never hold the lock.
///
/// Values read from the backing store are added with [`LruCache::fill`],
/// which drops the value if the cache changed since [`LruCache::generation`]
/// was sampled, so a fill never brings back a value that a later write
/// replaced or removed.
pub struct LruCache<K: Hash + PartialEq, V: Clone> {
    inner: Mutex<LruCacheInner<K, V>>,
    capacity: u32,
}

impl<K: Hash + PartialEq, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    /// A zero capacity cache never retains anything.
    pub fn new(capacity: u32) -> Self {
        Self {
            inner: Mutex::new(LruCacheInner {
                map: LruMap::new(ByLength::new(capacity)),
                generation: 0,
            }),
            capacity,
        }
    }

    /// Get a copy of the value and mark it as recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().map.get(key).cloned()
    }

    /// Check presence without touching the recency order.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().map.peek(key).is_some()
    }

    /// Insert or overwrite a value, evicting the least recently used entry
    /// when full.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.map.insert(key, value);
    }

    /// Current generation, to be sampled before reading the backing store
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Insert a value read from the backing store, unless the cache was
    /// modified since `generation`. Returns whether the value was kept.
    pub fn fill(&self, key: K, value: V, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        inner.map.insert(key, value)
    }

    /// Remove a key. Returns the value if it was cached.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.map.remove(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.map.clear();
    }
}

impl<K: Hash + PartialEq, V: Clone> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// LRU cache keyed by chain index
pub type LruCacheU64<V> = LruCache<u64, V>;
