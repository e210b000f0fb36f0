//! Memo table for description results.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Least-recently-used map of description results.
///
/// A lookup promotes its entry, so an image that keeps recurring (a logo
/// on every page) stays cached while one-off images are evicted.
pub struct DescriptionCache<K: Hash + Eq, V> {
    entries: Option<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> DescriptionCache<K, V> {
    /// Create a cache holding at most `capacity` entries. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Look up a cached value and mark it as recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.entries.as_mut()?.get(key).cloned()
    }

    /// Store a value, evicting the least recently used entry if full.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(key, value);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for DescriptionCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionCache")
            .field("len", &self.entries.as_ref().map_or(0, LruCache::len))
            .field("cap", &self.entries.as_ref().map_or(0, |e| e.cap().get()))
            .finish()
    }
}
