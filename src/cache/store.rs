//! Store implementations behind each half of the compiled-query cache
//!
//! The store is chosen once at construction; call sites never branch on
//! whether caching is enabled.

use std::num::NonZeroUsize;

use lru::LruCache;

use super::compiled::CacheEntry;

/// A bounded map from query source text to a compiled entry
pub trait DocumentCache: Send {
    /// Fetch an entry, marking it most recently used
    fn get(&mut self, source: &str) -> Option<CacheEntry>;

    /// Insert an entry, evicting the least recently used one when full
    fn put(&mut self, source: String, entry: CacheEntry);

    /// Presence check that does not touch recency
    fn contains(&self, source: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries (zero for a disabled store)
    fn capacity(&self) -> usize;

    fn clear(&mut self);
}

/// Disabled store: every lookup misses, nothing is kept
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl DocumentCache for NullCache {
    fn get(&mut self, _source: &str) -> Option<CacheEntry> {
        None
    }

    fn put(&mut self, _source: String, _entry: CacheEntry) {}

    fn contains(&self, _source: &str) -> bool {
        false
    }

    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }

    fn clear(&mut self) {}
}

/// Least-recently-used store keyed by the literal source text
#[derive(Debug)]
pub struct LruDocumentCache {
    entries: LruCache<String, CacheEntry>,
}

impl LruDocumentCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }
}

impl DocumentCache for LruDocumentCache {
    fn get(&mut self, source: &str) -> Option<CacheEntry> {
        self.entries.get(source).cloned()
    }

    fn put(&mut self, source: String, entry: CacheEntry) {
        self.entries.put(source, entry);
    }

    fn contains(&self, source: &str) -> bool {
        self.entries.contains(source)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
