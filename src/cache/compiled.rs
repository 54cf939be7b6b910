//! Dual-store compiled-query cache
//!
//! Successful compilations and validation failures live in separate stores
//! with independent eviction, so a flood of invalid queries can only evict
//! other invalid queries. Syntax errors are never cached.

use std::sync::{Arc, Mutex};

use crate::error::QueryError;
use crate::language::Document;

use super::errors::{CacheError, CacheResult, StoreKind};
use super::option::CacheOption;
use super::store::DocumentCache;

/// A compiled query: the parsed document and its validation errors
#[derive(Debug, Clone)]
pub struct CacheEntry {
    document: Arc<Document>,
    validation_errors: Arc<[QueryError]>,
}

impl CacheEntry {
    /// A document that validated cleanly
    pub fn success(document: Arc<Document>) -> Self {
        Self {
            document,
            validation_errors: Arc::from(Vec::new()),
        }
    }

    /// A document that failed validation
    pub fn failure(document: Arc<Document>, validation_errors: Vec<QueryError>) -> Self {
        Self {
            document,
            validation_errors: Arc::from(validation_errors),
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn validation_errors(&self) -> &[QueryError] {
        &self.validation_errors
    }

    pub fn kind(&self) -> StoreKind {
        if self.validation_errors.is_empty() {
            StoreKind::Success
        } else {
            StoreKind::Failure
        }
    }
}

/// Compiled-query cache keyed by literal source text
pub struct CompiledQueryCache {
    option: CacheOption,
    successes: Mutex<Box<dyn DocumentCache>>,
    failures: Mutex<Box<dyn DocumentCache>>,
}

impl std::fmt::Debug for CompiledQueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQueryCache")
            .field("option", &self.option)
            .field("successes", &self.success_len())
            .field("failures", &self.failure_len())
            .finish()
    }
}

impl Default for CompiledQueryCache {
    fn default() -> Self {
        Self::new(CacheOption::default())
    }
}

impl CompiledQueryCache {
    /// Build both stores from one option
    pub fn new(option: CacheOption) -> Self {
        Self {
            option,
            successes: Mutex::new(option.build_store()),
            failures: Mutex::new(option.build_store()),
        }
    }

    pub fn option(&self) -> CacheOption {
        self.option
    }

    /// Cached clean compilation for `source`
    pub fn lookup_success(&self, source: &str) -> Option<CacheEntry> {
        self.successes.lock().ok()?.get(source)
    }

    /// Cached validation failure for `source`
    pub fn lookup_failure(&self, source: &str) -> Option<CacheEntry> {
        self.failures.lock().ok()?.get(source)
    }

    /// Store a clean compilation; failure entries are rejected
    pub fn store_success(&self, source: &str, entry: CacheEntry) -> CacheResult<()> {
        Self::store(&self.successes, StoreKind::Success, source, entry)
    }

    /// Store a validation failure; clean entries are rejected
    pub fn store_failure(&self, source: &str, entry: CacheEntry) -> CacheResult<()> {
        Self::store(&self.failures, StoreKind::Failure, source, entry)
    }

    fn store(
        cache: &Mutex<Box<dyn DocumentCache>>,
        store: StoreKind,
        source: &str,
        entry: CacheEntry,
    ) -> CacheResult<()> {
        let found = entry.kind();
        if found != store {
            return Err(CacheError::KindMismatch { store, found });
        }
        cache
            .lock()
            .map_err(|_| CacheError::Poisoned(store))?
            .put(source.to_string(), entry);
        Ok(())
    }

    /// Whether the success store holds `source`, without touching recency
    pub fn contains_success(&self, source: &str) -> bool {
        self.successes.lock().map(|c| c.contains(source)).unwrap_or(false)
    }

    /// Whether the failure store holds `source`, without touching recency
    pub fn contains_failure(&self, source: &str) -> bool {
        self.failures.lock().map(|c| c.contains(source)).unwrap_or(false)
    }

    pub fn success_len(&self) -> usize {
        self.successes.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn failure_len(&self) -> usize {
        self.failures.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every entry from both stores
    pub(crate) fn invalidate(&self) {
        for store in [&self.successes, &self.failures] {
            match store.lock() {
                Ok(mut cache) => cache.clear(),
                Err(poisoned) => poisoned.into_inner().clear(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parse_query;

    fn document(source: &str) -> Arc<Document> {
        Arc::new(parse_query(source).unwrap())
    }

    fn failure(source: &str) -> CacheEntry {
        CacheEntry::failure(document(source), vec![QueryError::validation("bad")])
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = CompiledQueryCache::default();
        cache.store_success("{ a }", CacheEntry::success(document("{ a }"))).unwrap();
        cache.store_failure("{ b }", failure("{ b }")).unwrap();

        assert!(cache.lookup_success("{ a }").is_some());
        assert!(cache.lookup_failure("{ a }").is_none());
        let cached = cache.lookup_failure("{ b }").unwrap();
        assert_eq!(cached.validation_errors()[0].message, "bad");
        assert!(cache.lookup_success("{ b }").is_none());
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let cache = CompiledQueryCache::default();
        assert_eq!(
            cache.store_success("{ b }", failure("{ b }")),
            Err(CacheError::KindMismatch {
                store: StoreKind::Success,
                found: StoreKind::Failure
            })
        );
        assert!(cache
            .store_failure("{ a }", CacheEntry::success(document("{ a }")))
            .is_err());
        assert_eq!(cache.success_len() + cache.failure_len(), 0);
    }

    #[test]
    fn test_failure_pressure_does_not_evict_successes() {
        let cache = CompiledQueryCache::new(CacheOption::from_size(2));
        cache.store_success("{ ok }", CacheEntry::success(document("{ ok }"))).unwrap();

        for i in 0..10 {
            let source = format!("{{ bad{} }}", i);
            cache.store_failure(&source, failure(&source)).unwrap();
        }

        assert_eq!(cache.failure_len(), 2);
        assert!(cache.contains_success("{ ok }"));
        assert!(cache.contains_failure("{ bad9 }"));
        assert!(!cache.contains_failure("{ bad0 }"));
    }

    #[test]
    fn test_disabled_never_stores() {
        let cache = CompiledQueryCache::new(CacheOption::Disabled);
        cache.store_success("{ a }", CacheEntry::success(document("{ a }"))).unwrap();
        cache.store_failure("{ b }", failure("{ b }")).unwrap();

        assert!(cache.lookup_success("{ a }").is_none());
        assert!(cache.lookup_failure("{ b }").is_none());
    }

    #[test]
    fn test_invalidate_clears_both_stores() {
        let cache = CompiledQueryCache::default();
        cache.store_success("{ a }", CacheEntry::success(document("{ a }"))).unwrap();
        cache.store_failure("{ b }", failure("{ b }")).unwrap();

        cache.invalidate();
        assert_eq!(cache.success_len(), 0);
        assert_eq!(cache.failure_len(), 0);
    }
}
