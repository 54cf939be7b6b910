//! Metrics registry for querygate
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
///
/// # Thread Safety
///
/// All counters use atomic operations for thread-safe increments.
/// Uses Relaxed ordering for minimal overhead (eventual consistency is fine for metrics).
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Success-store hits
    cache_hits: AtomicU64,
    /// Failure-store hits
    cache_failure_hits: AtomicU64,
    /// Lookups that missed both stores
    cache_misses: AtomicU64,
    /// Queries that failed to parse
    syntax_errors: AtomicU64,
    /// Queries that failed validation (uncached)
    validation_failures: AtomicU64,
    /// Queries executed
    queries_executed: AtomicU64,
    /// Queries refused before execution
    queries_rejected: AtomicU64,
    /// Accepted schema extensions
    schema_extensions: AtomicU64,
    /// Subscription streams opened
    subscriptions_opened: AtomicU64,
    /// Subscription contexts closed
    subscriptions_closed: AtomicU64,
    /// Events published
    events_published: AtomicU64,
    /// Payloads handed to queues
    events_delivered: AtomicU64,
    /// Failed publishes
    publish_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Cache metrics

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_failure_hits(&self) {
        self.cache_failure_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    // Query metrics

    pub fn increment_syntax_errors(&self) {
        self.syntax_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries executed
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries rejected
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_extensions(&self) {
        self.schema_extensions.fetch_add(1, Ordering::Relaxed);
    }

    // Pub/sub metrics

    pub fn increment_subscriptions_opened(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_subscriptions_closed(&self) {
        self.subscriptions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one publish reaching `delivered` queues
    pub fn record_publish(&self, delivered: u64) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.events_delivered.fetch_add(delivered, Ordering::Relaxed);
    }

    pub fn increment_publish_failures(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_failure_hits: self.cache_failure_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            syntax_errors: self.syntax_errors.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            schema_extensions: self.schema_extensions.load(Ordering::Relaxed),
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            subscriptions_closed: self.subscriptions_closed.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_failure_hits: u64,
    pub cache_misses: u64,
    pub syntax_errors: u64,
    pub validation_failures: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub schema_extensions: u64,
    pub subscriptions_opened: u64,
    pub subscriptions_closed: u64,
    pub events_published: u64,
    pub events_delivered: u64,
    pub publish_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();

        assert_eq!(snapshot.cache_hits, 0);
        assert_eq!(snapshot.queries_executed, 0);
        assert_eq!(snapshot.events_published, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_cache_hits();
        registry.increment_cache_hits();
        registry.increment_cache_failure_hits();
        registry.increment_cache_misses();
        registry.increment_syntax_errors();
        registry.increment_validation_failures();
        registry.increment_queries_executed();
        registry.increment_subscriptions_opened();
        registry.record_publish(3);
        registry.increment_publish_failures();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.cache_hits, 2);
        assert_eq!(snapshot.cache_failure_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.syntax_errors, 1);
        assert_eq!(snapshot.validation_failures, 1);
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.subscriptions_opened, 1);
        assert_eq!(snapshot.events_published, 1);
        assert_eq!(snapshot.events_delivered, 3);
        assert_eq!(snapshot.publish_failures, 1);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_queries_executed();
        registry.record_publish(2);

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["queries_executed"], 1);
        assert_eq!(parsed["events_delivered"], 2);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_cache_hits();
                    reg.increment_queries_executed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.cache_hits, 1000);
        assert_eq!(snapshot.queries_executed, 1000);
    }
}
