//! Compiled-Query Cache Invariant Tests
//!
//! - Syntax errors are never cached
//! - Validation failures are cached; the validator runs once per source
//! - Clean compilations are cached; the parser runs once per source
//! - Failure pressure never evicts clean compilations
//! - A disabled cache stores nothing and recompiles every time

use std::sync::atomic::{AtomicUsize, Ordering};

use querygate::error::QueryError;
use querygate::execution::Response;
use querygate::gateway::{GatewayConfig, GraphQLEngine, QueryEngine, QueryGateway};
use querygate::language::Document;
use querygate::schema::Schema;
use querygate::Resolvers;
use serde_json::{json, Map};

// =============================================================================
// Helper Functions
// =============================================================================

/// Bundled engine that counts parse and validate calls
#[derive(Default)]
struct CountingEngine {
    inner: GraphQLEngine,
    parses: AtomicUsize,
    validations: AtomicUsize,
}

impl CountingEngine {
    fn parses(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

impl QueryEngine for CountingEngine {
    fn parse(&self, source: &str) -> Result<Document, QueryError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(source)
    }

    fn validate(&self, schema: &Schema, document: &Document) -> Vec<QueryError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.inner.validate(schema, document)
    }
}

fn gateway_with(config: GatewayConfig) -> QueryGateway<CountingEngine> {
    let config = config
        .with_schema_sdl("type Query { ping: String user(id: ID!): String }")
        .with_resolvers(Resolvers::new().value("ping", json!("pong")));
    let gateway = QueryGateway::with_engine(config, CountingEngine::default()).unwrap();
    gateway.ready().unwrap();
    gateway
}

fn gateway() -> QueryGateway<CountingEngine> {
    gateway_with(GatewayConfig::new())
}

async fn run(gateway: &QueryGateway<CountingEngine>, source: &str) -> Response {
    gateway
        .run(source, Map::new(), Map::new(), None)
        .await
        .into_response()
        .unwrap()
}

// =============================================================================
// Syntax Errors
// =============================================================================

/// Test: Syntax errors are reported on every call and never stored.
#[tokio::test]
async fn test_syntax_errors_never_cached() {
    let gateway = gateway();
    let source = "{ ping";

    for attempt in 1..=3 {
        let response = run(&gateway, source).await;
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].is_syntax());
        assert!(response.errors[0].message.starts_with("Syntax Error"));

        assert!(!gateway.cache().contains_success(source));
        assert!(!gateway.cache().contains_failure(source));
        assert_eq!(gateway.engine().parses(), attempt);
    }

    assert_eq!(gateway.engine().validations(), 0);
    assert_eq!(gateway.metrics().snapshot().syntax_errors, 3);
}

/// Test: Arbitrarily deep nesting is a syntax error, not a crash, and is not stored.
#[tokio::test]
async fn test_deep_nesting_is_a_syntax_error() {
    let gateway = gateway();
    let depth = 50_000;
    let sources = [
        format!("{}{}", "{a".repeat(depth), "}".repeat(depth)),
        format!("{{ user(id: {}1{}) }}", "[".repeat(depth), "]".repeat(depth)),
        format!("{{ user(id: {}1{}) }}", "{x:".repeat(depth), "}".repeat(depth)),
    ];

    for source in &sources {
        let response = run(&gateway, source).await;
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].is_syntax());
        assert!(!gateway.cache().contains_failure(source));
        assert!(!gateway.cache().contains_success(source));
    }

    let response = run(&gateway, "{ ping }").await;
    assert_eq!(response.to_json(), json!({"data": {"ping": "pong"}}));
}

// =============================================================================
// Validation Failures
// =============================================================================

/// Test: The validator runs once; later calls return the identical cached errors.
#[tokio::test]
async fn test_validation_errors_cached_validator_called_once() {
    let gateway = gateway();
    let source = "{ nope user }";

    let first = run(&gateway, source).await;
    assert!(!first.errors.is_empty());
    assert_eq!(first.status_code(), 400);
    assert!(gateway.cache().contains_failure(source));
    assert!(!gateway.cache().contains_success(source));

    for _ in 0..5 {
        let again = run(&gateway, source).await;
        assert_eq!(again, first);
    }

    assert_eq!(gateway.engine().validations(), 1);
    assert_eq!(gateway.engine().parses(), 1);

    let snapshot = gateway.metrics().snapshot();
    assert_eq!(snapshot.validation_failures, 1);
    assert_eq!(snapshot.cache_failure_hits, 5);
}

// =============================================================================
// Clean Compilations
// =============================================================================

/// Test: The parser runs once; later calls execute the cached document.
#[tokio::test]
async fn test_success_cached_parser_called_once() {
    let gateway = gateway();
    let source = "{ ping }";

    for _ in 0..4 {
        let response = run(&gateway, source).await;
        assert_eq!(response.to_json(), json!({"data": {"ping": "pong"}}));
    }

    assert!(gateway.cache().contains_success(source));
    assert_eq!(gateway.engine().parses(), 1);
    assert_eq!(gateway.engine().validations(), 1);
    assert_eq!(gateway.metrics().snapshot().cache_hits, 3);
    assert_eq!(gateway.metrics().snapshot().queries_executed, 4);
}

/// Test: Keys are the literal source text, not a normalized form.
#[tokio::test]
async fn test_keys_are_byte_exact() {
    let gateway = gateway();
    run(&gateway, "{ ping }").await;
    run(&gateway, "{ping}").await;
    run(&gateway, "{ ping }").await;

    assert_eq!(gateway.cache().success_len(), 2);
    assert_eq!(gateway.engine().parses(), 2);
}

/// Test: Execution-time errors do not turn a clean compilation into a failure.
#[tokio::test]
async fn test_execution_errors_stay_in_success_store() {
    let gateway = gateway();
    let source = "query U($id: ID!) { user(id: $id) }";

    let response = run(&gateway, source).await;
    assert_eq!(response.status_code(), 400);
    assert!(gateway.cache().contains_success(source));
    assert!(!gateway.cache().contains_failure(source));
}

// =============================================================================
// Cache Independence
// =============================================================================

/// Test: Driving failures past capacity evicts only failure entries.
#[tokio::test]
async fn test_failure_pressure_does_not_evict_successes() {
    let gateway = gateway_with(GatewayConfig::new().with_cache(4usize));
    let good = "{ ping }";
    run(&gateway, good).await;

    for i in 0..50 {
        let bad = format!("{{ missing{} }}", i);
        let response = run(&gateway, &bad).await;
        assert!(!response.errors.is_empty());
    }

    assert_eq!(gateway.cache().failure_len(), 4);
    assert!(gateway.cache().contains_success(good));
    assert!(!gateway.cache().contains_failure("{ missing0 }"));

    let parses = gateway.engine().parses();
    let response = run(&gateway, good).await;
    assert_eq!(response.to_json(), json!({"data": {"ping": "pong"}}));
    assert_eq!(gateway.engine().parses(), parses);
}

// =============================================================================
// Disabled Cache
// =============================================================================

/// Test: `false` and `0` disable both stores.
#[tokio::test]
async fn test_disabled_cache_never_stores() {
    for config in [
        GatewayConfig::new().with_cache(false),
        GatewayConfig::new().with_cache(0usize),
    ] {
        let gateway = gateway_with(config);
        assert!(!gateway.cache().option().is_enabled());

        for _ in 0..3 {
            run(&gateway, "{ ping }").await;
            run(&gateway, "{ nope }").await;
        }

        assert_eq!(gateway.engine().parses(), 6);
        assert_eq!(gateway.engine().validations(), 6);
        assert_eq!(gateway.cache().success_len(), 0);
        assert_eq!(gateway.cache().failure_len(), 0);
    }
}

/// Test: `true` keeps the default size.
#[test]
fn test_true_means_default_size() {
    let gateway = gateway_with(GatewayConfig::new().with_cache(true));
    assert_eq!(gateway.cache().option().capacity(), 1024);
}
