//! # Query Gateway
//!
//! Request-time core: compiled-query caching in front of a query engine,
//! schema evolution, and the process-wide pub/sub core.
//!
//! # Lifecycle
//!
//! 1. `new` builds the schema and the caches
//! 2. `extend_schema` / `define_resolvers` as needed
//! 3. `ready` validates the schema; failure is fatal
//! 4. `run` serves requests
//!
//! # Request flow
//!
//! success-store hit → execute; failure-store hit → cached errors;
//! miss → parse (syntax errors are never cached) → validate → store → execute.
//!
//! Lookups, compilation and stores run under the state read lock, and schema
//! extension clears both stores under the write lock, so a stored entry
//! always belongs to the schema that is active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};

use super::config::GatewayConfig;
use super::engine::{GraphQLEngine, QueryEngine};
use super::errors::{GatewayError, GatewayResult};
use crate::cache::{CacheEntry, CompiledQueryCache};
use crate::error::QueryError;
use crate::execution::{ExecutionRequest, QueryOutcome, RequestContext, Resolvers, Response};
use crate::language::{parse_schema, Document, TypeSystemDocument};
use crate::observability::{log_event, log_event_with_fields, Event, MetricsRegistry};
use crate::realtime::{PubSub, SubscriptionContext};
use crate::schema::{Schema, SchemaError};

/// A schema fragment for `extend_schema`
#[derive(Debug, Clone)]
pub enum SchemaFragment {
    Sdl(String),
    Document(TypeSystemDocument),
}

impl From<&str> for SchemaFragment {
    fn from(sdl: &str) -> Self {
        SchemaFragment::Sdl(sdl.to_string())
    }
}

impl From<String> for SchemaFragment {
    fn from(sdl: String) -> Self {
        SchemaFragment::Sdl(sdl)
    }
}

impl From<TypeSystemDocument> for SchemaFragment {
    fn from(document: TypeSystemDocument) -> Self {
        SchemaFragment::Document(document)
    }
}

/// Schema and resolvers, swapped as a unit
#[derive(Debug)]
struct GatewayState {
    schema: Arc<Schema>,
    resolvers: Arc<Resolvers>,
}

/// Everything `run` needs after compilation
struct Compiled {
    document: Arc<Document>,
    schema: Arc<Schema>,
    resolvers: Arc<Resolvers>,
}

pub struct QueryGateway<E: QueryEngine = GraphQLEngine> {
    engine: E,
    state: RwLock<GatewayState>,
    cache: CompiledQueryCache,
    base_context: Map<String, Value>,
    pubsub: Arc<PubSub>,
    ready: AtomicBool,
    metrics: Arc<MetricsRegistry>,
}

impl QueryGateway<GraphQLEngine> {
    /// Gateway over the bundled engine
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        Self::with_engine(config, GraphQLEngine)
    }
}

impl<E: QueryEngine> QueryGateway<E> {
    /// Gateway over a custom engine
    pub fn with_engine(config: GatewayConfig, engine: E) -> GatewayResult<Self> {
        let schema = config.schema.build()?;
        let metrics = Arc::new(MetricsRegistry::new());
        let pubsub = Arc::new(PubSub::with_metrics(config.pubsub, Arc::clone(&metrics)));

        let capacity = config.cache.capacity().to_string();
        log_event_with_fields(Event::GatewayInit, &[("cache_capacity", capacity.as_str())]);

        Ok(Self {
            engine,
            state: RwLock::new(GatewayState {
                schema: Arc::new(schema),
                resolvers: Arc::new(config.resolvers),
            }),
            cache: CompiledQueryCache::new(config.cache),
            base_context: config.context,
            pubsub,
            ready: AtomicBool::new(false),
            metrics,
        })
    }

    /// Validate the schema and start accepting requests.
    ///
    /// Fails with every structural issue; the gateway stays unready.
    pub fn ready(&self) -> GatewayResult<()> {
        let schema = self.schema();
        if let Err(err) = schema.validate() {
            let count = err.issues().len().to_string();
            log_event_with_fields(Event::SchemaInvalid, &[("issues", count.as_str())]);
            for issue in err.issues() {
                tracing::error!(issue = issue.as_str(), "schema issue");
            }
            return Err(GatewayError::SchemaInvalid(err));
        }
        self.ready.store(true, Ordering::SeqCst);
        log_event(Event::GatewayReady);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Run a query, mutation or subscription.
    ///
    /// Per-request failures are reported in the response, never as `Err`.
    pub async fn run(
        &self,
        source: &str,
        context: Map<String, Value>,
        variables: Map<String, Value>,
        operation_name: Option<&str>,
    ) -> QueryOutcome {
        if !self.is_ready() {
            self.metrics.increment_queries_rejected();
            log_event_with_fields(Event::QueryRejected, &[("reason", "not ready")]);
            return Response::from_error(QueryError::request(
                "Gateway is not ready: schema has not been validated.",
            ))
            .into();
        }

        let compiled = match self.compile(source) {
            Ok(compiled) => compiled,
            Err(response) => return response.into(),
        };

        let request = ExecutionRequest {
            schema: compiled.schema,
            document: compiled.document,
            resolvers: compiled.resolvers,
            context: RequestContext::new(
                RequestContext::merge(&self.base_context, context),
                Arc::clone(&self.pubsub),
            ),
            variables,
            operation_name: operation_name.map(str::to_string),
        };
        let outcome = self.engine.execute(request).await;

        self.metrics.increment_queries_executed();
        let status = match &outcome {
            QueryOutcome::Single(response) => response.status_code().to_string(),
            QueryOutcome::Stream(_) => "stream".to_string(),
        };
        log_event_with_fields(Event::QueryExecuted, &[("status", status.as_str())]);
        outcome
    }

    /// Resolve `source` to a validated document, via the caches when possible
    fn compile(&self, source: &str) -> Result<Compiled, Response> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let compiled = |document: Arc<Document>| Compiled {
            document,
            schema: Arc::clone(&state.schema),
            resolvers: Arc::clone(&state.resolvers),
        };

        if let Some(entry) = self.cache.lookup_success(source) {
            self.metrics.increment_cache_hits();
            log_event(Event::CacheHit);
            return Ok(compiled(Arc::clone(entry.document())));
        }
        if let Some(entry) = self.cache.lookup_failure(source) {
            self.metrics.increment_cache_failure_hits();
            log_event(Event::CachedFailureHit);
            return Err(Response::from_errors(entry.validation_errors().to_vec()));
        }
        self.metrics.increment_cache_misses();

        let document = match self.engine.parse(source) {
            Ok(document) => Arc::new(document),
            Err(err) => {
                self.metrics.increment_syntax_errors();
                log_event_with_fields(Event::QuerySyntaxError, &[("error", err.message.as_str())]);
                return Err(Response::from_error(err));
            }
        };

        let errors = self.engine.validate(&state.schema, &document);
        if !errors.is_empty() {
            self.metrics.increment_validation_failures();
            let count = errors.len().to_string();
            log_event_with_fields(Event::QueryValidationFailed, &[("errors", count.as_str())]);
            let entry = CacheEntry::failure(Arc::clone(&document), errors.clone());
            if let Err(err) = self.cache.store_failure(source, entry) {
                tracing::warn!(code = err.code(), "{}", err);
            }
            return Err(Response::from_errors(errors));
        }

        if let Err(err) = self.cache.store_success(source, CacheEntry::success(Arc::clone(&document))) {
            tracing::warn!(code = err.code(), "{}", err);
        }
        Ok(compiled(document))
    }

    /// Merge a schema fragment into the active schema.
    ///
    /// On a ready gateway the result must still pass structural validation.
    /// A rejected fragment leaves the schema and the caches untouched; an
    /// accepted one clears both caches.
    pub fn extend_schema(&self, fragment: impl Into<SchemaFragment>) -> GatewayResult<()> {
        match self.apply_extension(fragment.into()) {
            Ok(()) => {
                self.metrics.increment_schema_extensions();
                log_event(Event::SchemaExtended);
                log_event(Event::CacheInvalidated);
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                log_event_with_fields(Event::SchemaExtensionRejected, &[("reason", reason.as_str())]);
                Err(err)
            }
        }
    }

    fn apply_extension(&self, fragment: SchemaFragment) -> GatewayResult<()> {
        let document = match fragment {
            SchemaFragment::Sdl(sdl) => parse_schema(&sdl).map_err(SchemaError::syntax)?,
            SchemaFragment::Document(document) => document,
        };

        let mut state = self
            .state
            .write()
            .map_err(|_| GatewayError::Internal("Lock poisoned".into()))?;
        let extended = state.schema.extend(&document)?;
        if self.is_ready() {
            extended.validate()?;
        }
        state.schema = Arc::new(extended);
        self.cache.invalidate();
        Ok(())
    }

    /// Shallow-merge root resolvers; new bindings replace existing ones
    pub fn define_resolvers(&self, resolvers: impl Into<Resolvers>) -> GatewayResult<()> {
        let resolvers = resolvers.into();
        let mut state = self
            .state
            .write()
            .map_err(|_| GatewayError::Internal("Lock poisoned".into()))?;
        let mut merged = Resolvers::clone(&state.resolvers);
        merged.merge(resolvers);
        let count = merged.len().to_string();
        state.resolvers = Arc::new(merged);
        drop(state);

        log_event_with_fields(Event::ResolversDefined, &[("resolvers", count.as_str())]);
        Ok(())
    }

    /// Snapshot of the active schema
    pub fn schema(&self) -> Arc<Schema> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.schema)
    }

    /// Snapshot of the active root resolvers
    pub fn resolvers(&self) -> Arc<Resolvers> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.resolvers)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn cache(&self) -> &CompiledQueryCache {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn pubsub(&self) -> &Arc<PubSub> {
        &self.pubsub
    }

    /// A new subscription context on this gateway's pub/sub core
    pub fn subscription_context(&self) -> SubscriptionContext {
        SubscriptionContext::new(Arc::clone(&self.pubsub))
    }

    /// Finalize every subscription; later publishes fail
    pub fn shutdown(&self) {
        self.pubsub.shutdown();
    }
}
