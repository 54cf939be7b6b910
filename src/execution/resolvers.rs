//! Root resolvers
//!
//! Resolvers bind root field names to values. Three kinds:
//! - `Field`: async function of the field's arguments and request context
//! - `Value`: a static value
//! - `Subscription`: produces the event stream for a subscription field
//!
//! Fields below the root resolve by property lookup on their parent value.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use serde_json::{Map, Value};

use super::context::RequestContext;
use super::errors::FieldError;
use crate::realtime::SubscriptionContext;

/// Stream of event payloads feeding a subscription
pub type EventStream = BoxStream<'static, Value>;

/// Result of a field resolver
pub type FieldResult = Result<Value, FieldError>;

type FieldFn = dyn Fn(ResolverParams) -> BoxFuture<'static, FieldResult> + Send + Sync;

type SubscriptionFn = dyn Fn(ResolverParams, Arc<SubscriptionContext>) -> BoxFuture<'static, Result<EventStream, FieldError>>
    + Send
    + Sync;

/// What a resolver receives
#[derive(Debug, Clone)]
pub struct ResolverParams {
    /// Root field name
    pub field_name: String,
    /// Coerced arguments, defaults applied
    pub args: Map<String, Value>,
    pub context: RequestContext,
}

impl ResolverParams {
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.arg(name).and_then(Value::as_str)
    }

    pub fn arg_i64(&self, name: &str) -> Option<i64> {
        self.arg(name).and_then(Value::as_i64)
    }
}

/// A root field binding
#[derive(Clone)]
pub enum Resolver {
    Field(Arc<FieldFn>),
    Value(Value),
    Subscription(Arc<SubscriptionFn>),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Field(_) => write!(f, "Resolver::Field(..)"),
            Resolver::Value(value) => write!(f, "Resolver::Value({})", value),
            Resolver::Subscription(_) => write!(f, "Resolver::Subscription(..)"),
        }
    }
}

impl Resolver {
    /// Wrap an async function
    pub fn field<F, Fut>(resolve: F) -> Self
    where
        F: Fn(ResolverParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult> + Send + 'static,
    {
        Resolver::Field(Arc::new(move |params| resolve(params).boxed()))
    }

    /// Wrap an async function producing an event stream
    pub fn subscription<F, Fut>(subscribe: F) -> Self
    where
        F: Fn(ResolverParams, Arc<SubscriptionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EventStream, FieldError>> + Send + 'static,
    {
        Resolver::Subscription(Arc::new(move |params, context| {
            subscribe(params, context).boxed()
        }))
    }

    /// Subscribe the subscription's queue to a fixed topic
    pub fn topic(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Resolver::subscription(move |_params, context| {
            let subscribed = context
                .subscribe(&topic)
                .map(|stream| stream.boxed())
                .map_err(FieldError::from);
            async move { subscribed }
        })
    }
}

/// Root resolver map
#[derive(Debug, Clone, Default)]
pub struct Resolvers {
    entries: HashMap<String, Resolver>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an async field resolver
    pub fn field<F, Fut>(self, name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(ResolverParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult> + Send + 'static,
    {
        self.with(name, Resolver::field(resolve))
    }

    /// Bind a static value
    pub fn value(self, name: impl Into<String>, value: Value) -> Self {
        self.with(name, Resolver::Value(value))
    }

    /// Bind a subscription resolver
    pub fn subscription<F, Fut>(self, name: impl Into<String>, subscribe: F) -> Self
    where
        F: Fn(ResolverParams, Arc<SubscriptionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EventStream, FieldError>> + Send + 'static,
    {
        self.with(name, Resolver::subscription(subscribe))
    }

    /// Bind a subscription field to a fixed topic
    pub fn topic(self, name: impl Into<String>, topic: impl Into<String>) -> Self {
        self.with(name, Resolver::topic(topic))
    }

    pub fn with(mut self, name: impl Into<String>, resolver: Resolver) -> Self {
        self.insert(name, resolver);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, resolver: Resolver) {
        self.entries.insert(name.into(), resolver);
    }

    pub fn get(&self, name: &str) -> Option<&Resolver> {
        self.entries.get(name)
    }

    /// Shallow merge; bindings in `other` replace existing ones
    pub fn merge(&mut self, other: Resolvers) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Static root values, one binding per key
impl From<Map<String, Value>> for Resolvers {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            entries: values
                .into_iter()
                .map(|(name, value)| (name, Resolver::Value(value)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::PubSub;
    use serde_json::json;

    fn params(args: Value) -> ResolverParams {
        let Value::Object(args) = args else {
            panic!("args must be an object")
        };
        ResolverParams {
            field_name: "f".into(),
            args,
            context: RequestContext::new(Map::new(), Arc::new(PubSub::default())),
        }
    }

    #[tokio::test]
    async fn test_field_resolver() {
        let resolvers = Resolvers::new().field("hello", |params: ResolverParams| async move {
            let name = params.arg_str("name").unwrap_or("world").to_string();
            Ok(json!(format!("hello {}", name)))
        });

        let Some(Resolver::Field(resolve)) = resolvers.get("hello") else {
            panic!("expected a field resolver")
        };
        assert_eq!(resolve(params(json!({"name": "ada"}))).await, Ok(json!("hello ada")));
    }

    #[test]
    fn test_merge_new_keys_win() {
        let mut resolvers = Resolvers::new().value("a", json!(1)).value("b", json!(2));
        resolvers.merge(Resolvers::new().value("b", json!(3)).value("c", json!(4)));

        assert_eq!(resolvers.names(), vec!["a", "b", "c"]);
        assert!(matches!(resolvers.get("b"), Some(Resolver::Value(v)) if v == &json!(3)));
    }

    #[test]
    fn test_from_static_values() {
        let Value::Object(root) = json!({"version": "1.0"}) else {
            unreachable!()
        };
        let resolvers = Resolvers::from(root);
        assert_eq!(resolvers.len(), 1);
        assert!(matches!(resolvers.get("version"), Some(Resolver::Value(_))));
    }

    #[tokio::test]
    async fn test_topic_resolver_subscribes() {
        let pubsub = Arc::new(PubSub::default());
        let context = Arc::new(SubscriptionContext::new(Arc::clone(&pubsub)));
        let Resolver::Subscription(subscribe) = Resolver::topic("TICK") else {
            panic!("expected a subscription resolver")
        };

        let mut events = subscribe(params(json!({})), Arc::clone(&context)).await.unwrap();
        context.publish(crate::realtime::Event::new("TICK", json!({"tick": 1})));
        assert_eq!(events.next().await, Some(json!({"tick": 1})));
    }
}
