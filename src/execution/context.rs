//! Per-request context handed to resolvers

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::realtime::{Event, PubSub, SubscriptionContext};

/// Context values plus access to the pub/sub core.
///
/// Values are the gateway's base context overlaid with the caller's context;
/// caller keys win.
#[derive(Debug, Clone)]
pub struct RequestContext {
    values: Arc<Map<String, Value>>,
    pubsub: Arc<PubSub>,
    subscription: Option<Arc<SubscriptionContext>>,
}

impl RequestContext {
    pub fn new(values: Map<String, Value>, pubsub: Arc<PubSub>) -> Self {
        Self {
            values: Arc::new(values),
            pubsub,
            subscription: None,
        }
    }

    /// Overlay `overrides` on `base`
    pub fn merge(base: &Map<String, Value>, overrides: Map<String, Value>) -> Map<String, Value> {
        let mut merged = base.clone();
        merged.extend(overrides);
        merged
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn pubsub(&self) -> &Arc<PubSub> {
        &self.pubsub
    }

    /// The subscription this request runs under, for subscription operations
    pub fn subscription(&self) -> Option<&Arc<SubscriptionContext>> {
        self.subscription.as_ref()
    }

    /// Publish an event; failures are logged, never returned
    pub fn publish(&self, event: Event) {
        match &self.subscription {
            Some(subscription) => subscription.publish(event),
            None => crate::realtime::context::publish_logged(&self.pubsub, event),
        }
    }

    pub(crate) fn with_subscription(&self, subscription: Arc<SubscriptionContext>) -> Self {
        Self {
            values: Arc::clone(&self.values),
            pubsub: Arc::clone(&self.pubsub),
            subscription: Some(subscription),
        }
    }
}
