//! # Subscription Context
//!
//! Per-subscription state: one owned queue, the topics it is registered on,
//! and a closed flag. Created when a subscription operation starts and torn
//! down by `close` or when the owner drops it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::errors::{RealtimeError, RealtimeResult};
use super::event::Event;
use super::pubsub::PubSub;
use super::queue::{channel, PayloadStream, Queue};
use crate::observability::{log_event_with_fields, Event as ObsEvent};

/// Binds one consumer queue to any number of topics
#[derive(Debug)]
pub struct SubscriptionContext {
    id: Uuid,
    pubsub: Arc<PubSub>,
    queue: Queue,
    stream: PayloadStream,
    topics: Mutex<HashSet<String>>,
    closed: AtomicBool,
}

impl SubscriptionContext {
    pub fn new(pubsub: Arc<PubSub>) -> Self {
        let (queue, stream) = channel();
        Self {
            id: Uuid::new_v4(),
            pubsub,
            queue,
            stream,
            topics: Mutex::new(HashSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register this context's queue on `topic` and return the queue as a
    /// stream.
    ///
    /// Every call returns a handle to the same queue; payloads from all
    /// subscribed topics arrive interleaved in publish order per topic.
    pub fn subscribe(&self, topic: &str) -> RealtimeResult<PayloadStream> {
        if self.is_closed() {
            return Err(RealtimeError::SubscriptionClosed);
        }
        self.pubsub.subscribe(topic, &self.queue)?;

        let newly_added = self
            .topics
            .lock()
            .map_err(|_| RealtimeError::Internal("Lock poisoned".into()))?
            .insert(topic.to_string());

        // A concurrent close may have drained the topic set already
        if self.is_closed() {
            self.pubsub.unsubscribe(topic, self.queue.id());
            return Err(RealtimeError::SubscriptionClosed);
        }

        if newly_added {
            self.pubsub.metrics().increment_subscriptions_opened();
            let id = self.id.to_string();
            log_event_with_fields(
                ObsEvent::SubscriptionOpened,
                &[("subscription", id.as_str()), ("topic", topic)],
            );
        }
        Ok(self.stream.clone())
    }

    /// Publish through the pub/sub core.
    ///
    /// Failures are logged and swallowed; the publisher never sees them.
    pub fn publish(&self, event: Event) {
        publish_logged(&self.pubsub, event);
    }

    /// Detach from every topic and finalize the queue. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let topics = match self.topics.lock() {
            Ok(mut topics) => std::mem::take(&mut *topics),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for topic in &topics {
            self.pubsub.unsubscribe(topic, self.queue.id());
        }
        self.queue.close();

        self.pubsub.metrics().increment_subscriptions_closed();
        let id = self.id.to_string();
        let count = topics.len().to_string();
        log_event_with_fields(
            ObsEvent::SubscriptionClosed,
            &[("subscription", id.as_str()), ("topics", count.as_str())],
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Topics currently subscribed, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .topics
            .lock()
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default();
        topics.sort();
        topics
    }
}

/// Publish through `pubsub`, logging and counting failures instead of
/// returning them
pub(crate) fn publish_logged(pubsub: &PubSub, event: Event) {
    if let Err(error) = pubsub.publish(&event) {
        pubsub.metrics().increment_publish_failures();
        tracing::error!(
            topic = %event.topic,
            code = error.code(),
            error = %error,
            "failed to publish event"
        );
        log_event_with_fields(
            ObsEvent::PublishFailed,
            &[("topic", event.topic.as_str()), ("code", error.code())],
        );
    }
}

impl Drop for SubscriptionContext {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let pubsub = Arc::new(PubSub::default());
        let context = SubscriptionContext::new(Arc::clone(&pubsub));
        let mut stream = context.subscribe("TICK").unwrap();

        context.publish(Event::new("TICK", json!(1)));
        context.publish(Event::new("TICK", json!(2)));

        assert_eq!(stream.next().await, Some(json!(1)));
        assert_eq!(stream.next().await, Some(json!(2)));
        assert_eq!(context.topics(), vec!["TICK".to_string()]);
    }

    #[tokio::test]
    async fn test_multiple_topics_share_queue() {
        let pubsub = Arc::new(PubSub::default());
        let context = SubscriptionContext::new(Arc::clone(&pubsub));
        let mut a = context.subscribe("a").unwrap();
        let _b = context.subscribe("b").unwrap();

        pubsub.publish(&Event::new("b", json!("from b"))).unwrap();
        assert_eq!(a.next().await, Some(json!("from b")));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_detaches() {
        let pubsub = Arc::new(PubSub::default());
        let context = SubscriptionContext::new(Arc::clone(&pubsub));
        let mut stream = context.subscribe("a").unwrap();

        context.close();
        context.close();

        assert!(context.is_closed());
        assert_eq!(pubsub.subscriber_count("a"), 0);
        assert_eq!(stream.next().await, None);
        assert_eq!(context.subscribe("a").unwrap_err(), RealtimeError::SubscriptionClosed);
        assert_eq!(pubsub.metrics().snapshot().subscriptions_closed, 1);
    }

    #[test]
    fn test_publish_failure_is_swallowed() {
        let pubsub = Arc::new(PubSub::default());
        let context = SubscriptionContext::new(Arc::clone(&pubsub));
        pubsub.shutdown();

        context.publish(Event::new("a", json!(1)));
        assert_eq!(pubsub.metrics().snapshot().publish_failures, 1);
    }

    #[test]
    fn test_drop_detaches() {
        let pubsub = Arc::new(PubSub::default());
        {
            let context = SubscriptionContext::new(Arc::clone(&pubsub));
            context.subscribe("a").unwrap();
            assert_eq!(pubsub.subscriber_count("a"), 1);
        }
        assert_eq!(pubsub.subscriber_count("a"), 0);
    }
}
