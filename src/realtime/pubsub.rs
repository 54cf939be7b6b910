//! # Pub/Sub Core
//!
//! Topic-addressed fan-out of payloads to registered queues.
//!
//! Delivery is at-most-once and best-effort: a queue registered after a
//! publish never sees it, a queue removed while a publish is in flight may or
//! may not. Registration and removal are idempotent per `(topic, queue)`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::errors::{RealtimeError, RealtimeResult};
use super::event::{Event, PublishReceipt};
use super::queue::{Queue, QueueId};
use crate::observability::{log_event, log_event_with_fields, Event as ObsEvent, MetricsRegistry};

/// Default maximum serialized payload size (64KB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 65536;

/// Pub/sub configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// Maximum serialized payload size in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Process-wide pub/sub core shared by every subscription context
#[derive(Debug)]
pub struct PubSub {
    /// Registered queues by topic
    topics: RwLock<HashMap<String, HashMap<QueueId, Queue>>>,

    config: PubSubConfig,

    shut_down: AtomicBool,

    metrics: Arc<MetricsRegistry>,
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new(PubSubConfig::default())
    }
}

impl PubSub {
    /// Create a pub/sub core with its own metrics
    pub fn new(config: PubSubConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRegistry::new()))
    }

    /// Create a pub/sub core reporting into a shared registry
    pub fn with_metrics(config: PubSubConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
            shut_down: AtomicBool::new(false),
            metrics,
        }
    }

    pub fn config(&self) -> &PubSubConfig {
        &self.config
    }

    /// Register `queue` on `topic`.
    ///
    /// Returns once the queue is registered; payloads published afterwards
    /// are delivered to it.
    pub fn subscribe(&self, topic: &str, queue: &Queue) -> RealtimeResult<()> {
        self.ensure_running()?;
        validate_topic(topic)?;

        let mut topics = self
            .topics
            .write()
            .map_err(|_| RealtimeError::Internal("Lock poisoned".into()))?;
        topics
            .entry(topic.to_string())
            .or_default()
            .insert(queue.id(), queue.clone());
        Ok(())
    }

    /// Remove `queue_id` from `topic`. Removing an absent queue is a no-op.
    pub fn unsubscribe(&self, topic: &str, queue_id: QueueId) {
        if let Ok(mut topics) = self.topics.write() {
            if let Some(queues) = topics.get_mut(topic) {
                queues.remove(&queue_id);
                if queues.is_empty() {
                    topics.remove(topic);
                }
            }
        }
    }

    /// Deliver the event payload to every queue registered on its topic
    pub fn publish(&self, event: &Event) -> RealtimeResult<PublishReceipt> {
        self.ensure_running()?;
        validate_topic(&event.topic)?;

        let size = event.payload_size()?;
        if size > self.config.max_payload_bytes {
            return Err(RealtimeError::MessageTooLarge(self.config.max_payload_bytes));
        }

        let topics = self
            .topics
            .read()
            .map_err(|_| RealtimeError::Internal("Lock poisoned".into()))?;

        let mut receipt = PublishReceipt::default();
        let mut stale = Vec::new();
        if let Some(queues) = topics.get(&event.topic) {
            receipt.matched = queues.len();
            for queue in queues.values() {
                // Closed queues are skipped, not an error
                if queue.push(event.payload.clone()) {
                    receipt.delivered += 1;
                } else {
                    receipt.skipped += 1;
                    stale.push(queue.id());
                }
            }
        }
        drop(topics);

        if !stale.is_empty() {
            self.sweep(&event.topic, &stale);
        }

        self.metrics.record_publish(receipt.delivered as u64);
        let delivered = receipt.delivered.to_string();
        log_event_with_fields(
            ObsEvent::EventPublished,
            &[("topic", event.topic.as_str()), ("delivered", delivered.as_str())],
        );
        Ok(receipt)
    }

    /// Drop registrations whose queue was closed or whose consumer went away
    fn sweep(&self, topic: &str, candidates: &[QueueId]) {
        if let Ok(mut topics) = self.topics.write() {
            if let Some(queues) = topics.get_mut(topic) {
                for id in candidates {
                    if queues.get(id).map_or(false, Queue::is_closed) {
                        queues.remove(id);
                    }
                }
                if queues.is_empty() {
                    topics.remove(topic);
                }
            }
        }
    }

    /// Number of queues registered on `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .map(|t| t.get(topic).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    /// Topics with at least one registered queue
    pub fn topic_count(&self) -> usize {
        self.topics.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Close every registered queue and refuse further traffic
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut topics) = self.topics.write() {
            for queue in topics.values().flat_map(HashMap::values) {
                queue.close();
            }
            topics.clear();
        }
        log_event(ObsEvent::PubSubShutdown);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub(crate) fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    fn ensure_running(&self) -> RealtimeResult<()> {
        if self.is_shut_down() {
            Err(RealtimeError::ShutDown)
        } else {
            Ok(())
        }
    }
}

fn validate_topic(topic: &str) -> RealtimeResult<()> {
    if topic.trim().is_empty() {
        return Err(RealtimeError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::queue::channel;
    use futures_util::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_to_subscriber() {
        let pubsub = PubSub::default();
        let (queue, mut stream) = channel();
        pubsub.subscribe("TICK", &queue).unwrap();

        let receipt = pubsub.publish(&Event::new("TICK", json!(1))).unwrap();
        assert_eq!(receipt.matched, 1);
        assert_eq!(receipt.delivered, 1);
        assert_eq!(stream.next().await, Some(json!(1)));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let pubsub = PubSub::default();
        let receipt = pubsub.publish(&Event::new("nobody", json!(null))).unwrap();
        assert_eq!(receipt, PublishReceipt::default());
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let pubsub = PubSub::default();
        let (queue, _stream) = channel();
        pubsub.subscribe("a", &queue).unwrap();
        pubsub.subscribe("a", &queue).unwrap();
        assert_eq!(pubsub.subscriber_count("a"), 1);

        pubsub.unsubscribe("a", queue.id());
        pubsub.unsubscribe("a", queue.id());
        assert_eq!(pubsub.subscriber_count("a"), 0);
        assert_eq!(pubsub.topic_count(), 0);
    }

    #[test]
    fn test_closed_queue_is_skipped() {
        let pubsub = PubSub::default();
        let (queue, _stream) = channel();
        pubsub.subscribe("a", &queue).unwrap();
        queue.close();

        let receipt = pubsub.publish(&Event::new("a", json!(1))).unwrap();
        assert_eq!(receipt.delivered, 0);
        assert_eq!(receipt.skipped, 1);
        assert_eq!(pubsub.subscriber_count("a"), 0);
    }

    #[test]
    fn test_dropped_consumer_is_swept_on_publish() {
        let pubsub = PubSub::default();
        let (live, _live_stream) = channel();
        let (orphan, orphan_stream) = channel();
        pubsub.subscribe("a", &live).unwrap();
        pubsub.subscribe("a", &orphan).unwrap();
        drop(orphan_stream);
        assert_eq!(pubsub.subscriber_count("a"), 2);

        let receipt = pubsub.publish(&Event::new("a", json!(1))).unwrap();
        assert_eq!(receipt.delivered, 1);
        assert_eq!(receipt.skipped, 1);
        assert_eq!(pubsub.subscriber_count("a"), 1);

        let receipt = pubsub.publish(&Event::new("a", json!(2))).unwrap();
        assert_eq!(receipt.matched, 1);
        assert_eq!(receipt.skipped, 0);
    }

    #[test]
    fn test_rejections() {
        let pubsub = PubSub::new(PubSubConfig { max_payload_bytes: 4 });
        let (queue, _stream) = channel();

        assert!(matches!(
            pubsub.subscribe(" ", &queue),
            Err(RealtimeError::InvalidTopic(_))
        ));
        assert_eq!(
            pubsub.publish(&Event::new("a", json!("too long"))),
            Err(RealtimeError::MessageTooLarge(4))
        );
        assert!(pubsub.publish(&Event::new("a", json!(1))).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_closes_queues() {
        let pubsub = PubSub::default();
        let (queue, mut stream) = channel();
        pubsub.subscribe("a", &queue).unwrap();

        pubsub.shutdown();
        assert_eq!(stream.next().await, None);
        assert_eq!(pubsub.subscribe("a", &queue), Err(RealtimeError::ShutDown));
        assert_eq!(
            pubsub.publish(&Event::new("a", json!(1))),
            Err(RealtimeError::ShutDown)
        );
        assert_eq!(pubsub.metrics().snapshot().events_published, 0);
    }
}
