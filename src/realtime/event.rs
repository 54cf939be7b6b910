//! # Pub/Sub Events
//!
//! A published event and the receipt returned to its publisher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{RealtimeError, RealtimeResult};

/// An event submitted by a publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Topic the event is addressed to
    pub topic: String,

    /// Value pushed to every queue subscribed to the topic
    pub payload: Value,
}

impl Event {
    /// Create an event
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Serialized payload size in bytes
    pub fn payload_size(&self) -> RealtimeResult<usize> {
        serde_json::to_vec(&self.payload)
            .map(|bytes| bytes.len())
            .map_err(|e| RealtimeError::InvalidPayload(e.to_string()))
    }
}

/// Completion report for one publish
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishReceipt {
    /// Number of queues subscribed to the topic at publish time
    pub matched: usize,
    /// Number of queues the payload was pushed to
    pub delivered: usize,
    /// Queues that were already closed (delivery skipped)
    pub skipped: usize,
}
