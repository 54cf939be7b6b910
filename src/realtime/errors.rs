//! # Real-Time Errors
//!
//! Error types for the pub/sub core and subscription contexts.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    // ==================
    // Subscription Errors
    // ==================
    /// Invalid topic format
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// Subscription context already closed
    #[error("Subscription closed")]
    SubscriptionClosed,

    // ==================
    // Publish Errors
    // ==================
    /// Payload could not be serialized for size accounting
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Message too large
    #[error("Message too large (max: {0} bytes)")]
    MessageTooLarge(usize),

    /// Pub/sub core shut down
    #[error("Pub/sub is shut down")]
    ShutDown,

    // ==================
    // Internal Errors
    // ==================
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RealtimeError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RealtimeError::InvalidTopic(_) => "QG_PUBSUB_INVALID_TOPIC",
            RealtimeError::SubscriptionClosed => "QG_PUBSUB_SUBSCRIPTION_CLOSED",
            RealtimeError::InvalidPayload(_) => "QG_PUBSUB_INVALID_PAYLOAD",
            RealtimeError::MessageTooLarge(_) => "QG_PUBSUB_MESSAGE_TOO_LARGE",
            RealtimeError::ShutDown => "QG_PUBSUB_SHUT_DOWN",
            RealtimeError::Internal(_) => "QG_PUBSUB_INTERNAL",
        }
    }
}
