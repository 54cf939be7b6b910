//! Observability events for querygate
//!
//! Every lifecycle transition the gateway and pub/sub core go through is a
//! typed event. Events are explicit; free-form log lines are not used for
//! lifecycle reporting.

use std::fmt;

/// Observable events in querygate
///
/// Grouped by:
/// - Gateway lifecycle
/// - Schema evolution
/// - Query processing
/// - Subscriptions and pub/sub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Gateway constructed, not yet accepting requests
    GatewayInit,
    /// Startup validation passed, requests are accepted
    GatewayReady,
    /// Startup validation failed (FATAL)
    SchemaInvalid,

    // Schema evolution
    /// Schema fragment merged into the active schema
    SchemaExtended,
    /// Schema fragment rejected, active schema unchanged
    SchemaExtensionRejected,
    /// Root resolvers merged
    ResolversDefined,
    /// Both compiled-query stores cleared
    CacheInvalidated,

    // Query processing
    /// Compiled document found in the success store
    CacheHit,
    /// Validation errors found in the failure store
    CachedFailureHit,
    /// Query text failed to parse
    QuerySyntaxError,
    /// Query failed validation
    QueryValidationFailed,
    /// Query executed
    QueryExecuted,
    /// Query refused before execution
    QueryRejected,

    // Subscriptions
    /// Subscription queue registered on a topic
    SubscriptionOpened,
    /// Subscription context closed
    SubscriptionClosed,
    /// Event delivered to subscribed queues
    EventPublished,
    /// Event could not be published
    PublishFailed,
    /// Pub/sub core shut down, all queues finalized
    PubSubShutdown,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lifecycle
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::GatewayInit => "GATEWAY_INIT",
            Event::GatewayReady => "GATEWAY_READY",
            Event::SchemaInvalid => "SCHEMA_INVALID",

            // Schema
            Event::SchemaExtended => "SCHEMA_EXTENDED",
            Event::SchemaExtensionRejected => "SCHEMA_EXTENSION_REJECTED",
            Event::ResolversDefined => "RESOLVERS_DEFINED",
            Event::CacheInvalidated => "CACHE_INVALIDATED",

            // Query
            Event::CacheHit => "CACHE_HIT",
            Event::CachedFailureHit => "CACHED_FAILURE_HIT",
            Event::QuerySyntaxError => "QUERY_SYNTAX_ERROR",
            Event::QueryValidationFailed => "QUERY_VALIDATION_FAILED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",

            // Subscriptions
            Event::SubscriptionOpened => "SUBSCRIPTION_OPENED",
            Event::SubscriptionClosed => "SUBSCRIPTION_CLOSED",
            Event::EventPublished => "EVENT_PUBLISHED",
            Event::PublishFailed => "PUBLISH_FAILED",
            Event::PubSubShutdown => "PUBSUB_SHUTDOWN",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SchemaInvalid)
    }

    /// Returns true if this event reports a recoverable failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::SchemaExtensionRejected | Event::PublishFailed | Event::QueryRejected
        )
    }

    /// High-frequency events logged at debug level
    pub fn is_hot_path(&self) -> bool {
        matches!(
            self,
            Event::CacheHit
                | Event::CachedFailureHit
                | Event::QuerySyntaxError
                | Event::QueryValidationFailed
                | Event::QueryExecuted
                | Event::EventPublished
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::GatewayReady.as_str(), "GATEWAY_READY");
        assert_eq!(Event::QueryExecuted.to_string(), "QUERY_COMPLETE");
    }

    #[test]
    fn test_event_classes() {
        assert!(Event::SchemaInvalid.is_fatal());
        assert!(!Event::PublishFailed.is_fatal());
        assert!(Event::PublishFailed.is_failure());
        assert!(Event::CacheHit.is_hot_path());
        assert!(!Event::GatewayReady.is_hot_path());
    }
}
