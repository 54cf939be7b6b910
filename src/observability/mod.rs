//! Observability subsystem for querygate
//!
//! - Structured logging through `tracing`
//! - Counter metrics
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background tasks
//!
//! # Usage
//!
//! ```ignore
//! use querygate::observability::{log_event, log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event(Event::GatewayReady);
//! log_event_with_fields(Event::EventPublished, &[("topic", "TICK"), ("delivered", "2")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Known field keys, recorded as structured `tracing` fields
#[derive(Debug, Default, PartialEq)]
struct EventFields<'a> {
    cache_capacity: Option<&'a str>,
    code: Option<&'a str>,
    delivered: Option<&'a str>,
    error: Option<&'a str>,
    errors: Option<&'a str>,
    issues: Option<&'a str>,
    path: Option<&'a str>,
    reason: Option<&'a str>,
    resolvers: Option<&'a str>,
    status: Option<&'a str>,
    subscription: Option<&'a str>,
    topic: Option<&'a str>,
    topics: Option<&'a str>,
    /// Keys outside the known set, rendered `key=value`
    extra: Option<String>,
}

impl<'a> EventFields<'a> {
    fn collect(fields: &[(&'a str, &'a str)]) -> Self {
        let mut out = EventFields::default();
        let mut extra = Vec::new();
        for &(key, value) in fields {
            let slot = match key {
                "cache_capacity" => &mut out.cache_capacity,
                "code" => &mut out.code,
                "delivered" => &mut out.delivered,
                "error" => &mut out.error,
                "errors" => &mut out.errors,
                "issues" => &mut out.issues,
                "path" => &mut out.path,
                "reason" => &mut out.reason,
                "resolvers" => &mut out.resolvers,
                "status" => &mut out.status,
                "subscription" => &mut out.subscription,
                "topic" => &mut out.topic,
                "topics" => &mut out.topics,
                _ => {
                    extra.push(format!("{}={}", key, value));
                    continue;
                }
            };
            *slot = Some(value);
        }
        if !extra.is_empty() {
            out.extra = Some(extra.join(" "));
        }
        out
    }
}

macro_rules! emit_event {
    ($level:expr, $name:expr, $f:expr) => {
        tracing::event!(
            $level,
            event = $name,
            cache_capacity = $f.cache_capacity,
            code = $f.code,
            delivered = $f.delivered,
            error = $f.error,
            errors = $f.errors,
            issues = $f.issues,
            path = $f.path,
            reason = $f.reason,
            resolvers = $f.resolvers,
            status = $f.status,
            subscription = $f.subscription,
            topic = $f.topic,
            topics = $f.topics,
            extra = $f.extra.as_deref(),
            "{}",
            $name
        )
    };
}

/// Log a lifecycle event with fields
///
/// Fatal events log at ERROR, failures at WARN, hot-path events at DEBUG and
/// everything else at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let fields = EventFields::collect(fields);
    let name = event.as_str();
    if event.is_fatal() {
        emit_event!(tracing::Level::ERROR, name, fields);
    } else if event.is_failure() {
        emit_event!(tracing::Level::WARN, name, fields);
    } else if event.is_hot_path() {
        emit_event!(tracing::Level::DEBUG, name, fields);
    } else {
        emit_event!(tracing::Level::INFO, name, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_become_fields() {
        assert_eq!(EventFields::collect(&[]), EventFields::default());

        let fields = EventFields::collect(&[("topic", "TICK"), ("delivered", "2")]);
        assert_eq!(fields.topic, Some("TICK"));
        assert_eq!(fields.delivered, Some("2"));
        assert_eq!(fields.extra, None);
    }

    /// Captures the fields of every event it sees
    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>);

    impl tracing::field::Visit for Capture {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0
                .lock()
                .unwrap()
                .push((field.name().to_string(), format!("{:?}", value)));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0
                .lock()
                .unwrap()
                .push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = self.clone();
            event.record(&mut visitor);
        }
    }

    #[test]
    fn test_fields_reach_subscriber_as_key_values() {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            log_event_with_fields(Event::PublishFailed, &[("topic", "TICK"), ("code", "QG_X")]);
        });

        let recorded = capture.0.lock().unwrap().clone();
        assert!(recorded.contains(&("event".to_string(), "PUBLISH_FAILED".to_string())));
        assert!(recorded.contains(&("topic".to_string(), "TICK".to_string())));
        assert!(recorded.contains(&("code".to_string(), "QG_X".to_string())));
        assert!(!recorded.iter().any(|(key, _)| key == "status"));
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let fields = EventFields::collect(&[("status", "400"), ("shard", "3"), ("zone", "b")]);
        assert_eq!(fields.status, Some("400"));
        assert_eq!(fields.extra.as_deref(), Some("shard=3 zone=b"));
    }

    #[test]
    fn test_log_event() {
        // no subscriber installed, must not panic
        log_event(Event::GatewayInit);
        log_event(Event::SchemaInvalid);
        log_event_with_fields(Event::PublishFailed, &[("topic", "t")]);
    }
}
