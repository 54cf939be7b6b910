//! # querygate Real-Time Module
//!
//! Subscription plumbing for live queries.
//!
//! ## Architecture
//!
//! - **Pub/Sub Core**: topic-addressed fan-out to registered queues
//! - **Queues**: unbounded single-consumer payload queues exposed as streams
//! - **Subscription Context**: one queue per subscription, bound to topics,
//!   with idempotent teardown
//!
//! Delivery is at-most-once and best-effort. Publishers never block on slow
//! consumers; backpressure is not propagated upstream.

pub mod context;
pub mod errors;
pub mod event;
pub mod pubsub;
pub mod queue;

pub use context::SubscriptionContext;
pub use errors::{RealtimeError, RealtimeResult};
pub use event::{Event, PublishReceipt};
pub use pubsub::{PubSub, PubSubConfig, DEFAULT_MAX_PAYLOAD_BYTES};
pub use queue::{channel, PayloadStream, Queue, QueueId};
