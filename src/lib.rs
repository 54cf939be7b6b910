//! querygate - query compilation cache and subscription pub/sub bridge
//!
//! The request-time core of a GraphQL gateway:
//!
//! - `gateway`: [`QueryGateway`] runs queries through a two-store compiled
//!   query cache and owns schema evolution
//! - `realtime`: topic pub/sub and per-subscription contexts
//! - `language`, `schema`, `validation`, `execution`: the bundled engine
//!
//! ```ignore
//! use querygate::{GatewayConfig, QueryGateway, Resolvers};
//!
//! let gateway = QueryGateway::new(GatewayConfig::new())?;
//! gateway.extend_schema("extend type Query { ping: String }")?;
//! gateway.define_resolvers(Resolvers::new().value("ping", "pong".into()))?;
//! gateway.ready()?;
//! let response = gateway.run("{ ping }", Default::default(), Default::default(), None).await;
//! ```

pub mod cache;
pub mod cli;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod language;
pub mod observability;
pub mod realtime;
pub mod schema;
pub mod validation;

pub use error::QueryError;
pub use execution::{QueryOutcome, Resolvers, Response};
pub use gateway::{GatewayConfig, GatewayError, QueryGateway};
