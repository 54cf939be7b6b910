//! Gateway module for querygate
//!
//! Ties the compiled-query cache, the query engine, root resolvers and the
//! pub/sub core together behind [`QueryGateway`].

mod config;
mod engine;
mod errors;
#[allow(clippy::module_inception)]
mod gateway;

pub use config::{ConfigFile, GatewayConfig, SchemaSource};
pub use engine::{GraphQLEngine, QueryEngine};
pub use errors::{GatewayError, GatewayResult};
pub use gateway::{QueryGateway, SchemaFragment};
