//! Query execution
//!
//! Runs validated documents against a schema and a set of root resolvers,
//! producing a single response or, for subscriptions, a stream of responses.

mod context;
mod errors;
mod executor;
mod resolvers;
mod response;
mod variables;

pub use context::RequestContext;
pub use errors::FieldError;
pub use executor::{execute, ExecutionRequest};
pub use resolvers::{EventStream, FieldResult, Resolver, ResolverParams, Resolvers};
pub use response::{QueryOutcome, Response, ResponseStream, STATUS_CLIENT_ERROR, STATUS_OK};
pub use variables::{coerce_arguments, coerce_variables};
