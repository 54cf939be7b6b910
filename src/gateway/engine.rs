//! Query engine seam
//!
//! The gateway drives parsing, validation and execution through
//! [`QueryEngine`] so the compiled-query cache can sit in front of any
//! implementation. [`GraphQLEngine`] is the bundled one.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::error::QueryError;
use crate::execution::{execute, ExecutionRequest, QueryOutcome};
use crate::language::{parse_query, Document};
use crate::schema::Schema;
use crate::validation::validate;

/// Parse, validate and execute primitives
pub trait QueryEngine: Send + Sync {
    /// Parse query text; failures are syntax errors
    fn parse(&self, source: &str) -> Result<Document, QueryError>;

    /// Validate a parsed document; an empty list means valid
    fn validate(&self, schema: &Schema, document: &Document) -> Vec<QueryError>;

    /// Execute a validated document
    fn execute(&self, request: ExecutionRequest) -> BoxFuture<'static, QueryOutcome> {
        execute(request).boxed()
    }
}

/// The bundled GraphQL engine
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphQLEngine;

impl QueryEngine for GraphQLEngine {
    fn parse(&self, source: &str) -> Result<Document, QueryError> {
        parse_query(source)
    }

    fn validate(&self, schema: &Schema, document: &Document) -> Vec<QueryError> {
        validate(schema, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_engine_primitives() {
        let engine = GraphQLEngine;
        let schema = Schema::from_sdl("type Query { ping: String }").unwrap();

        assert!(engine.parse("{ ping").unwrap_err().is_syntax());

        let document = engine.parse("{ ping }").unwrap();
        assert!(engine.validate(&schema, &document).is_empty());

        let document = engine.parse("{ pong }").unwrap();
        let errors = engine.validate(&schema, &document);
        assert_eq!(errors[0].message, "Cannot query field \"pong\" on type \"Query\".");
    }
}
