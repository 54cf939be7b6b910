//! Query language front end
//!
//! Lexing and parsing for two document kinds:
//!
//! - Executable documents (`query`, `mutation`, `subscription`)
//! - Type-system documents (SDL used to build and extend schemas)
//!
//! Parse failures are reported as syntax `QueryError`s carrying the source
//! location of the offending token.

mod ast;
mod lexer;
mod parser;

pub use ast::{
    Document, EnumTypeDefinition, Field, FieldDefinition, InputValue, InputValueDefinition,
    ObjectTypeDefinition, OperationDefinition, OperationKind, ScalarTypeDefinition,
    SchemaDefinition, TypeRef, TypeSystemDefinition, TypeSystemDocument, VariableDefinition,
};
pub use lexer::{tokenize, Token};
pub use parser::{parse_query, parse_schema, MAX_NESTING_DEPTH};
