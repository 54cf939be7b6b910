//! Schema subsystem for querygate
//!
//! A schema is built from SDL, may be extended before and after the gateway
//! becomes ready, and must pass structural validation before any request is
//! served.
//!
//! # Design Principles
//!
//! - Extensions produce a new schema; the active one is never mutated in place
//! - A rejected extension leaves the active schema unchanged
//! - Validation collects every issue instead of stopping at the first

mod builder;
mod coercion;
mod errors;
mod types;
mod validator;

pub use coercion::{check_literal, coerce_input, serialize_leaf};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use types::{
    ArgumentDef, EnumType, FieldDef, NamedType, ObjectType, ScalarType, Schema, BUILTIN_SCALARS,
};
pub use validator::SchemaValidator;
