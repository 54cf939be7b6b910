//! Query document validation
//!
//! Checks a parsed document against a schema before it is executed or cached.
//! Every failure found is reported; an empty list means the document may be
//! stored in the success cache.

mod validator;

pub use validator::{validate, DocumentValidator, TYPENAME_FIELD};
