//! Query Error Types
//!
//! Errors reported inline in a query response. Every per-request failure
//! (syntax, validation, execution) is data, never an `Err`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in query source text (1-based)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One step of a response path: a field response name or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Which stage of request processing produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// Malformed query text
    Syntax,
    /// Query does not validate against the schema
    Validation,
    /// Resolver or value completion failure
    #[default]
    Execution,
    /// Malformed request (variables, operation selection, gateway state)
    Request,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SYNTAX",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Execution => "EXECUTION",
            ErrorKind::Request => "REQUEST",
        }
    }
}

/// A query error as rendered in the `errors` list of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,

    #[serde(skip)]
    kind: ErrorKind,
}

impl QueryError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            kind,
        }
    }

    /// Syntax error at a source position
    pub fn syntax(message: impl AsRef<str>, location: Location) -> Self {
        Self::new(ErrorKind::Syntax, format!("Syntax Error: {}", message.as_ref()))
            .at(location)
    }

    /// Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Request-level error (bad variables, unknown operation)
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Request, message)
    }

    /// Attach a source location
    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Attach a response path
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(loc) = self.locations.first() {
            write!(f, " ({})", loc)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}
