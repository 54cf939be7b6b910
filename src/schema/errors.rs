//! Schema error types
//!
//! Error codes:
//! - QG_SCHEMA_SYNTAX (REJECT)
//! - QG_SCHEMA_EXTENSION_INVALID (REJECT)
//! - QG_SCHEMA_INVALID (FATAL at startup)

use std::fmt;

use crate::error::QueryError;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The mutation is rejected, the active schema is unchanged
    Reject,
    /// The gateway must not become ready
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// SDL text failed to parse
    QgSchemaSyntax,
    /// Extension conflicts with the existing schema
    QgSchemaExtensionInvalid,
    /// Schema failed structural validation
    QgSchemaInvalid,
}

impl SchemaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::QgSchemaSyntax => "QG_SCHEMA_SYNTAX",
            SchemaErrorCode::QgSchemaExtensionInvalid => "QG_SCHEMA_EXTENSION_INVALID",
            SchemaErrorCode::QgSchemaInvalid => "QG_SCHEMA_INVALID",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::QgSchemaInvalid => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with every issue found
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    issues: Vec<String>,
}

impl SchemaError {
    /// SDL failed to parse
    pub fn syntax(error: QueryError) -> Self {
        Self {
            code: SchemaErrorCode::QgSchemaSyntax,
            message: error.to_string(),
            issues: Vec::new(),
        }
    }

    /// An extension or definition conflicts with the schema
    pub fn invalid_extension(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::QgSchemaExtensionInvalid,
            message: reason.into(),
            issues: Vec::new(),
        }
    }

    /// Structural validation failed
    pub fn invalid(issues: Vec<String>) -> Self {
        Self {
            code: SchemaErrorCode::QgSchemaInvalid,
            message: "schema issues".into(),
            issues,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Individual structural issues (empty unless `QG_SCHEMA_INVALID`)
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
