//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::io;

use thiserror::Error;

use crate::gateway::GatewayError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration or schema file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Schema failed startup validation
    SchemaInvalid,
    /// The query response carried errors
    QueryFailed,
    /// Could not start the async runtime
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QG_CLI_CONFIG_ERROR",
            Self::IoError => "QG_CLI_IO_ERROR",
            Self::SchemaInvalid => "QG_CLI_SCHEMA_INVALID",
            Self::QueryFailed => "QG_CLI_QUERY_FAILED",
            Self::BootFailed => "QG_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
#[error("{}: {}", .code.code(), .message)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn schema_invalid(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SchemaInvalid, msg)
    }

    pub fn query_failed(status: u16) -> Self {
        Self::new(
            CliErrorCode::QueryFailed,
            format!("Query response carried errors (status {})", status),
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<GatewayError> for CliError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::SchemaInvalid(_) => Self::schema_invalid(e.to_string()),
            GatewayError::Io(_) => Self::io_error(e.to_string()),
            _ => Self::config_error(e.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    #[test]
    fn test_display_and_conversion() {
        let err = CliError::query_failed(400);
        assert_eq!(err.to_string(), "QG_CLI_QUERY_FAILED: Query response carried errors (status 400)");

        let err = CliError::from(GatewayError::SchemaInvalid(SchemaError::invalid(vec!["x".into()])));
        assert_eq!(err.code(), CliErrorCode::SchemaInvalid);
        assert!(err.message().contains("x"));

        let err = CliError::from(GatewayError::Config("bad".into()));
        assert_eq!(err.code_str(), "QG_CLI_CONFIG_ERROR");
    }
}
