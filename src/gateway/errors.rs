//! Gateway error types
//!
//! Per-request failures are never errors here; they are rendered into the
//! response. These errors cover construction, startup validation, schema
//! evolution and configuration loading.

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Startup validation failed; the gateway must not serve
    #[error("Schema failed startup validation: {0}")]
    SchemaInvalid(SchemaError),

    /// Schema text or extension rejected; the active schema is unchanged
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::SchemaInvalid(_) => "QG_GATEWAY_SCHEMA_INVALID",
            GatewayError::Schema(err) => err.code().code(),
            GatewayError::Config(_) => "QG_GATEWAY_CONFIG",
            GatewayError::Io(_) => "QG_GATEWAY_IO",
            GatewayError::Internal(_) => "QG_GATEWAY_INTERNAL",
        }
    }

    /// Fatal errors stop the gateway from becoming ready
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::SchemaInvalid(_))
    }

    /// Structural issues behind a failed startup validation
    pub fn issues(&self) -> &[String] {
        match self {
            GatewayError::SchemaInvalid(err) | GatewayError::Schema(err) => err.issues(),
            _ => &[],
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_fatality() {
        let invalid = GatewayError::SchemaInvalid(SchemaError::invalid(vec!["a".into(), "b".into()]));
        assert_eq!(invalid.code(), "QG_GATEWAY_SCHEMA_INVALID");
        assert!(invalid.is_fatal());
        assert_eq!(invalid.issues(), ["a", "b"]);

        let rejected = GatewayError::from(SchemaError::invalid_extension("dup"));
        assert_eq!(rejected.code(), "QG_SCHEMA_EXTENSION_INVALID");
        assert!(!rejected.is_fatal());

        let config = GatewayError::Config("missing".into());
        assert_eq!(config.to_string(), "Config error: missing");
    }
}
