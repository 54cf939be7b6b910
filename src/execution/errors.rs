//! Resolver error type

use thiserror::Error;

use crate::realtime::RealtimeError;

/// Error returned by a resolver.
///
/// Rendered as an inline execution error at the field's path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<RealtimeError> for FieldError {
    fn from(error: RealtimeError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(FieldError::from("boom").to_string(), "boom");
        assert_eq!(
            FieldError::from(RealtimeError::ShutDown).message(),
            "Pub/sub is shut down"
        );
    }
}
