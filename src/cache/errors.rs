//! Cache error types
//!
//! Lookups never fail (a poisoned store is a miss); only stores report errors.

use std::fmt;

use thiserror::Error;

/// Which of the two compiled-query stores an operation targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Documents that validated cleanly
    Success,
    /// Documents with validation errors
    Failure,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Success => write!(f, "success"),
            StoreKind::Failure => write!(f, "failure"),
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Entry kind does not belong in the target store
    #[error("cannot store {found} entry in the {store} store")]
    KindMismatch { store: StoreKind, found: StoreKind },

    /// Store lock poisoned by a panicking holder
    #[error("{0} store lock poisoned")]
    Poisoned(StoreKind),
}

impl CacheError {
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::KindMismatch { .. } => "QG_CACHE_KIND_MISMATCH",
            CacheError::Poisoned(_) => "QG_CACHE_POISONED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CacheError::KindMismatch {
            store: StoreKind::Success,
            found: StoreKind::Failure,
        };
        assert_eq!(err.to_string(), "cannot store failure entry in the success store");
        assert_eq!(err.code(), "QG_CACHE_KIND_MISMATCH");
        assert_eq!(CacheError::Poisoned(StoreKind::Failure).to_string(), "failure store lock poisoned");
    }
}
