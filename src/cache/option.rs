//! Cache sizing option
//!
//! One option sizes both stores. Accepted forms when deserialized:
//! absent (default size), `true` (default size), `false` or `0` (disabled),
//! a positive integer (that many entries per store).

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::store::{DocumentCache, LruDocumentCache, NullCache};

/// Default number of entries per store
pub const DEFAULT_CACHE_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCacheOption", into = "RawCacheOption")]
pub enum CacheOption {
    /// Every lookup misses, nothing is stored
    Disabled,
    /// Both stores hold up to this many entries
    Size(NonZeroUsize),
}

impl Default for CacheOption {
    fn default() -> Self {
        Self::from_size(DEFAULT_CACHE_SIZE)
    }
}

impl CacheOption {
    /// Size both stores; zero disables caching
    pub fn from_size(size: usize) -> Self {
        NonZeroUsize::new(size).map_or(CacheOption::Disabled, CacheOption::Size)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheOption::Size(_))
    }

    /// Entries per store (zero when disabled)
    pub fn capacity(&self) -> usize {
        match self {
            CacheOption::Disabled => 0,
            CacheOption::Size(size) => size.get(),
        }
    }

    /// Build one store for this option
    pub(crate) fn build_store(&self) -> Box<dyn DocumentCache> {
        match self {
            CacheOption::Disabled => Box::new(NullCache),
            CacheOption::Size(size) => Box::new(LruDocumentCache::new(*size)),
        }
    }
}

impl From<bool> for CacheOption {
    fn from(enabled: bool) -> Self {
        if enabled {
            CacheOption::default()
        } else {
            CacheOption::Disabled
        }
    }
}

impl From<usize> for CacheOption {
    fn from(size: usize) -> Self {
        CacheOption::from_size(size)
    }
}

/// Wire form of [`CacheOption`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCacheOption {
    Flag(bool),
    Size(usize),
}

impl From<RawCacheOption> for CacheOption {
    fn from(raw: RawCacheOption) -> Self {
        match raw {
            RawCacheOption::Flag(enabled) => enabled.into(),
            RawCacheOption::Size(size) => size.into(),
        }
    }
}

impl From<CacheOption> for RawCacheOption {
    fn from(option: CacheOption) -> Self {
        match option {
            CacheOption::Disabled => RawCacheOption::Flag(false),
            CacheOption::Size(size) => RawCacheOption::Size(size.get()),
        }
    }
}
