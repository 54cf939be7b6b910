//! Compiled-query cache
//!
//! Two bounded LRU stores keyed by the literal query source:
//! - success store: documents with zero validation errors
//! - failure store: documents with one or more validation errors
//!
//! Both are sized from a single [`CacheOption`]. A disabled option gives
//! both halves a store that never holds anything.

mod compiled;
mod errors;
mod option;
mod store;

pub use compiled::{CacheEntry, CompiledQueryCache};
pub use errors::{CacheError, CacheResult, StoreKind};
pub use option::{CacheOption, DEFAULT_CACHE_SIZE};
pub use store::{DocumentCache, LruDocumentCache, NullCache};
