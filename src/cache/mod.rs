//! Cache Module
//!
//! Provides a byte-bounded LRU store and its synchronized front.

mod lru;
mod stats;
mod store;
mod value;


// Re-export public types
pub use lru::{LruCache, OnEvicted};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use value::{ByteView, Value};
