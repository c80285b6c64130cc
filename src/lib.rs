//! Bytecache - A bounded in-process byte cache
//!
//! Provides a key-value cache with size-based LRU eviction, guarded for
//! concurrent access.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{ByteView, CacheStats, CacheStore, LruCache, Value};
pub use config::Config;
pub use error::{CacheError, Result};
