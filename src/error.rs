//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Misses and capacity pressure are not errors. Only precondition
/// violations that would corrupt byte accounting are reported here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key has zero length
    #[error("Key must not be empty")]
    EmptyKey,

    /// Value reported a size that is zero or negative
    #[error("Invalid size {size} for key '{key}': value size must be positive")]
    InvalidSize { key: String, size: i64 },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
