//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use serde::Serialize;

use crate::error::{CacheError, Result};

/// Default byte capacity used when nothing is configured.
pub const DEFAULT_MAX_BYTES: i64 = 2 << 10;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Maximum total bytes (keys plus values) the cache may hold, 0 = unbounded
    pub max_bytes: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_BYTES` - Byte capacity, 0 for unbounded (default: 2048)
    ///
    /// Unparsable or negative values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            max_bytes: env::var("CACHE_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v >= 0)
                .unwrap_or(DEFAULT_MAX_BYTES),
        }
    }

    /// Creates a Config with an explicit byte capacity.
    pub fn with_max_bytes(max_bytes: i64) -> Self {
        Self { max_bytes }
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes < 0 {
            return Err(CacheError::InvalidConfig(format!(
                "max_bytes must be >= 0, got {}",
                self.max_bytes
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}
