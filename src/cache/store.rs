//! Cache Store Module
//!
//! Thread-safe cache front: one exclusive lock around a lazily built
//! `LruCache`, plus hit/miss/eviction statistics.

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheStats, LruCache, Value};
use crate::config::Config;
use crate::error::Result;

#[derive(Debug)]
struct Inner<V> {
    /// Built on the first `add`
    lru: Option<LruCache<V>>,
    stats: CacheStats,
}

// == Cache Store ==
/// Synchronized byte-bounded LRU cache.
///
/// Every call holds the same lock for its whole duration, lazy
/// construction and evictions included, so calls are linearizable.
/// Share it between threads with `Arc<CacheStore<V>>`.
#[derive(Debug)]
pub struct CacheStore<V> {
    inner: Mutex<Inner<V>>,
    /// Capacity handed to the store when it is built
    max_bytes: i64,
}

impl<V: Value + Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty cache. No storage is allocated until the first `add`.
    ///
    /// # Arguments
    /// * `max_bytes` - Capacity in bytes (keys plus values), 0 = unbounded
    pub fn new(max_bytes: i64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                lru: None,
                stats: CacheStats::new(max_bytes),
            }),
            max_bytes,
        }
    }

    /// Creates a cache from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        info!(max_bytes = config.max_bytes, "cache configured");
        Ok(Self::new(config.max_bytes))
    }

    // == Add ==
    /// Stores a value, evicting least recently used entries if the cache
    /// grows past its capacity.
    ///
    /// # Errors
    /// `EmptyKey` or `InvalidSize`; the cache is not modified.
    pub fn add(&self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        let mut inner = self.inner.lock();
        let Inner { lru, stats } = &mut *inner;

        let lru = lru.get_or_insert_with(|| {
            debug!(max_bytes = self.max_bytes, "building lru store on first add");
            LruCache::new(self.max_bytes, None)
        });

        match lru.add(key.as_str(), value) {
            Ok(evicted) => {
                stats.record_evictions(evicted);
                Ok(())
            }
            Err(err) => {
                warn!(key = %key, error = %err, "rejected cache add");
                Err(err)
            }
        }
    }

    // == Get ==
    /// Returns a clone of the cached value and marks it most recently used.
    ///
    /// A lookup before the first `add` is a miss and does not build the store.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let Inner { lru, stats } = &mut *inner;

        let value = lru.as_mut().and_then(|lru| lru.get(key).cloned());
        if value.is_some() {
            trace!(key, "cache hit");
            stats.record_hit();
        } else {
            trace!(key, "cache miss");
            stats.record_miss();
        }
        value
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying store has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().lru.is_some()
    }

    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        if let Some(lru) = inner.lru.as_ref() {
            stats.set_occupancy(lru.len(), lru.used_bytes());
        }
        stats
    }
}
