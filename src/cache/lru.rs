//! LRU Cache Module
//!
//! Implements the unsynchronized eviction store: a key index plus an
//! index-linked recency list with byte accounting against a maximum.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::cache::Value;
use crate::error::{CacheError, Result};

/// Callback invoked with every entry removed by `remove_oldest`.
pub type OnEvicted<V> = Box<dyn FnMut(&str, &V) + Send>;

// Sentinel slots in `nodes`.
const HEAD: usize = 0; // most recently used end
const TAIL: usize = 1; // least recently used end
const NIL: usize = usize::MAX;

struct Node<V> {
    /// `None` for the sentinels and for slots on the free list.
    entry: Option<(String, V)>,
    /// Toward HEAD.
    prev: usize,
    /// Toward TAIL.
    next: usize,
}

impl<V> Node<V> {
    fn sentinel(prev: usize, next: usize) -> Self {
        Self {
            entry: None,
            prev,
            next,
        }
    }
}

// == LRU Cache ==
/// Byte-bounded LRU store. Not thread safe; see `CacheStore` for the
/// synchronized wrapper.
///
/// Nodes live in a `Vec` and link to each other by index:
/// - HEAD side = Most recently used
/// - TAIL side = Least recently used
///
/// `get`, `add` and `remove_oldest` are O(1) apart from the eviction loop.
pub struct LruCache<V> {
    /// Maximum allowed bytes, 0 = unbounded
    max_bytes: i64,
    /// Bytes currently charged to resident entries
    used_bytes: i64,
    /// Slot 0 = HEAD sentinel, 1 = TAIL sentinel, 2+ = entries
    nodes: Vec<Node<V>>,
    /// Key to slot in `nodes`
    index: HashMap<String, usize>,
    /// Reusable slots
    free: Vec<usize>,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V: Value> LruCache<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_bytes` - Capacity in bytes (keys plus values), 0 = unbounded
    /// * `on_evicted` - Optional callback run for each evicted entry
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted<V>>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            nodes: vec![Node::sentinel(NIL, TAIL), Node::sentinel(HEAD, NIL)],
            index: HashMap::new(),
            free: Vec::new(),
            on_evicted,
        }
    }

    // == Get ==
    /// Looks up a key and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].entry.as_ref().map(|(_, value)| value)
    }

    // == Add ==
    /// Inserts or replaces a value and marks its key most recently used,
    /// then evicts from the LRU end until the store fits `max_bytes`.
    ///
    /// Returns the number of entries evicted.
    ///
    /// # Errors
    /// `EmptyKey` or `InvalidSize` if the entry would break byte
    /// accounting. The store is left untouched in that case.
    pub fn add(&mut self, key: impl Into<String>, value: V) -> Result<usize> {
        let key = key.into();
        let size = checked_size(&key, &value)?;

        if let Some(&idx) = self.index.get(&key) {
            if let Some((_, old)) = self.nodes[idx].entry.as_mut() {
                self.used_bytes += size - old.size();
                *old = value;
            }
            self.move_to_front(idx);
        } else {
            let charged = key.len() as i64 + size;
            let idx = self.alloc(key.clone(), value);
            self.index.insert(key, idx);
            self.link_front(idx);
            self.used_bytes += charged;
        }

        let mut evicted = 0;
        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
            evicted += 1;
        }
        Ok(evicted)
    }

    // == Remove Oldest ==
    /// Removes the least recently used entry, running the eviction
    /// callback before returning it.
    ///
    /// Returns None if the store is empty.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.nodes[TAIL].prev;
        if idx == HEAD {
            return None;
        }
        self.unlink(idx);
        let (key, value) = self.nodes[idx].entry.take()?;
        self.free.push(idx);
        self.index.remove(&key);

        let freed = key.len() as i64 + value.size();
        self.used_bytes -= freed;
        debug!(key = %key, freed, used_bytes = self.used_bytes, "evicted oldest entry");

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&key, &value);
        }
        Some((key, value))
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without touching it.
    pub fn peek_oldest(&self) -> Option<&str> {
        let idx = self.nodes[TAIL].prev;
        self.nodes[idx].entry.as_ref().map(|(key, _)| key.as_str())
    }

    // == Contains ==
    /// Checks for a key without changing recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.len());
        let mut idx = self.nodes[HEAD].next;
        while idx != TAIL {
            if let Some((key, _)) = self.nodes[idx].entry.as_ref() {
                keys.push(key.as_str());
            }
            idx = self.nodes[idx].next;
        }
        keys
    }

    /// Recomputes the charged total by walking the list.
    #[cfg(test)]
    pub(crate) fn charged_bytes(&self) -> i64 {
        let mut total = 0;
        let mut idx = self.nodes[HEAD].next;
        while idx != TAIL {
            if let Some((key, value)) = self.nodes[idx].entry.as_ref() {
                total += key.len() as i64 + value.size();
            }
            idx = self.nodes[idx].next;
        }
        total
    }

    fn alloc(&mut self, key: String, value: V) -> usize {
        let node = Node {
            entry: Some((key, value)),
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn link_front(&mut self, idx: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = first;
        self.nodes[HEAD].next = idx;
        self.nodes[first].prev = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.nodes[HEAD].next != idx {
            self.unlink(idx);
            self.link_front(idx);
        }
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .field("on_evicted", &self.on_evicted.is_some())
            .finish_non_exhaustive()
    }
}

/// Validates an entry and returns its value size.
fn checked_size<V: Value>(key: &str, value: &V) -> Result<i64> {
    if key.is_empty() {
        return Err(CacheError::EmptyKey);
    }
    let size = value.size();
    if size <= 0 {
        return Err(CacheError::InvalidSize {
            key: key.to_string(),
            size,
        });
    }
    Ok(size)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Value whose size is whatever the test says it is.
    #[derive(Debug, Clone, PartialEq)]
    struct Weighted(i64);

    impl Value for Weighted {
        fn size(&self) -> i64 {
            self.0
        }
    }

    fn unbounded() -> LruCache<String> {
        LruCache::new(0, None)
    }

    #[test]
    fn test_lru_new() {
        let lru = unbounded();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.used_bytes(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_get_hit_and_miss() {
        let mut lru = unbounded();
        lru.add("key1", "1234".to_string()).unwrap();

        assert_eq!(lru.get("key1"), Some(&"1234".to_string()));
        assert_eq!(lru.get("key2"), None);
    }

    #[test]
    fn test_lru_add_charges_key_and_value() {
        let mut lru = unbounded();
        lru.add("key1", "1234".to_string()).unwrap();
        lru.add("k2", "v".to_string()).unwrap();

        assert_eq!(lru.used_bytes(), 8 + 3);
        assert_eq!(lru.charged_bytes(), lru.used_bytes());
    }

    #[test]
    fn test_lru_get_moves_to_front() {
        let mut lru = unbounded();
        lru.add("a", "1".to_string()).unwrap();
        lru.add("b", "1".to_string()).unwrap();
        lru.add("c", "1".to_string()).unwrap();

        assert_eq!(lru.peek_oldest(), Some("a"));

        lru.get("a");

        assert_eq!(lru.peek_oldest(), Some("b"));
        assert_eq!(lru.keys_by_recency(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = unbounded();
        lru.add("a", "1".to_string()).unwrap();
        lru.add("b", "1".to_string()).unwrap();
        lru.add("c", "1".to_string()).unwrap();

        lru.get("a");
        lru.get("c");
        lru.get("b");

        // front=[b, c, a]=back
        assert_eq!(lru.remove_oldest().map(|(k, _)| k), Some("a".to_string()));
        assert_eq!(lru.remove_oldest().map(|(k, _)| k), Some("c".to_string()));
        assert_eq!(lru.remove_oldest().map(|(k, _)| k), Some("b".to_string()));
        assert!(lru.is_empty());
        assert_eq!(lru.used_bytes(), 0);
    }

    #[test]
    fn test_lru_remove_oldest_empty() {
        let mut lru = unbounded();
        assert!(lru.remove_oldest().is_none());
        assert_eq!(lru.used_bytes(), 0);
    }

    #[test]
    fn test_lru_replace_adjusts_bytes() {
        let mut lru: LruCache<Weighted> = LruCache::new(0, None);
        lru.add("k", Weighted(5)).unwrap();
        lru.add("other", Weighted(1)).unwrap();
        let before = lru.used_bytes();

        lru.add("k", Weighted(9)).unwrap();

        assert_eq!(lru.len(), 2);
        assert_eq!(lru.used_bytes(), before + 4);
        assert_eq!(lru.get("k"), Some(&Weighted(9)));
        assert_eq!(lru.peek_oldest(), Some("other"));
    }

    #[test]
    fn test_lru_evicts_oldest_over_capacity() {
        // capacity = size(A) + size(B)
        let mut lru = LruCache::new(4 + 4, None);
        lru.add("A", "abc".to_string()).unwrap();
        lru.add("B", "abc".to_string()).unwrap();

        let evicted = lru.add("C", "abc".to_string()).unwrap();

        assert_eq!(evicted, 1);
        assert!(!lru.contains("A"));
        assert!(lru.contains("B"));
        assert!(lru.contains("C"));
        assert_eq!(lru.used_bytes(), 8);
    }

    #[test]
    fn test_lru_capacity_ten_scenario() {
        let mut lru: LruCache<Weighted> = LruCache::new(10, None);
        lru.add("ab", Weighted(2)).unwrap();
        assert_eq!(lru.used_bytes(), 4);

        lru.add("cd", Weighted(8)).unwrap();

        assert_eq!(lru.keys_by_recency(), vec!["cd"]);
        assert_eq!(lru.used_bytes(), 10);
    }

    #[test]
    fn test_lru_oversized_entry_empties_store() {
        let mut lru: LruCache<Weighted> = LruCache::new(10, None);
        lru.add("a", Weighted(2)).unwrap();

        let evicted = lru.add("big", Weighted(50)).unwrap();

        assert_eq!(evicted, 2);
        assert!(lru.is_empty());
        assert_eq!(lru.used_bytes(), 0);
    }

    #[test]
    fn test_lru_replace_can_trigger_eviction() {
        let mut lru: LruCache<Weighted> = LruCache::new(10, None);
        lru.add("a", Weighted(2)).unwrap();
        lru.add("b", Weighted(2)).unwrap();

        // growing "b" pushes the total to 12
        lru.add("b", Weighted(8)).unwrap();

        assert_eq!(lru.keys_by_recency(), vec!["b"]);
        assert_eq!(lru.used_bytes(), 9);
    }

    #[test]
    fn test_lru_on_evicted_called_per_entry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: OnEvicted<String> = Box::new(move |key, value| {
            sink.lock().unwrap().push((key.to_string(), value.clone()));
        });
        let mut lru = LruCache::new(10, Some(callback));

        lru.add("key1", "123456".to_string()).unwrap();
        lru.add("k2", "k2".to_string()).unwrap();
        lru.add("k3", "k3".to_string()).unwrap();
        lru.add("k4", "k4".to_string()).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("key1".to_string(), "123456".to_string()),
                ("k2".to_string(), "k2".to_string()),
            ]
        );
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_slots_are_reused() {
        let mut lru: LruCache<Weighted> = LruCache::new(6, None);
        for key in ["a", "b", "c", "d", "e", "f"] {
            lru.add(key, Weighted(2)).unwrap();
        }

        // two entries of 3 bytes fit, plus the two sentinels
        assert_eq!(lru.len(), 2);
        assert!(lru.nodes.len() <= 5);
        assert_eq!(lru.keys_by_recency(), vec!["f", "e"]);
    }

    #[test]
    fn test_lru_rejects_empty_key() {
        let mut lru = unbounded();
        assert_eq!(lru.add("", "v".to_string()), Err(CacheError::EmptyKey));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_rejects_non_positive_size() {
        let mut lru: LruCache<Weighted> = LruCache::new(0, None);
        lru.add("k", Weighted(3)).unwrap();

        assert!(matches!(
            lru.add("k", Weighted(0)),
            Err(CacheError::InvalidSize { size: 0, .. })
        ));
        assert!(matches!(
            lru.add("n", Weighted(-1)),
            Err(CacheError::InvalidSize { size: -1, .. })
        ));

        assert_eq!(lru.get("k"), Some(&Weighted(3)));
        assert_eq!(lru.used_bytes(), 4);
        assert_eq!(lru.len(), 1);
    }
}
