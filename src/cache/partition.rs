//! Partition Module
//!
//! One independently locked, bounded LRU container.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::lru::{LruList, SlotIdx};
use crate::cache::CacheStats;

// == Partition State ==
/// Lookup map and recency list, always mutated together under the lock.
#[derive(Debug)]
struct PartitionState {
    /// Key to slot in `order`
    index: HashMap<Vec<u8>, SlotIdx>,
    /// Entries, most recently used first
    order: LruList<Vec<u8>, Vec<u8>>,
    stats: CacheStats,
    /// Bumped by every `put` and `delete`, not by `fill`
    generation: u64,
}

impl PartitionState {
    /// Inserts or overwrites at the MRU position, evicting at capacity.
    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>, capacity: usize) {
        if let Some(idx) = self.index.get(&key).copied() {
            if let Some(slot) = self.order.get_mut(idx) {
                *slot = value;
            }
            self.order.touch(idx);
            return;
        }

        if self.order.len() >= capacity {
            if let Some((evicted, _)) = self.order.pop_back() {
                self.index.remove(&evicted);
                self.stats.record_eviction();
                trace!(key = ?String::from_utf8_lossy(&evicted), "evicted");
            }
        }

        let idx = self.order.push_front(key.clone(), value);
        self.index.insert(key, idx);
    }
}

// == Partition ==
/// A bounded LRU cache guarded by its own exclusive lock.
///
/// Every operation holds the lock for its whole duration, including the
/// recency-list update and the counter bump.
#[derive(Debug)]
pub struct Partition {
    state: Mutex<PartitionState>,
    capacity: usize,
}

impl Partition {
    // == Constructor ==
    /// Creates an empty partition holding at most `capacity` entries.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(PartitionState {
                index: HashMap::with_capacity(capacity),
                order: LruList::with_capacity(capacity),
                stats: CacheStats::new(),
                generation: 0,
            }),
            capacity,
        }
    }

    // == Get ==
    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.index.get(key).copied() {
            Some(idx) => {
                state.order.touch(idx);
                state.stats.record_hit();
                state.order.get(idx).cloned()
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or overwrites `key`, evicting the least recently used entry
    /// when a new key arrives at a full partition.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.insert(key, value, self.capacity);
    }

    // == Fill ==
    /// Caches a value read from the backing store, unless a `put` or
    /// `delete` reached this partition after `generation` was taken.
    ///
    /// Returns whether the value was cached.
    pub fn fill(&self, key: Vec<u8>, value: Vec<u8>, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.insert(key, value, self.capacity);
        true
    }

    /// Current write generation, see [`fill`](Self::fill).
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether an entry was removed.
    pub fn delete(&self, key: &[u8]) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.generation += 1;

        match state.index.remove(key) {
            Some(idx) => {
                state.order.remove(idx);
                true
            }
            None => false,
        }
    }

    // == Stats ==
    /// Snapshot of this partition's counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats;
        stats.set_total_entries(state.order.len());
        stats
    }

    /// Returns true if `key` is cached, without touching recency or counters.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.state.lock().index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.state.lock().order.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn put(p: &Partition, key: &str, value: &str) {
        p.put(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }

    fn get(p: &Partition, key: &str) -> Option<String> {
        p.get(key.as_bytes())
            .map(|v| String::from_utf8(v).unwrap())
    }

    #[test]
    fn test_partition_new() {
        let p = Partition::new(10);
        assert!(p.is_empty());
        assert_eq!(p.capacity(), 10);
    }

    #[test]
    fn test_partition_zero_capacity_is_one() {
        let p = Partition::new(0);
        assert_eq!(p.capacity(), 1);

        put(&p, "a", "1");
        put(&p, "b", "2");
        assert_eq!(p.len(), 1);
        assert_eq!(get(&p, "b").as_deref(), Some("2"));
    }

    #[test]
    fn test_partition_put_and_get() {
        let p = Partition::new(10);

        put(&p, "key1", "value1");
        assert_eq!(get(&p, "key1").as_deref(), Some("value1"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_partition_get_nonexistent_counts_miss() {
        let p = Partition::new(10);

        assert_eq!(get(&p, "nope"), None);
        let stats = p.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_partition_overwrite_keeps_len() {
        let p = Partition::new(10);

        put(&p, "key1", "value1");
        put(&p, "key1", "value2");

        assert_eq!(get(&p, "key1").as_deref(), Some("value2"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_partition_overwrite_refreshes_recency() {
        let p = Partition::new(2);

        put(&p, "a", "1");
        put(&p, "b", "2");
        put(&p, "a", "10");
        put(&p, "c", "3");

        assert!(p.contains(b"a"));
        assert!(!p.contains(b"b"));
        assert!(p.contains(b"c"));
    }

    #[test]
    fn test_partition_delete() {
        let p = Partition::new(10);

        put(&p, "key1", "value1");
        assert!(p.delete(b"key1"));
        assert!(p.is_empty());
        assert_eq!(get(&p, "key1"), None);

        // idempotent
        assert!(!p.delete(b"key1"));
    }

    #[test]
    fn test_partition_lru_eviction() {
        let p = Partition::new(3);

        put(&p, "key1", "value1");
        put(&p, "key2", "value2");
        put(&p, "key3", "value3");
        put(&p, "key4", "value4");

        assert_eq!(p.len(), 3);
        assert!(!p.contains(b"key1"));
        assert!(p.contains(b"key2"));
        assert!(p.contains(b"key3"));
        assert!(p.contains(b"key4"));
        assert_eq!(p.stats().evictions, 1);
    }

    #[test]
    fn test_partition_lru_touch_on_get() {
        let p = Partition::new(3);

        put(&p, "key1", "value1");
        put(&p, "key2", "value2");
        put(&p, "key3", "value3");

        get(&p, "key1");
        put(&p, "key4", "value4");

        assert!(p.contains(b"key1"));
        assert!(!p.contains(b"key2"));
    }

    #[test]
    fn test_partition_scenario_capacity_two() {
        let p = Partition::new(2);

        put(&p, "a", "1");
        put(&p, "b", "2");
        assert_eq!(get(&p, "a").as_deref(), Some("1"));
        put(&p, "c", "3");

        assert_eq!(p.keys(), vec![b"c".to_vec(), b"a".to_vec()]);
        assert_eq!(get(&p, "a").as_deref(), Some("1"));
        assert_eq!(get(&p, "c").as_deref(), Some("3"));
        assert_eq!(get(&p, "b"), None);
    }

    #[test]
    fn test_partition_fill_with_current_generation() {
        let p = Partition::new(2);

        let gen = p.generation();
        assert!(p.fill(b"k".to_vec(), b"v".to_vec(), gen));
        assert_eq!(get(&p, "k").as_deref(), Some("v"));

        // Fills do not advance the generation
        assert_eq!(p.generation(), gen);
    }

    #[test]
    fn test_partition_fill_after_delete_is_skipped() {
        let p = Partition::new(4);

        let gen = p.generation();
        // The key was never cached, the delete still counts
        assert!(!p.delete(b"k"));
        assert!(!p.fill(b"k".to_vec(), b"stale".to_vec(), gen));
        assert!(!p.contains(b"k"));
    }

    #[test]
    fn test_partition_fill_after_put_keeps_newer_value() {
        let p = Partition::new(4);

        let gen = p.generation();
        put(&p, "k", "new");
        assert!(!p.fill(b"k".to_vec(), b"old".to_vec(), gen));
        assert_eq!(get(&p, "k").as_deref(), Some("new"));
    }

    #[test]
    fn test_partition_fill_evicts_at_capacity() {
        let p = Partition::new(1);

        put(&p, "a", "1");
        assert!(p.fill(b"b".to_vec(), b"2".to_vec(), p.generation()));
        assert!(!p.contains(b"a"));
        assert_eq!(p.stats().evictions, 1);
    }

    #[test]
    fn test_partition_stats() {
        let p = Partition::new(10);

        put(&p, "key1", "value1");
        get(&p, "key1");
        get(&p, "nonexistent");

        let stats = p.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_partition_delete_does_not_touch_counters() {
        let p = Partition::new(10);

        put(&p, "k", "v");
        p.delete(b"k");
        p.delete(b"missing");

        let stats = p.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_partition_binary_keys() {
        let p = Partition::new(4);

        p.put(vec![0, 255, 1], vec![9, 9]);
        assert_eq!(p.get(&[0, 255, 1]), Some(vec![9, 9]));
        assert_eq!(p.get(&[0, 255]), None);
    }
}
