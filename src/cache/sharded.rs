//! Sharded Cache Module
//!
//! Combines the shard router with a fixed array of partitions into one
//! logical bounded LRU cache.

use tracing::debug;

use crate::cache::{CacheStats, Partition, ShardRouter};

// == Sharded Cache ==
/// A bounded LRU cache split across independently locked partitions.
///
/// Each key lives in exactly one partition for the lifetime of the cache.
/// Operations on keys in different partitions never contend. LRU order is
/// per partition, not global.
#[derive(Debug)]
pub struct ShardedCache {
    partitions: Box<[Partition]>,
    router: ShardRouter,
}

impl ShardedCache {
    // == Constructor ==
    /// Creates a cache with `total_capacity` entries spread over
    /// `shard_count` partitions.
    ///
    /// `shard_count` is rounded up to a power of two. Each partition gets
    /// `ceil(total_capacity / shard_count)` entries (minimum 1), so the
    /// effective capacity can exceed `total_capacity` but never falls short.
    pub fn new(total_capacity: usize, shard_count: usize) -> Self {
        let router = ShardRouter::new(shard_count);
        let shards = router.shard_count();
        let per_partition = total_capacity.div_ceil(shards).max(1);

        debug!(
            shards,
            per_partition, total_capacity, "initializing sharded cache"
        );

        let partitions = (0..shards)
            .map(|_| Partition::new(per_partition))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { partitions, router }
    }

    #[inline]
    fn partition(&self, key: &[u8]) -> &Partition {
        &self.partitions[self.router.shard_index(key)]
    }

    // == Get ==
    /// Looks up `key` in its home partition.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.partition(key).get(key)
    }

    // == Put ==
    /// Inserts or overwrites `key` in its home partition.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.partition(&key).put(key, value)
    }

    // == Fill ==
    /// Caches a store-read value unless `key`'s partition saw a `put` or
    /// `delete` since `generation` was taken with [`generation`](Self::generation).
    pub fn fill(&self, key: Vec<u8>, value: Vec<u8>, generation: u64) -> bool {
        self.partition(&key).fill(key, value, generation)
    }

    /// Write generation of `key`'s partition.
    pub fn generation(&self, key: &[u8]) -> u64 {
        self.partition(key).generation()
    }

    // == Delete ==
    /// Removes `key` from its home partition. Returns whether it was cached.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.partition(key).delete(key)
    }

    // == Stats ==
    /// Sums every partition's counters.
    ///
    /// Partitions are locked one after another, never together, so the
    /// result is a per-partition point-in-time sum rather than a global
    /// snapshot.
    pub fn stats(&self) -> CacheStats {
        self.partitions
            .iter()
            .fold(CacheStats::new(), |mut acc, p| {
                acc.merge(&p.stats());
                acc
            })
    }

    /// Index of the partition owning `key`.
    pub fn shard_index(&self, key: &[u8]) -> usize {
        self.router.shard_index(key)
    }

    /// Returns true if `key` is cached, without touching recency or counters.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.partition(key).contains(key)
    }

    pub fn shard_count(&self) -> usize {
        self.partitions.len()
    }

    /// Sum of partition capacities.
    pub fn capacity(&self) -> usize {
        self.partitions.iter().map(Partition::capacity).sum()
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Partition::is_empty)
    }
}
