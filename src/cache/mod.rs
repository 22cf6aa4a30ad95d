//! Cache Module
//!
//! Sharded, bounded, in-memory LRU cache.
//!
//! # Layout
//! - `lru` - slab-backed recency list
//! - `partition` - one locked LRU container with hit/miss counters
//! - `router` - FNV-1a key to partition mapping
//! - `sharded` - fixed array of partitions behind the router

mod lru;
mod partition;
mod router;
mod sharded;
mod stats;


// Re-export public types
pub use lru::{LruList, SlotIdx};
pub use partition::Partition;
pub use router::{hash, ShardRouter};
pub use sharded::ShardedCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Default number of partitions
pub const DEFAULT_SHARD_COUNT: usize = 32;
