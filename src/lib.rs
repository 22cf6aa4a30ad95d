//! kv_cache - A key-value server with a sharded LRU cache
//!
//! Reads and writes go through a cache-aside coordinator: the durable store
//! is written first, and a fixed-capacity, hash-partitioned LRU cache serves
//! repeated reads.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, ShardedCache};
pub use config::Config;
pub use coordinator::{CacheAside, Lookup, ReadSource};
pub use error::KvError;
pub use store::{FileStore, MemoryStore, PersistentStore, StoreError};
pub use tasks::spawn_stats_reporter;
