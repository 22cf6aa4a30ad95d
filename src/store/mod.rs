//! Persistent Store Module
//!
//! The durable source of truth behind the cache.
//!
//! # Implementations
//! - [`MemoryStore`] - process-local map, for tests and ephemeral runs
//! - [`FileStore`] - append-only JSON-lines log replayed on open

mod file;
mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

// == Store Error ==
/// Failures reported by a [`PersistentStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key has no record in the store
    #[error("key not found")]
    NotFound,

    /// The store rejected the call or cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded
    #[error("corrupt store record: {0}")]
    Codec(#[from] serde_json::Error),
}

// == Store Record ==
/// A durable row: value plus the time the key was first created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub value: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl StoreRecord {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            created_at: Utc::now(),
        }
    }
}

// == Persistent Store ==
/// Durable key-value storage consumed by the cache-aside coordinator.
///
/// Calls are synchronous and may block. Implementations synchronize
/// internally and are shared across request handlers.
pub trait PersistentStore: Send + Sync {
    /// Creates `key` or replaces its value. An existing record keeps its
    /// original creation time.
    fn create_or_update(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Returns the value for `key`, or [`StoreError::NotFound`].
    fn read(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;

    /// Removes `key`, or returns [`StoreError::NotFound`] if it had no record.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
}
