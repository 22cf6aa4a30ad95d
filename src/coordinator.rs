//! Cache-Aside Coordinator
//!
//! Sequences cache and store mutations so the cache never runs ahead of the
//! durable store:
//!
//! - create: store first, cache only after the store commits
//! - read: cache, then store on a miss, populating the cache with the result
//! - delete: store first, then invalidate the cached copy
//!
//! No cache lock is held across a store call. A read-through therefore
//! races with writes to the same key: a create or delete can land between
//! the store read and the cache fill. The fill is dropped when the key's
//! partition saw any write after the read started, so a value older than
//! the store is never cached.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheStats, ShardedCache};
use crate::error::{KvError, Result};
use crate::store::{PersistentStore, StoreError};

// == Read Source ==
/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Store,
}

/// Value returned by [`CacheAside::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: Vec<u8>,
    pub source: ReadSource,
}

// == Coordinator ==
/// Cache-aside front for a [`PersistentStore`].
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct CacheAside {
    cache: ShardedCache,
    store: Arc<dyn PersistentStore>,
}

impl CacheAside {
    pub fn new(cache: ShardedCache, store: Arc<dyn PersistentStore>) -> Self {
        Self { cache, store }
    }

    // == Create ==
    /// Writes `key` durably, then caches it.
    ///
    /// On a store failure the cache is left untouched, including any value
    /// previously cached for `key`.
    pub fn create(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        if let Err(e) = self.store.create_or_update(key, &value) {
            warn!(key = %String::from_utf8_lossy(key), error = %e, "store write failed");
            return Err(KvError::StoreFailure(e));
        }

        self.cache.put(key.to_vec(), value);
        Ok(())
    }

    // == Read ==
    /// Returns the value for `key`, reading through to the store on a miss.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.lookup(key).map(|l| l.value)
    }

    /// Like [`read`](Self::read), also reporting whether the cache served it.
    ///
    /// A store miss is reported as [`KvError::NotFound`] and does not
    /// populate the cache. A value read from the store is returned even
    /// when a concurrent write kept it out of the cache.
    pub fn lookup(&self, key: &[u8]) -> Result<Lookup> {
        if let Some(value) = self.cache.get(key) {
            debug!(key = %String::from_utf8_lossy(key), "cache hit");
            return Ok(Lookup {
                value,
                source: ReadSource::Cache,
            });
        }

        debug!(key = %String::from_utf8_lossy(key), "cache miss");
        let generation = self.cache.generation(key);
        let value = self.store.read(key).map_err(|e| {
            if !matches!(e, StoreError::NotFound) {
                warn!(key = %String::from_utf8_lossy(key), error = %e, "store read failed");
            }
            KvError::from_store(key, e)
        })?;

        if !self.cache.fill(key.to_vec(), value.clone(), generation) {
            debug!(
                key = %String::from_utf8_lossy(key),
                "concurrent write, skipped cache fill"
            );
        }
        Ok(Lookup {
            value,
            source: ReadSource::Store,
        })
    }

    // == Delete ==
    /// Deletes `key` from the store, then invalidates any cached copy.
    ///
    /// The cached copy is dropped whatever the store answered: a key the
    /// store no longer has must not keep being served from cache.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let result = self.store.delete(key);
        let was_cached = self.cache.delete(key);

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                if was_cached && matches!(e, StoreError::NotFound) {
                    debug!(key = %String::from_utf8_lossy(key), "dropped stale cached copy");
                }
                if !matches!(e, StoreError::NotFound) {
                    warn!(key = %String::from_utf8_lossy(key), error = %e, "store delete failed");
                }
                Err(KvError::from_store(key, e))
            }
        }
    }

    // == Stats ==
    /// Aggregated cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &ShardedCache {
        &self.cache
    }
}
