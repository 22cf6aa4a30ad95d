//! Stats Reporter Task
//!
//! Background task that periodically logs aggregated cache statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::CacheStats;
use crate::coordinator::CacheAside;

/// Spawns a background task that logs cache statistics every
/// `interval_secs` seconds.
///
/// Reading the statistics does not touch recency or counters, so the task
/// has no effect on cache behavior. The returned handle is aborted during
/// graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_stats_reporter(state.kv.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_stats_reporter(kv: Arc<CacheAside>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;
            report(&kv);
        }
    })
}

/// Logs one statistics snapshot and returns it.
fn report(kv: &CacheAside) -> CacheStats {
    let stats = kv.cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        entries = stats.total_entries,
        hit_rate = stats.hit_rate(),
        "cache stats"
    );
    stats
}
