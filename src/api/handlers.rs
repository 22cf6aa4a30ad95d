//! API Handlers
//!
//! HTTP request handlers for each key-value endpoint.
//!
//! Coordinator calls may block on the durable store, so they run on the
//! blocking thread pool rather than on the async workers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::ShardedCache;
use crate::config::Config;
use crate::coordinator::{CacheAside, ReadSource};
use crate::error::{KvError, Result};
use crate::models::{
    CreateRequest, CreateResponse, DeleteResponse, GetResponse, HealthResponse, StatsResponse,
};
use crate::store::PersistentStore;

/// Default time a request may take before it is answered with 408.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside coordinator over the sharded cache and the store
    pub kv: Arc<CacheAside>,
    /// Applied to every route by the router
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState around an existing coordinator.
    pub fn new(kv: CacheAside) -> Self {
        Self {
            kv: Arc::new(kv),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Builds the sharded cache from configuration in front of `store`.
    pub fn from_config(config: &Config, store: Arc<dyn PersistentStore>) -> Self {
        let cache = ShardedCache::new(config.cache_size, config.shard_count);
        Self::new(CacheAside::new(cache, store))
            .with_request_timeout(Duration::from_secs(config.request_timeout))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Runs a blocking coordinator call off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KvError::Internal(format!("blocking task failed: {}", e)))?
}

/// Handler for POST /kv
///
/// Writes the key to the store, then to the cache.
pub async fn create_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateResponse>)> {
    let Json(req) = payload.map_err(|rejection| {
        KvError::InvalidRequest(format!("invalid json: {}", rejection.body_text()))
    })?;

    if let Some(error_msg) = req.validate() {
        return Err(KvError::InvalidRequest(error_msg));
    }

    let kv = state.kv.clone();
    let CreateRequest { key, value } = req;
    let response = CreateResponse::new(key.clone());
    run_blocking(move || kv.create(key.as_bytes(), value.into_bytes())).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /kv/:key
///
/// Serves from cache, reading through to the store on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let kv = state.kv.clone();
    let lookup_key = key.clone();
    let lookup = run_blocking(move || kv.lookup(lookup_key.as_bytes())).await?;

    Ok(Json(GetResponse::new(
        key,
        String::from_utf8_lossy(&lookup.value),
        lookup.source == ReadSource::Cache,
    )))
}

/// Handler for DELETE /kv/:key
///
/// Deletes the key from the store and invalidates the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let kv = state.kv.clone();
    let response = DeleteResponse::new(key.clone());
    run_blocking(move || kv.delete(key.as_bytes())).await?;

    Ok(Json(response))
}

/// Handler for GET /stats
///
/// Returns aggregated cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.kv.cache();
    Json(StatsResponse::new(
        cache.stats(),
        cache.shard_count(),
        cache.capacity(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        let cache = ShardedCache::new(100, 4);
        AppState::new(CacheAside::new(cache, Arc::new(MemoryStore::new())))
    }

    fn create_req(
        key: &str,
        value: &str,
    ) -> std::result::Result<Json<CreateRequest>, JsonRejection> {
        Ok(Json(CreateRequest {
            key: key.to_string(),
            value: value.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_create_and_get_handler() {
        let state = test_state();

        let (status, _) = create_handler(State(state.clone()), create_req("test_key", "test_value"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
        assert!(response.cached);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(KvError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        create_handler(State(state.clone()), create_req("to_delete", "value"))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(KvError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_handler() {
        let state = test_state();

        let result = delete_handler(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(KvError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.shards, 4);
        assert_eq!(response.capacity, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_from_config_applies_timeout() {
        let config = Config {
            request_timeout: 3,
            ..Config::default()
        };
        let state = AppState::from_config(&config, Arc::new(MemoryStore::new()));

        assert_eq!(state.request_timeout, Duration::from_secs(3));
        assert_eq!(state.kv.cache().capacity(), 1024);
    }

    #[tokio::test]
    async fn test_create_invalid_request() {
        let state = test_state();

        let result = create_handler(State(state), create_req("", "value")).await;
        assert!(matches!(result, Err(KvError::InvalidRequest(_))));
    }
}
