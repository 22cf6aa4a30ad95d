//! Response DTOs for the key-value API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the read operation (GET /kv/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub success: bool,
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    /// Whether the value was served from cache
    pub cached: bool,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>, cached: bool) -> Self {
        Self {
            success: true,
            key: key.into(),
            value: value.into(),
            cached,
        }
    }
}

/// Response body for the create operation (POST /kv)
#[derive(Debug, Clone, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    /// Success message
    pub message: String,
    /// The key that was written
    pub key: String,
}

impl CreateResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            success: true,
            message: format!("Key '{}' stored", key),
            key,
        }
    }
}

/// Response body for the delete operation (DELETE /kv/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            success: true,
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Number of cache partitions
    pub shards: usize,
    /// Sum of partition capacities
    pub capacity: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from aggregated cache statistics
    pub fn new(stats: CacheStats, shards: usize, capacity: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            shards,
            capacity,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value", true);
        let json: serde_json::Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "test_key");
        assert_eq!(json["value"], "test_value");
        assert_eq!(json["cached"], true);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_create_response_serialize() {
        let resp = CreateResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("stored"));
    }

    #[test]
    fn test_stats_response_from_cache_stats() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            total_entries: 100,
        };
        let resp = StatsResponse::new(stats, 32, 1024);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.shards, 32);
        assert_eq!(resp.capacity, 1024);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("Something went wrong"));
    }
}
