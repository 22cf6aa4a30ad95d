//! Error types for the key-value server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

// == KV Error Enum ==
/// Errors surfaced by the coordinator and the HTTP layer.
///
/// The cache itself never fails; every failure starts at the store boundary
/// or at request validation.
#[derive(Error, Debug)]
pub enum KvError {
    /// Key does not exist in the durable store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Durable store is unreachable or rejected the operation
    #[error("Store failure: {0}")]
    StoreFailure(#[source] StoreError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KvError {
    /// Maps a store error for `key`, splitting out the not-found case.
    pub fn from_store(key: &[u8], err: StoreError) -> Self {
        match err {
            StoreError::NotFound => KvError::NotFound(String::from_utf8_lossy(key).into_owned()),
            other => KvError::StoreFailure(other),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvError::NotFound(_) => StatusCode::NOT_FOUND,
            KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvError::StoreFailure(_) | KvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the server.
pub type Result<T> = std::result::Result<T, KvError>;
