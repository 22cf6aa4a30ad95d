//! API Module
//!
//! HTTP handlers and routing for the key-value REST API.
//!
//! # Endpoints
//! - `POST /kv` - Create or replace a key
//! - `GET /kv/:key` - Read a key (cache first, store on miss)
//! - `DELETE /kv/:key` - Delete a key
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
