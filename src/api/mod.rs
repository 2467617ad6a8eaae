//! API Module
//!
//! HTTP handlers and routing for the read-through proxy.
//!
//! # Endpoints
//! - `GET /get/:key` - Read-through lookup
//! - `GET /has/:key` - Existence check
//! - `DELETE /del/:key` - Invalidate a key
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
