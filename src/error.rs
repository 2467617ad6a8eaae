//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and the proxy server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was present but its TTL has elapsed
    #[error("Key expired: {0}")]
    Expired(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// The loader supplied to `Cache::get` returned an error
    #[error("Load failed for key '{key}': {source}")]
    LoadFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Any other store fault
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the store's miss signals, which trigger a load
    /// instead of being surfaced to the caller.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::Expired(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::LoadFailed { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_signals() {
        assert!(CacheError::NotFound("k".into()).is_miss());
        assert!(CacheError::Expired("k".into()).is_miss());
        assert!(!CacheError::Internal("disk on fire".into()).is_miss());
        assert!(!CacheError::CacheFull("full".into()).is_miss());
    }

    #[test]
    fn test_load_failed_keeps_source() {
        let err = CacheError::LoadFailed {
            key: "user:1".to_string(),
            source: anyhow::anyhow!("connection refused"),
        };

        let message = err.to_string();
        assert!(message.contains("user:1"));
        assert!(message.contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (CacheError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (CacheError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CacheError::CacheFull("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                CacheError::LoadFailed {
                    key: "x".into(),
                    source: anyhow::anyhow!("boom"),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
