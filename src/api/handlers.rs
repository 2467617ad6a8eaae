//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{Cache, MAX_KEY_LENGTH};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{DeleteResponse, GetResponse, HasResponse, HealthResponse, StatsResponse};
use crate::origin::Origin;

/// Values cached by the proxy; `None` is the placeholder served while the
/// origin is failing.
pub type ProxyCache = Cache<Option<String>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ProxyCache>,
    pub origin: Origin,
}

impl AppState {
    pub fn new(cache: ProxyCache, origin: Origin) -> Self {
        Self {
            cache: Arc::new(cache),
            origin,
        }
    }

    /// Builds the cache and origin client from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let cache = Cache::new(config.capacity)?;
        let origin = Origin::from_config(config)?;
        Ok(Self::new(cache, origin))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Handler for GET /get/:key
///
/// Serves the cached value, filling it from the origin on a miss. Concurrent
/// requests for the same missing key share one origin fetch.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    validate_key(&key)?;

    let origin = &state.origin;
    let value = state
        .cache
        .get(&key, |fail_count| origin.load(&key, fail_count))
        .await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HasResponse>> {
    validate_key(&key)?;

    let exists = state.cache.has(&key);
    Ok(Json(HasResponse { key, exists }))
}

/// Handler for DELETE /del/:key
///
/// Invalidates the key. Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    validate_key(&key)?;

    state.cache.delete(&key);
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
