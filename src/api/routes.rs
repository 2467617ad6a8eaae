//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, has_handler, health_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /get/:key` - Read-through lookup, filled from the origin on a miss
/// - `GET /has/:key` - Whether a value is currently cached
/// - `DELETE /del/:key` - Invalidate a key
/// - `GET /stats` - Cache and load statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get/:key", get(get_handler))
        .route("/has/:key", get(has_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::cache::Cache;
    use crate::origin::{LoadPolicy, Origin};

    fn create_test_app() -> Router {
        let policy = LoadPolicy {
            value_ttl: Duration::from_secs(300),
            placeholder_after: 3,
            placeholder_ttl: Duration::from_secs(10),
        };
        let origin = Origin::new("http://127.0.0.1:9", Duration::from_millis(200), policy).unwrap();
        create_router(AppState::new(Cache::new(100).unwrap(), origin))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_absent_key() {
        assert_eq!(status_of(create_test_app(), "DELETE", "/del/nothing").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_with_unreachable_origin() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/get/missing").await,
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(status_of(create_test_app(), "PUT", "/set").await, StatusCode::NOT_FOUND);
    }
}
