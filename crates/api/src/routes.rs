//! Route definitions.

use crate::handlers::{health, history, status};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/history", get(history))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StatusSource;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use clmm_rebalancer_execution::lifecycle::LifecycleTracker;
    use clmm_rebalancer_execution::scheduler::BotStatus;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StaticStatus;

    #[async_trait]
    impl StatusSource for StaticStatus {
        async fn status(&self) -> BotStatus {
            BotStatus {
                running: true,
                wallet_address: "wallet".to_string(),
                network: "devnet".to_string(),
                pool_address: "pool".to_string(),
                tracked_position: None,
                last_result: None,
            }
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn router(lifecycle: Arc<LifecycleTracker>) -> Router {
        create_router(AppState::new(Arc::new(StaticStatus), lifecycle))
    }

    #[tokio::test]
    async fn test_health() {
        let (code, body) = get_json(router(Arc::new(LifecycleTracker::new())), "/health").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status() {
        let (code, body) = get_json(router(Arc::new(LifecycleTracker::new())), "/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["running"], true);
        assert_eq!(body["wallet_address"], "wallet");
        assert_eq!(body["pool_address"], "pool");
        assert!(body["last_result"].is_null());
    }

    #[tokio::test]
    async fn test_history() {
        let lifecycle = Arc::new(LifecycleTracker::new());
        lifecycle.record_failure(None, "pool", "first").await;
        lifecycle.record_failure(None, "pool", "second").await;

        let (code, body) = get_json(router(Arc::clone(&lifecycle)), "/history?limit=1").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
        assert_eq!(body["events"][0]["data"]["CycleFailed"]["error"], "second");
        assert_eq!(body["stats"]["failures"], 2);
    }

    #[tokio::test]
    async fn test_history_rejects_bad_limit() {
        let (code, body) =
            get_json(router(Arc::new(LifecycleTracker::new())), "/history?limit=0").await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }
}
