//! API Routes
//!
//! Configures the Axum router: control endpoints under `/_sw`, everything
//! else proxied through the interceptor.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activate_handler, dead_letters_handler, discard_dead_letter_handler, enqueue_handler, health_handler, list_queue_handler,
    notification_click_handler, proxy_handler, push_handler, remove_handler, requeue_handler,
    stats_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/_sw/queue", post(enqueue_handler).get(list_queue_handler))
        .route("/_sw/queue/:id", delete(remove_handler))
        .route("/_sw/dead-letters", get(dead_letters_handler))
        .route("/_sw/dead-letters/:id", delete(discard_dead_letter_handler))
        .route("/_sw/dead-letters/:id/requeue", post(requeue_handler))
        .route("/_sw/sync/:tag", post(sync_handler))
        .route("/_sw/activate/:version", post(activate_handler))
        .route("/_sw/push", post(push_handler))
        .route("/_sw/notification-click", post(notification_click_handler))
        .route("/_sw/stats", get(stats_handler))
        .route("/_sw/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::ScriptedNetwork;
    use crate::worker::OfflineWorker;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    async fn create_test_app(network: Arc<ScriptedNetwork>) -> Router {
        let worker = OfflineWorker::from_config(&Config::default(), network)
            .await
            .unwrap();
        create_router(AppState::new(worker))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Arc::new(ScriptedNetwork::offline())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_sw/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app(Arc::new(ScriptedNetwork::offline())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_sw/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_paths_are_proxied() {
        let network = Arc::new(ScriptedNetwork::online());
        let app = create_test_app(network.clone()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/reports/monthly?year=2024")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-offline-source").unwrap(), "network");
        assert_eq!(network.calls()[0].url, "/reports/monthly?year=2024");
    }

    #[tokio::test]
    async fn test_unknown_sync_tag_rejected() {
        let app = create_test_app(Arc::new(ScriptedNetwork::online())).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/_sw/sync/payments-sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
