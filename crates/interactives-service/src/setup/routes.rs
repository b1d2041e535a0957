//! Health check routes.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .with_state(state)
}

/// Liveness probe - process is running.
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Aggregate health of storage, downstream APIs and the queue.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.health.run().await;

    let status_code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = serde_json::to_value(&report).unwrap_or_else(|_| serde_json::json!({}));
    body["environment"] = serde_json::json!(state.config.environment());

    (status_code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use interactives_core::{Config, ImporterConfig, StorageBackend};
    use interactives_infra::HealthRegistry;
    use std::time::Duration;

    fn config() -> Config {
        Config(Box::new(ImporterConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            environment: "test".to_string(),
            log_format: "text".to_string(),
            api_router_url: "http://localhost:25100".to_string(),
            service_auth_token: String::new(),
            http_timeout_secs: 5,
            storage_backend: StorageBackend::Local,
            aws_region: "eu-west-1".to_string(),
            s3_endpoint: None,
            download_bucket_name: String::new(),
            local_storage_path: Some("/tmp".to_string()),
            queue_url: "http://localhost:4566/queue".to_string(),
            consumer_workers: 1,
            batch_size: 10,
            graceful_shutdown_timeout_secs: 1,
            healthcheck_timeout_secs: 1,
        }))
    }

    fn state(health: HealthRegistry) -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            config: config(),
            health,
        }))
    }

    #[tokio::test]
    async fn test_healthy_returns_ok() {
        let mut health = HealthRegistry::new(Duration::from_millis(100));
        health.register("storage", || async { Ok::<(), String>(()) });

        let response = health_check(state(health)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failing_check_returns_unavailable() {
        let mut health = HealthRegistry::new(Duration::from_millis(100));
        health.register("storage", || async { Ok::<(), String>(()) });
        health.register("queue", || async { Err::<(), _>("unreachable") });

        let response = health_check(state(health)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = liveness_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
