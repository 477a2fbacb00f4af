//! API route configuration

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::observability::{HealthStatus, MetricsCollector};

use super::handlers::{self, AppState};

/// Build the complete API router with middleware
pub fn build_router(app_state: AppState, max_body_size: usize) -> Router {
    let metrics = app_state.metrics.clone();

    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler));

    let api_routes = Router::new()
        .route("/api/v1/generate", post(handlers::generate))
        .route("/api/v1/videos/search", get(handlers::search_videos))
        .route("/api/v1/transcripts/:video_id", get(handlers::get_transcript))
        .route("/api/v1/questions", post(handlers::generate_questions))
        .route("/api/v1/chapters/content", post(handlers::chapter_content))
        .route("/api/v1/images/search", get(handlers::search_image))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    public_routes
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(metrics, track_metrics)),
        )
        .with_state(app_state)
}

/// Root handler
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "Course Generator",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

fn health_status_code(status: &HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health_checker.check_health().await;
    (health_status_code(&health.status), Json(health))
}

/// Liveness probe handler - always returns 200
async fn liveness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.health_checker.liveness() {
        (StatusCode::OK, Json(json!({"status": "alive"})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "dead"})))
    }
}

/// Readiness probe handler
async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health_checker.check_health().await;
    let status_code = health_status_code(&health.status);

    let readiness_status = match status_code {
        StatusCode::OK => "ready",
        _ => "not_ready",
    };

    (status_code, Json(json!({"status": readiness_status, "details": health})))
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.export_prometheus()
}

/// Record latency and error responses for every request
async fn track_metrics(
    State(metrics): State<Arc<MetricsCollector>>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(req).await;

    metrics.record_request(started.elapsed());
    if response.status().is_client_error() || response.status().is_server_error() {
        metrics.record_error();
    }

    response
}
