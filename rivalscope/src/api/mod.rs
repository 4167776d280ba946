//! Local analysis gateway server
//!
//! Speaks the same wire contract as the remote gateway and answers with
//! sample competitors. Used for development without the real endpoint and by
//! the integration tests.

use crate::gateway::{sample, ResearchRequest, RESEARCH_PATH};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// API state
pub struct ApiState {
    /// Artificial latency before each research response
    pub delay: Duration,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(RESEARCH_PATH, post(run_research))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Research endpoint
async fn run_research(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "query must not be empty" })),
        ));
    }

    info!(query, "Serving sample research");
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    Ok(Json(sample::research_body(query)))
}
