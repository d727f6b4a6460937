//! Health check handlers

use axum::{extract::State, Json};
use scholarnet_common::models::SourceTag;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub providers: Vec<SourceTag>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: scholarnet_common::VERSION.to_string(),
    })
}

/// Readiness probe - ready once at least one provider is configured
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let providers = state.service.sources();
    
    Json(ReadyResponse {
        status: if providers.is_empty() { "not_ready" } else { "ready" }.to_string(),
        providers,
    })
}
