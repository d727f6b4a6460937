//! Researcher search handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::handlers::networks::SourceParams;
use crate::AppState;
use scholarnet_common::{
    errors::{AppError, Result},
    models::{AuthorDetail, ResearcherSummary},
};

/// Search query string
#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<ResearcherSummary>,
    pub processing_time_ms: u64,
}

/// Search every configured provider for researchers by name
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();
    
    params.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("name".to_string()),
    })?;
    
    let results = state.service.search(&params.name).await?;
    let processing_time_ms = start.elapsed().as_millis() as u64;
    
    tracing::info!(
        query = %params.name,
        results = results.len(),
        latency_ms = processing_time_ms,
        "Researcher search completed"
    );
    
    Ok(Json(SearchResponse {
        query: params.name,
        total_results: results.len(),
        results,
        processing_time_ms,
    }))
}

/// Profile of one researcher at the selected source
pub async fn researcher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SourceParams>,
) -> Result<Json<AuthorDetail>> {
    let source = params.source()?;
    Ok(Json(state.service.researcher(&id, source).await?))
}
