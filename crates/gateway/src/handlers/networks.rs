//! Network build handlers
//!
//! Builds never fail here: when live construction is impossible the
//! response carries the sample network and a fallback notice.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use scholarnet_common::{
    errors::{AppError, Result},
    models::SourceTag,
};
use scholarnet_network::NetworkResponse;
use serde::Deserialize;

use crate::AppState;

/// Provider selection, defaults to Semantic Scholar
#[derive(Debug, Default, Deserialize)]
pub struct SourceParams {
    pub source: Option<String>,
}

impl SourceParams {
    pub(crate) fn source(&self) -> Result<SourceTag> {
        match self.source.as_deref().map(str::trim) {
            None | Some("") => Ok(SourceTag::default()),
            Some(tag) => tag.parse().map_err(|_| AppError::Validation {
                message: format!("unknown source '{}'", tag),
                field: Some("source".to_string()),
            }),
        }
    }
}

/// Citation network around a researcher
pub async fn citation_network(
    State(state): State<AppState>,
    Path(seed_id): Path<String>,
    Query(params): Query<SourceParams>,
) -> Result<Json<NetworkResponse>> {
    let source = params.source()?;
    Ok(Json(state.service.build_citation_network(&seed_id, source).await))
}

/// Co-author network around a researcher
pub async fn coauthor_network(
    State(state): State<AppState>,
    Path(seed_id): Path<String>,
    Query(params): Query<SourceParams>,
) -> Result<Json<NetworkResponse>> {
    let source = params.source()?;
    Ok(Json(state.service.build_coauthor_network(&seed_id, source).await))
}

/// A paper and the papers citing it
pub async fn paper_network(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
    Query(params): Query<SourceParams>,
) -> Result<Json<NetworkResponse>> {
    let source = params.source()?;
    Ok(Json(state.service.build_paper_network(&paper_id, source).await))
}

/// The fixed sample network
pub async fn sample_network(State(state): State<AppState>) -> Json<NetworkResponse> {
    Json(state.service.sample_network())
}

#[cfg(test)]
mod tests {
    use super::*;
    
    fn params(source: Option<&str>) -> SourceParams {
        SourceParams {
            source: source.map(str::to_string),
        }
    }
    
    #[test]
    fn test_source_parsing() {
        assert_eq!(params(None).source().unwrap(), SourceTag::SemanticScholar);
        assert_eq!(params(Some(" ")).source().unwrap(), SourceTag::SemanticScholar);
        assert_eq!(params(Some("OpenAlex")).source().unwrap(), SourceTag::OpenAlex);
        assert_eq!(params(Some("sample")).source().unwrap(), SourceTag::Sample);
        assert!(matches!(
            params(Some("crossref")).source(),
            Err(AppError::Validation { .. })
        ));
    }
}
