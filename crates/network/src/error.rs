//! Build outcomes and accumulator rejections

use scholarnet_common::AppError;
use thiserror::Error;

/// Why a build produced no graph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Seed {id} could not be resolved")]
    SeedNotFound { id: String },
    
    #[error("Build for {id} found nothing besides the seed")]
    EmptyResult { id: String },
    
    #[error("Build exceeded its deadline of {timeout_ms}ms")]
    DeadlineExceeded { timeout_ms: u64 },
}

/// Edge rejected by the accumulator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Edge from {id} to itself")]
    SelfLoop { id: String },
    
    #[error("Edge endpoint {id} is not a node")]
    DanglingEndpoint { id: String },
}

impl From<NetworkError> for AppError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::SeedNotFound { id } => AppError::SeedNotFound { id },
            NetworkError::EmptyResult { id } => AppError::EmptyResult { id },
            NetworkError::DeadlineExceeded { timeout_ms } => AppError::DeadlineExceeded { timeout_ms },
        }
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        AppError::Internal { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarnet_common::errors::ErrorCode;
    
    #[test]
    fn test_network_error_maps_to_app_error() {
        let err: AppError = NetworkError::SeedNotFound { id: "A1".into() }.into();
        assert_eq!(err.code(), ErrorCode::SeedNotFound);
        
        let err: AppError = NetworkError::DeadlineExceeded { timeout_ms: 60_000 }.into();
        assert_eq!(err.code(), ErrorCode::DeadlineExceeded);
    }
    
    #[test]
    fn test_graph_error_is_internal() {
        let err: AppError = GraphError::SelfLoop { id: "A1".into() }.into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.to_string().contains("A1"));
    }
}
