//! Error types for ScholarNet services
//! 
//! Provides a comprehensive error handling system with:
//! - Distinct error types for provider, build, and request failures
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidIdentifier,
    UnknownSource,
    
    // Resource errors (4xxx)
    NotFound,
    SeedNotFound,
    EmptyResult,
    
    // Rate limiting (6xxx)
    RateLimited,
    
    // External service errors (8xxx)
    UpstreamError,
    ProviderUnavailable,
    ProviderTimeout,
    DeadlineExceeded,
    
    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidIdentifier => 1002,
            ErrorCode::UnknownSource => 1003,
            
            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::SeedNotFound => 4002,
            ErrorCode::EmptyResult => 4003,
            
            // Rate limits (6xxx)
            ErrorCode::RateLimited => 6001,
            
            // External (8xxx)
            ErrorCode::UpstreamError => 8001,
            ErrorCode::ProviderUnavailable => 8002,
            ErrorCode::ProviderTimeout => 8003,
            ErrorCode::DeadlineExceeded => 8004,
            
            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { 
        message: String, 
        field: Option<String> 
    },
    
    #[error("Invalid {provider} identifier: {id}")]
    InvalidIdentifier { provider: String, id: String },
    
    #[error("Unknown data source: {source_tag}")]
    UnknownSource { source_tag: String },
    
    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },
    
    #[error("Seed not found: {id}")]
    SeedNotFound { id: String },
    
    #[error("Network for {id} is empty")]
    EmptyResult { id: String },
    
    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },
    
    // External service errors
    #[error("Provider {provider} unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },
    
    #[error("Provider {provider} timed out after {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },
    
    #[error("Build deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded { timeout_ms: u64 },
    
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    
    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
    
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    
    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            AppError::UnknownSource { .. } => ErrorCode::UnknownSource,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::SeedNotFound { .. } => ErrorCode::SeedNotFound,
            AppError::EmptyResult { .. } => ErrorCode::EmptyResult,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            AppError::ProviderTimeout { .. } => ErrorCode::ProviderTimeout,
            AppError::DeadlineExceeded { .. } => ErrorCode::DeadlineExceeded,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }
    
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidIdentifier { .. } |
            AppError::UnknownSource { .. } => StatusCode::BAD_REQUEST,
            
            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::SeedNotFound { .. } |
            AppError::EmptyResult { .. } => StatusCode::NOT_FOUND,
            
            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            
            // 500 Internal Server Error
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            
            // 502 Bad Gateway
            AppError::ProviderUnavailable { .. } |
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            
            // 504 Gateway Timeout
            AppError::ProviderTimeout { .. } |
            AppError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
    
    /// Whether a provider call failing with this error may succeed if retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::ProviderUnavailable { .. } |
            AppError::ProviderTimeout { .. } |
            AppError::RateLimited { .. } |
            AppError::HttpClient(_)
        )
    }
    
    /// Whether the error means the requested record does not exist upstream
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::InvalidIdentifier { .. }
        )
    }
    
    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
    
    /// Check if this error is a client error  
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();
        
        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }
        
        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };
        
        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };
        
        (status, Json(body)).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration { 
            message: err.to_string() 
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_error_code_mapping() {
        let err = AppError::SeedNotFound { id: "A1".into() };
        assert_eq!(err.code(), ErrorCode::SeedNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code().as_code(), 4002);
    }
    
    #[test]
    fn test_validation_error() {
        let err = AppError::Validation { 
            message: "Name is empty".into(),
            field: Some("name".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }
    
    #[test]
    fn test_provider_errors_are_transient() {
        let unavailable = AppError::ProviderUnavailable {
            provider: "openalex".into(),
            message: "503".into(),
        };
        let timeout = AppError::ProviderTimeout {
            provider: "openalex".into(),
            timeout_ms: 10_000,
        };
        assert!(unavailable.is_transient());
        assert!(timeout.is_transient());
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
    
    #[test]
    fn test_not_found_is_not_retried() {
        let err = AppError::NotFound {
            resource_type: "author".into(),
            id: "123".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }
}
