//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use scholarnet_common::config::RateLimitConfig;
use scholarnet_common::errors::{AppError, Result};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide limiter shared by every route
pub type GlobalRateLimiter = DefaultDirectRateLimiter;

/// Limiter plus the configured rate, reported in rejections
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<GlobalRateLimiter>,
    pub requests_per_second: u32,
}

impl RateLimitState {
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Ok(Self {
            limiter: create_rate_limiter(config)?,
            requests_per_second: config.requests_per_second,
        })
    }
}

/// Create a new rate limiter
pub fn create_rate_limiter(config: &RateLimitConfig) -> Result<Arc<GlobalRateLimiter>> {
    let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| AppError::Configuration {
        message: "rate_limit.requests_per_second must be greater than zero".to_string(),
    })?;
    let burst = NonZeroU32::new(config.burst).unwrap_or(per_second);
    
    Ok(Arc::new(RateLimiter::direct(
        Quota::per_second(per_second).allow_burst(burst),
    )))
}

/// Rejects the request with 429 once the bucket is empty
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    match state.limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            AppError::RateLimited {
                limit: state.requests_per_second,
            }
            .into_response()
        }
    }
}
