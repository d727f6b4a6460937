//! Shared HTTP plumbing for provider clients
//!
//! Paces requests with a per-provider token bucket, retries 429/5xx with
//! exponential backoff bounded by the call timeout, and maps HTTP failures
//! onto the provider error taxonomy.

use crate::errors::{AppError, Result};
use crate::models::SourceTag;
use crate::USER_AGENT;
use backoff::{future::retry, ExponentialBackoff};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Settings shared by every HTTP provider client
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub source: SourceTag,
    pub call_timeout: Duration,
    pub requests_per_second: u32,
    pub max_retries: u32,
    pub default_headers: HeaderMap,
}

/// Rate-limited JSON fetcher owned by one provider client
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: DefaultDirectRateLimiter,
    settings: HttpSettings,
}

impl HttpFetcher {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.call_timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .default_headers(settings.default_headers.clone())
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build {} HTTP client: {}", settings.source, e),
            })?;
        
        let rps = NonZeroU32::new(settings.requests_per_second).ok_or_else(|| {
            AppError::Configuration {
                message: format!("{} requests_per_second must be greater than zero", settings.source),
            }
        })?;
        let limiter = RateLimiter::direct(Quota::per_second(rps));
        
        Ok(Self { client, limiter, settings })
    }
    
    pub fn source(&self) -> SourceTag {
        self.settings.source
    }
    
    /// GET `url` with `query` and decode the JSON body.
    ///
    /// `resource` and `id` only label a 404 as `NotFound`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        resource: &str,
        id: &str,
    ) -> Result<T> {
        let attempts = AtomicU32::new(0);
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(self.settings.call_timeout),
            ..ExponentialBackoff::default()
        };
        
        retry(policy, || {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed);
            async move {
                match self.fetch_once(url, query, resource, id).await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_transient() && attempt < self.settings.max_retries => {
                        warn!(
                            provider = %self.settings.source,
                            attempt = attempt + 1,
                            max_retries = self.settings.max_retries,
                            error = %e,
                            "Provider request failed, retrying"
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }
    
    async fn fetch_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        resource: &str,
        id: &str,
    ) -> Result<T> {
        self.limiter.until_ready().await;
        
        let provider = self.settings.source.to_string();
        debug!(provider = %provider, url = %url, "Provider request");
        
        let response = self.client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ProviderTimeout {
                        provider: provider.clone(),
                        timeout_ms: self.settings.call_timeout.as_millis() as u64,
                    }
                } else {
                    AppError::ProviderUnavailable {
                        provider: provider.clone(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;
        
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound {
                resource_type: resource.to_string(),
                id: id.to_string(),
            });
        }
        
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(&provider, status, &body));
        }
        
        response.json::<T>().await.map_err(|e| AppError::Internal {
            message: format!("Malformed {} response for {} {}: {}", provider, resource, id, e),
        })
    }
}

/// Map a non-success, non-404 status onto the error taxonomy.
/// 429 and 5xx come back as transient `ProviderUnavailable`.
fn classify_status(provider: &str, status: StatusCode, body: &str) -> AppError {
    let snippet: String = body.chars().take(200).collect();
    
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::ProviderUnavailable {
            provider: provider.to_string(),
            message: format!("HTTP {}: {}", status, snippet),
        }
    } else {
        AppError::Validation {
            message: format!("{} rejected request with HTTP {}: {}", provider, status, snippet),
            field: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_status_classification() {
        let throttled = classify_status("openalex", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(throttled.is_transient());
        
        let broken = classify_status("openalex", StatusCode::BAD_GATEWAY, "");
        assert!(broken.is_transient());
        
        let rejected = classify_status("openalex", StatusCode::BAD_REQUEST, "bad filter");
        assert!(!rejected.is_transient());
    }
    
    #[test]
    fn test_zero_rate_is_rejected() {
        let settings = HttpSettings {
            source: SourceTag::OpenAlex,
            call_timeout: Duration::from_secs(1),
            requests_per_second: 0,
            max_retries: 0,
            default_headers: HeaderMap::new(),
        };
        assert!(matches!(HttpFetcher::new(settings), Err(AppError::Configuration { .. })));
    }
}
