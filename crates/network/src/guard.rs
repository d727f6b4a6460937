//! Provider-call boundary for builds
//!
//! Every call made during a build goes through a [`GuardedProvider`],
//! which caps the number of calls in flight, applies a per-call timeout,
//! and converts failures into a [`FetchOutcome`] instead of an error.

use scholarnet_common::errors::Result;
use scholarnet_common::metrics;
use scholarnet_common::models::{AuthorDetail, AuthorSummary, SourceTag, WorkSummary};
use scholarnet_common::ProviderClient;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Result of one guarded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Data(T),
    /// The provider does not know the requested id
    Missing,
    /// Transport failure, upstream error, or timeout
    Unavailable,
}

impl<T> FetchOutcome<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            FetchOutcome::Data(data) => Some(data),
            FetchOutcome::Missing | FetchOutcome::Unavailable => None,
        }
    }
}

impl<T: Default> FetchOutcome<T> {
    /// Data, or the empty value when the call contributed nothing
    pub fn or_empty(self) -> T {
        self.into_data().unwrap_or_default()
    }
}

/// Shared handle to one provider with a per-build call budget
#[derive(Clone)]
pub struct GuardedProvider {
    provider: Arc<dyn ProviderClient>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl GuardedProvider {
    pub fn new(provider: Arc<dyn ProviderClient>, max_in_flight: usize, call_timeout: Duration) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            call_timeout,
        }
    }
    
    pub fn source(&self) -> SourceTag {
        self.provider.source()
    }
    
    pub async fn search_authors(&self, name: &str) -> FetchOutcome<Vec<AuthorSummary>> {
        self.guarded("search_authors", name, self.provider.search_authors(name))
            .await
    }
    
    pub async fn author_detail(&self, author_id: &str) -> FetchOutcome<AuthorDetail> {
        self.guarded("author_detail", author_id, self.provider.get_author_detail(author_id))
            .await
    }
    
    pub async fn author_works(&self, author_id: &str) -> FetchOutcome<Vec<WorkSummary>> {
        self.guarded("author_works", author_id, self.provider.get_author_works(author_id))
            .await
    }
    
    pub async fn citing_works(&self, work_id: &str, limit: usize) -> FetchOutcome<Vec<WorkSummary>> {
        self.guarded("citing_works", work_id, self.provider.get_citing_works(work_id, limit))
            .await
    }
    
    pub async fn work(&self, work_id: &str) -> FetchOutcome<WorkSummary> {
        self.guarded("work", work_id, self.provider.get_work(work_id))
            .await
    }
    
    async fn guarded<T>(
        &self,
        operation: &'static str,
        key: &str,
        call: impl Future<Output = Result<T>>,
    ) -> FetchOutcome<T> {
        let source = self.source();
        
        let Ok(_permit) = self.permits.acquire().await else {
            return FetchOutcome::Unavailable;
        };
        
        let started = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, call).await;
        let elapsed = started.elapsed().as_secs_f64();
        
        let (outcome, label) = match result {
            Ok(Ok(data)) => (FetchOutcome::Data(data), "ok"),
            Ok(Err(e)) if e.is_not_found() => {
                debug!(provider = %source, operation, key, error = %e, "Provider has no record");
                (FetchOutcome::Missing, "not_found")
            }
            Ok(Err(e)) => {
                warn!(provider = %source, operation, key, error = %e, "Provider call failed, continuing without it");
                (FetchOutcome::Unavailable, "error")
            }
            Err(_) => {
                warn!(
                    provider = %source,
                    operation,
                    key,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Provider call timed out, continuing without it"
                );
                (FetchOutcome::Unavailable, "timeout")
            }
        };
        
        metrics::record_provider_call(source.as_str(), operation, label, elapsed);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarnet_common::providers::fixture::{work, FixtureProvider, Operation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    
    fn guarded(provider: FixtureProvider) -> GuardedProvider {
        GuardedProvider::new(Arc::new(provider), 4, Duration::from_millis(50))
    }
    
    #[tokio::test]
    async fn test_outcomes() {
        let provider = FixtureProvider::new(SourceTag::OpenAlex)
            .with_author("A1", "Ada")
            .with_work("A1", work("W1", "Notes", &[("A1", "Ada")]))
            .failing(Operation::AuthorWorks, "A2")
            .hanging(Operation::CitingWorks, "W1");
        let guard = guarded(provider);
        
        assert!(matches!(guard.author_detail("A1").await, FetchOutcome::Data(_)));
        assert_eq!(guard.author_detail("A404").await, FetchOutcome::Missing);
        assert_eq!(guard.author_works("A2").await, FetchOutcome::Unavailable);
        assert_eq!(guard.citing_works("W1", 10).await, FetchOutcome::Unavailable);
        assert_eq!(guard.author_works("A1").await.or_empty().len(), 1);
        assert!(FetchOutcome::<Vec<WorkSummary>>::Unavailable.or_empty().is_empty());
    }
    
    struct CountingProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }
    
    #[async_trait]
    impl ProviderClient for CountingProvider {
        fn source(&self) -> SourceTag {
            SourceTag::SemanticScholar
        }
        
        async fn search_authors(&self, _name: &str) -> Result<Vec<AuthorSummary>> {
            Ok(Vec::new())
        }
        
        async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail> {
            Err(scholarnet_common::AppError::NotFound {
                resource_type: "author".into(),
                id: author_id.into(),
            })
        }
        
        async fn get_author_works(&self, _author_id: &str) -> Result<Vec<WorkSummary>> {
            Ok(Vec::new())
        }
        
        async fn get_citing_works(&self, _work_id: &str, _limit: usize) -> Result<Vec<WorkSummary>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
        
        async fn get_work(&self, work_id: &str) -> Result<WorkSummary> {
            Ok(work(work_id, "", &[]))
        }
    }
    
    #[tokio::test]
    async fn test_in_flight_calls_are_capped() {
        let provider = Arc::new(CountingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let guard = GuardedProvider::new(provider.clone(), 3, Duration::from_secs(1));
        
        let ids: Vec<String> = (0..12).map(|i| format!("W{}", i)).collect();
        let calls = ids.iter().map(|id| guard.citing_works(id, 5));
        let outcomes = futures::future::join_all(calls).await;
        
        assert!(outcomes.iter().all(|outcome| matches!(outcome, FetchOutcome::Data(_))));
        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
    }
}
