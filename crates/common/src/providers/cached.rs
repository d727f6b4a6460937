//! Response cache in front of a provider client

use super::ProviderClient;
use crate::cache::{keys, Cache, CacheConfig};
use crate::errors::Result;
use crate::models::{AuthorDetail, AuthorSummary, SourceTag, WorkSummary};
use async_trait::async_trait;
use std::sync::Arc;

/// Decorator caching successful responses of the wrapped client.
/// Failures pass through uncached.
pub struct CachedProvider {
    inner: Arc<dyn ProviderClient>,
    cache: Cache,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn ProviderClient>, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: Cache::new(config),
        }
    }
}

#[async_trait]
impl ProviderClient for CachedProvider {
    fn source(&self) -> SourceTag {
        self.inner.source()
    }
    
    async fn search_authors(&self, name: &str) -> Result<Vec<AuthorSummary>> {
        let key = keys::author_search(self.source(), name);
        self.cache
            .get_or_load(&key, || self.inner.search_authors(name))
            .await
    }
    
    async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail> {
        let key = keys::author_detail(self.source(), author_id);
        self.cache
            .get_or_load(&key, || self.inner.get_author_detail(author_id))
            .await
    }
    
    async fn get_author_works(&self, author_id: &str) -> Result<Vec<WorkSummary>> {
        let key = keys::author_works(self.source(), author_id);
        self.cache
            .get_or_load(&key, || self.inner.get_author_works(author_id))
            .await
    }
    
    async fn get_citing_works(&self, work_id: &str, limit: usize) -> Result<Vec<WorkSummary>> {
        let key = keys::citing_works(self.source(), work_id, limit);
        self.cache
            .get_or_load(&key, || self.inner.get_citing_works(work_id, limit))
            .await
    }
    
    async fn get_work(&self, work_id: &str) -> Result<WorkSummary> {
        let key = keys::work(self.source(), work_id);
        self.cache
            .get_or_load(&key, || self.inner.get_work(work_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fixture::{work, FixtureProvider};
    
    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let fixture = Arc::new(
            FixtureProvider::new(SourceTag::SemanticScholar)
                .with_author("A", "Ada")
                .with_work("A", work("w1", "Engines", &[("A", "Ada")])),
        );
        let cached = CachedProvider::new(fixture.clone(), CacheConfig::default());
        
        let first = cached.get_author_works("A").await.unwrap();
        let second = cached.get_author_works("A").await.unwrap();
        
        assert_eq!(first, second);
        assert_eq!(fixture.call_count(), 1);
    }
    
    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fixture = Arc::new(FixtureProvider::new(SourceTag::SemanticScholar));
        let cached = CachedProvider::new(fixture.clone(), CacheConfig::default());
        
        assert!(cached.get_author_detail("missing").await.is_err());
        assert!(cached.get_author_detail("missing").await.is_err());
        assert_eq!(fixture.call_count(), 2);
    }
}
