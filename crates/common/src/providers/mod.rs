//! Bibliographic provider abstraction
//!
//! Provides a unified interface over the external data sources:
//! - Semantic Scholar (graph API v1)
//! - OpenAlex
//! - In-memory fixtures for tests and offline runs
//!
//! Every client normalizes its provider's response shapes into the
//! records in [`crate::models`] before anything else sees them.

mod cached;
pub mod fixture;
mod http;
pub mod openalex;
pub mod semantic_scholar;

pub use cached::CachedProvider;
pub use fixture::FixtureProvider;
pub use http::{HttpFetcher, HttpSettings};
pub use openalex::OpenAlexClient;
pub use semantic_scholar::SemanticScholarClient;

use crate::cache::CacheConfig;
use crate::config::ProvidersConfig;
use crate::errors::{AppError, Result};
use crate::models::{AuthorDetail, AuthorSummary, SourceTag, WorkSummary};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Capability interface implemented once per data source.
///
/// "No results" is an empty `Vec`, never an error. Transport failures are
/// `ProviderUnavailable`/`ProviderTimeout`; unknown ids are `NotFound`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Tag stamped on every record this client returns
    fn source(&self) -> SourceTag;
    
    /// Search authors by display name
    async fn search_authors(&self, name: &str) -> Result<Vec<AuthorSummary>>;
    
    /// Author profile
    async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail>;
    
    /// Author's works in provider order, each with its author list
    async fn get_author_works(&self, author_id: &str) -> Result<Vec<WorkSummary>>;
    
    /// Works citing the given work, at most `limit` of them
    async fn get_citing_works(&self, work_id: &str, limit: usize) -> Result<Vec<WorkSummary>>;
    
    /// Single work
    async fn get_work(&self, work_id: &str) -> Result<WorkSummary>;
}

/// Configured providers keyed by source tag
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<SourceTag, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Build every enabled HTTP provider, each behind the response cache when enabled
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let mut registry = Self::new();
        
        if config.semantic_scholar.enabled {
            let client = SemanticScholarClient::new(&config.semantic_scholar, config)?;
            registry = registry.with_provider(Self::wrap(Arc::new(client), config));
        }
        
        if config.openalex.enabled {
            let client = OpenAlexClient::new(&config.openalex, config)?;
            registry = registry.with_provider(Self::wrap(Arc::new(client), config));
        }
        
        if registry.is_empty() {
            return Err(AppError::Configuration {
                message: "no bibliographic provider is enabled".to_string(),
            });
        }
        
        tracing::info!(providers = ?registry.sources(), "Provider registry initialized");
        Ok(registry)
    }
    
    fn wrap(client: Arc<dyn ProviderClient>, config: &ProvidersConfig) -> Arc<dyn ProviderClient> {
        match config.cache_ttl() {
            Some(ttl) => {
                let cache_config = CacheConfig {
                    ttl,
                    max_entries: config.cache_max_entries,
                    name: client.source().to_string(),
                };
                Arc::new(CachedProvider::new(client, cache_config))
            }
            None => client,
        }
    }
    
    /// Register a provider under its own source tag, replacing any previous one
    pub fn with_provider(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.providers.insert(provider.source(), provider);
        self
    }
    
    pub fn get(&self, source: SourceTag) -> Result<Arc<dyn ProviderClient>> {
        self.providers
            .get(&source)
            .cloned()
            .ok_or_else(|| AppError::UnknownSource { source_tag: source.to_string() })
    }
    
    /// Registered sources in search precedence order
    pub fn sources(&self) -> Vec<SourceTag> {
        self.providers.keys().copied().collect()
    }
    
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_registry_orders_by_precedence() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(FixtureProvider::new(SourceTag::OpenAlex)))
            .with_provider(Arc::new(FixtureProvider::new(SourceTag::SemanticScholar)));
        
        assert_eq!(registry.sources(), vec![SourceTag::SemanticScholar, SourceTag::OpenAlex]);
        assert!(registry.get(SourceTag::OpenAlex).is_ok());
    }
    
    #[test]
    fn test_missing_source_is_unknown() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.get(SourceTag::OpenAlex),
            Err(AppError::UnknownSource { .. })
        ));
    }
    
    #[test]
    fn test_all_disabled_is_configuration_error() {
        let mut config = ProvidersConfig::default();
        config.semantic_scholar.enabled = false;
        config.openalex.enabled = false;
        assert!(matches!(
            ProviderRegistry::from_config(&config),
            Err(AppError::Configuration { .. })
        ));
    }
    
    #[test]
    fn test_default_config_builds_both_providers() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default()).unwrap();
        assert_eq!(registry.sources().len(), 2);
    }
}
