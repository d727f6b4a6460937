//! Request-facing facade over the builder
//!
//! Builds never fail from the caller's point of view. When a build cannot
//! produce a graph the service substitutes the sample network and says so
//! in a [`FallbackNotice`].

use crate::builder::{BuildKind, NetworkBuilder};
use crate::error::NetworkError;
use crate::fallback::sample_network;
use crate::guard::{FetchOutcome, GuardedProvider};
use crate::resolver::IdentityResolver;
use scholarnet_common::config::{AppConfig, NetworkConfig};
use scholarnet_common::errors::{AppError, Result};
use scholarnet_common::metrics;
use scholarnet_common::models::{AuthorDetail, Graph, ResearcherSummary, SourceTag};
use scholarnet_common::providers::ProviderRegistry;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Why the sample network was served instead of a live one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    SeedNotFound,
    EmptyResult,
    DeadlineExceeded,
    UnknownSource,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::SeedNotFound => "seed_not_found",
            FallbackReason::EmptyResult => "empty_result",
            FallbackReason::DeadlineExceeded => "deadline_exceeded",
            FallbackReason::UnknownSource => "unknown_source",
        }
    }
}

impl From<&NetworkError> for FallbackReason {
    fn from(err: &NetworkError) -> Self {
        match err {
            NetworkError::SeedNotFound { .. } => FallbackReason::SeedNotFound,
            NetworkError::EmptyResult { .. } => FallbackReason::EmptyResult,
            NetworkError::DeadlineExceeded { .. } => FallbackReason::DeadlineExceeded,
        }
    }
}

/// User-visible, non-fatal notice attached to a substituted graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackNotice {
    pub reason: FallbackReason,
    pub message: String,
}

/// Graph returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkResponse {
    pub kind: BuildKind,
    pub source: SourceTag,
    pub graph: Graph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackNotice>,
}

impl NetworkResponse {
    /// The sample network served on request
    pub fn sample(kind: BuildKind) -> Self {
        Self {
            kind,
            source: SourceTag::Sample,
            graph: sample_network(),
            fallback: None,
        }
    }
    
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Entry point for searches and network builds
#[derive(Clone)]
pub struct NetworkService {
    registry: ProviderRegistry,
    builder: NetworkBuilder,
    call_timeout: Duration,
    deadline: Duration,
}

impl NetworkService {
    pub fn new(registry: ProviderRegistry, config: NetworkConfig, call_timeout: Duration) -> Self {
        let deadline = config.build_deadline();
        Self {
            registry,
            builder: NetworkBuilder::new(config, call_timeout),
            call_timeout,
            deadline,
        }
    }
    
    /// Validate the network settings and build a registry of the enabled providers
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.network.validate()?;
        let registry = ProviderRegistry::from_config(&config.providers)?;
        Ok(Self::new(
            registry,
            config.network.clone(),
            config.providers.call_timeout(),
        ))
    }
    
    /// Override the per-build deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
    
    /// Live sources this service can build from
    pub fn sources(&self) -> Vec<SourceTag> {
        self.registry.sources()
    }
    
    /// Search every configured provider and merge same-named researchers.
    ///
    /// Providers are consulted concurrently; earlier sources win conflicts.
    /// A provider that fails contributes no results.
    pub async fn search(&self, name: &str) -> Result<Vec<ResearcherSummary>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                message: "name must not be empty".to_string(),
                field: Some("name".to_string()),
            });
        }
        
        let lookups = self
            .registry
            .sources()
            .into_iter()
            .filter_map(|source| self.registry.get(source).ok())
            .map(|provider| {
                let guard = GuardedProvider::new(provider, 1, self.call_timeout);
                async move { guard.search_authors(name).await.or_empty() }
            });
        let records = futures::future::join_all(lookups).await.into_iter().flatten();
        
        let researchers = IdentityResolver::resolve(records);
        info!(name, hits = researchers.len(), "Researcher search finished");
        Ok(researchers.into_iter().map(ResearcherSummary::from).collect())
    }
    
    /// Profile of one researcher at one source.
    ///
    /// Sample ids resolve against the sample network.
    pub async fn researcher(&self, id: &str, source: SourceTag) -> Result<AuthorDetail> {
        let not_found = || AppError::NotFound {
            resource_type: "researcher".to_string(),
            id: id.to_string(),
        };
        
        if source == SourceTag::Sample {
            let graph = sample_network();
            let node = graph.researcher(id).ok_or_else(not_found)?;
            return Ok(AuthorDetail {
                provider_id: node.id.clone(),
                display_name: node.display_name.clone(),
                institution: node.institution.clone(),
                paper_count: node.paper_count,
                citation_count: node.citation_count,
                source,
            });
        }
        
        let provider = self.registry.get(source)?;
        match GuardedProvider::new(provider, 1, self.call_timeout).author_detail(id).await {
            FetchOutcome::Data(detail) => Ok(detail),
            FetchOutcome::Missing => Err(not_found()),
            FetchOutcome::Unavailable => Err(AppError::ProviderUnavailable {
                provider: source.to_string(),
                message: format!("could not fetch researcher {}", id),
            }),
        }
    }
    
    pub async fn build_citation_network(&self, seed_id: &str, source: SourceTag) -> NetworkResponse {
        self.run(BuildKind::Citation, seed_id, source).await
    }
    
    pub async fn build_coauthor_network(&self, seed_id: &str, source: SourceTag) -> NetworkResponse {
        self.run(BuildKind::CoAuthor, seed_id, source).await
    }
    
    pub async fn build_paper_network(&self, paper_id: &str, source: SourceTag) -> NetworkResponse {
        self.run(BuildKind::Paper, paper_id, source).await
    }
    
    pub fn sample_network(&self) -> NetworkResponse {
        NetworkResponse::sample(BuildKind::Citation)
    }
    
    async fn run(&self, kind: BuildKind, id: &str, source: SourceTag) -> NetworkResponse {
        if source == SourceTag::Sample {
            return NetworkResponse::sample(kind);
        }
        
        let provider = match self.registry.get(source) {
            Ok(provider) => provider,
            Err(e) => return self.fall_back(kind, FallbackReason::UnknownSource, e.to_string()),
        };
        
        let started = Instant::now();
        let build = async {
            match kind {
                BuildKind::Citation => self.builder.build_citation_network(provider, id).await,
                BuildKind::CoAuthor => self.builder.build_coauthor_network(provider, id).await,
                BuildKind::Paper => self.builder.build_paper_network(provider, id).await,
            }
        };
        
        // on expiry the build future is dropped along with its partial graph
        let outcome = tokio::time::timeout(self.deadline, build)
            .await
            .unwrap_or_else(|_| {
                Err(NetworkError::DeadlineExceeded {
                    timeout_ms: self.deadline.as_millis() as u64,
                })
            });
        let elapsed = started.elapsed().as_secs_f64();
        
        match outcome {
            Ok(graph) => {
                metrics::record_build(kind.as_str(), "ok", elapsed, graph.node_count(), graph.edge_count());
                NetworkResponse {
                    kind,
                    source,
                    graph,
                    fallback: None,
                }
            }
            Err(e) => {
                let reason = FallbackReason::from(&e);
                metrics::record_build(kind.as_str(), reason.as_str(), elapsed, 0, 0);
                self.fall_back(kind, reason, e.to_string())
            }
        }
    }
    
    fn fall_back(&self, kind: BuildKind, reason: FallbackReason, message: String) -> NetworkResponse {
        warn!(kind = %kind, reason = reason.as_str(), message = %message, "Serving sample network");
        metrics::record_fallback(kind.as_str(), reason.as_str());
        
        NetworkResponse {
            kind,
            source: SourceTag::Sample,
            graph: sample_network(),
            fallback: Some(FallbackNotice { reason, message }),
        }
    }
}
