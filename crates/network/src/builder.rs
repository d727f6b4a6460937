//! Network traversal
//!
//! A build starts from the seed's works, records co-authorship for every
//! work, and for citation networks follows each work's citing works back
//! to their authors. Fan-out is bounded by explicit counters: the number
//! of discovered authors, the citing works requested per paper, and the
//! co-authors inspected by the secondary pass.

use crate::accumulator::GraphAccumulator;
use crate::error::{GraphError, NetworkError};
use crate::guard::{FetchOutcome, GuardedProvider};
use crate::resolver::IdentityResolver;
use futures::stream::{self, StreamExt};
use scholarnet_common::config::NetworkConfig;
use scholarnet_common::models::{
    AuthorDetail, AuthorRef, AuthorSummary, Graph, Node, NodeRole, ResearcherNode, SourceTag,
    WorkSummary,
};
use scholarnet_common::ProviderClient;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Largest size bonus a co-author can earn from shared works
const MAX_COAUTHOR_BONUS: f64 = 0.5;

/// Size bonus per shared work
const COAUTHOR_BONUS_PER_WORK: f64 = 0.1;

/// Kind of graph a build produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    Citation,
    CoAuthor,
    Paper,
}

impl BuildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildKind::Citation => "citation",
            BuildKind::CoAuthor => "coauthor",
            BuildKind::Paper => "paper",
        }
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size hint of a co-author with `shared_works` works in common with the seed
pub fn coauthor_weight(shared_works: u32) -> f64 {
    1.0 + (COAUTHOR_BONUS_PER_WORK * shared_works as f64).min(MAX_COAUTHOR_BONUS)
}

/// Builds graphs against one provider at a time
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    config: NetworkConfig,
    call_timeout: Duration,
}

impl NetworkBuilder {
    pub fn new(config: NetworkConfig, call_timeout: Duration) -> Self {
        Self { config, call_timeout }
    }
    
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
    
    fn guard(&self, provider: Arc<dyn ProviderClient>) -> GuardedProvider {
        GuardedProvider::new(provider, self.config.max_in_flight, self.call_timeout)
    }
    
    fn concurrency(&self) -> usize {
        self.config.max_in_flight.max(1)
    }
    
    /// Seed, co-authors, and the researchers citing the seed's works.
    ///
    /// The author cap bounds the works processed, not the calls issued: up
    /// to `max_in_flight - 1` later works may already have their citing
    /// works requested when the cap trips.
    #[instrument(
        skip(self, provider),
        fields(build_id = %Uuid::new_v4(), kind = "citation", source = %provider.source())
    )]
    pub async fn build_citation_network(
        &self,
        provider: Arc<dyn ProviderClient>,
        seed_id: &str,
    ) -> Result<Graph, NetworkError> {
        let guard = self.guard(provider);
        let (seed, works) = seed_and_works(&guard, seed_id).await?;
        info!(works = works.len(), "Building citation network");
        
        let mut traversal = Traversal::new(&seed);
        let cap = self.config.citing_works_cap;
        
        // Results are folded in provider order so the author cap cuts at the
        // same work regardless of which fetch finishes first. Dropping the
        // stream at the end of this block cancels fetches still pending.
        {
            let mut fetches = stream::iter(works)
                .map(|work| {
                    let guard = guard.clone();
                    async move {
                        let citing = guard.citing_works(&work.id, cap).await;
                        (work, citing)
                    }
                })
                .buffered(self.concurrency());
            
            let mut processed = 0usize;
            while let Some((work, citing)) = fetches.next().await {
                processed += 1;
                traversal.record_coauthors(&work);
                for citing_work in citing.or_empty() {
                    traversal.record_citers(&citing_work);
                }
                
                if traversal.discovered() > self.config.max_discovered_authors {
                    debug!(
                        processed,
                        discovered = traversal.discovered(),
                        "Author cap reached, skipping remaining works"
                    );
                    break;
                }
            }
        }
        
        self.secondary_pass(&guard, &mut traversal).await;
        
        let graph = traversal.finish(self.config.seed_weight)?;
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "Citation network built");
        Ok(graph)
    }
    
    /// Seed-centred star of collaboration edges
    #[instrument(
        skip(self, provider),
        fields(build_id = %Uuid::new_v4(), kind = "coauthor", source = %provider.source())
    )]
    pub async fn build_coauthor_network(
        &self,
        provider: Arc<dyn ProviderClient>,
        seed_id: &str,
    ) -> Result<Graph, NetworkError> {
        let guard = self.guard(provider);
        let (seed, works) = seed_and_works(&guard, seed_id).await?;
        
        let mut traversal = Traversal::new(&seed);
        for work in &works {
            traversal.record_coauthors(work);
        }
        
        let graph = traversal.finish(self.config.seed_weight)?;
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "Co-author network built");
        Ok(graph)
    }
    
    /// A paper and the papers citing it
    #[instrument(
        skip(self, provider),
        fields(build_id = %Uuid::new_v4(), kind = "paper", source = %provider.source())
    )]
    pub async fn build_paper_network(
        &self,
        provider: Arc<dyn ProviderClient>,
        paper_id: &str,
    ) -> Result<Graph, NetworkError> {
        let guard = self.guard(provider);
        let source = guard.source();
        
        let seed = guard
            .work(paper_id)
            .await
            .into_data()
            .ok_or_else(|| NetworkError::SeedNotFound { id: paper_id.to_string() })?;
        
        let mut graph = GraphAccumulator::new();
        graph.upsert_node(Node::Paper(seed.to_node(source)));
        
        let citing = guard.citing_works(&seed.id, self.config.citing_works_cap).await;
        for work in citing.or_empty() {
            if work.id == seed.id {
                continue;
            }
            graph.upsert_node(Node::Paper(work.to_node(source)));
            log_rejected(graph.add_or_bump_citation_edge(&work.id, &seed.id, work.to_supporting()));
        }
        
        if graph.node_count() <= 1 {
            return Err(NetworkError::EmptyResult { id: paper_id.to_string() });
        }
        
        let graph = graph.snapshot();
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "Paper network built");
        Ok(graph)
    }
    
    /// For the top co-authors, look at a few of their own works and link
    /// any other co-author citing them
    async fn secondary_pass(&self, guard: &GuardedProvider, traversal: &mut Traversal) {
        let candidates = traversal.top_coauthors(self.config.secondary_top_k);
        if candidates.is_empty() {
            return;
        }
        
        let per_author = self.config.secondary_works_per_coauthor;
        let cap = self.config.citing_works_cap;
        
        let results: Vec<(String, Vec<WorkSummary>)> = stream::iter(candidates)
            .map(|coauthor| {
                let guard = guard.clone();
                async move {
                    let works = guard.author_works(&coauthor).await.or_empty();
                    let calls = works
                        .iter()
                        .take(per_author)
                        .map(|work| guard.citing_works(&work.id, cap));
                    let citing = futures::future::join_all(calls)
                        .await
                        .into_iter()
                        .flat_map(FetchOutcome::or_empty)
                        .collect();
                    (coauthor, citing)
                }
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await;
        
        for (cited, citing) in results {
            for work in &citing {
                traversal.record_coauthor_citation(&cited, work);
            }
        }
    }
}

async fn seed_and_works(
    guard: &GuardedProvider,
    seed_id: &str,
) -> Result<(AuthorDetail, Vec<WorkSummary>), NetworkError> {
    let seed = guard
        .author_detail(seed_id)
        .await
        .into_data()
        .ok_or_else(|| NetworkError::SeedNotFound { id: seed_id.to_string() })?;
    
    let works = guard.author_works(&seed.provider_id).await.or_empty();
    if works.is_empty() {
        return Err(NetworkError::EmptyResult { id: seed_id.to_string() });
    }
    Ok((seed, works))
}

fn log_rejected<T>(result: Result<T, GraphError>) {
    if let Err(e) = result {
        debug!(error = %e, "Edge rejected");
    }
}

/// Trimmed provider id of a work author, if it has a usable one
fn author_key(author: &AuthorRef) -> Option<&str> {
    author.provider_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

/// State of one researcher-centred build
struct Traversal {
    seed_id: String,
    source: SourceTag,
    resolver: IdentityResolver,
    graph: GraphAccumulator,
    /// Works shared with the seed, per co-author
    shared_works: BTreeMap<String, u32>,
}

impl Traversal {
    fn new(seed: &AuthorDetail) -> Self {
        let mut resolver = IdentityResolver::new();
        resolver.insert(AuthorSummary {
            provider_id: seed.provider_id.clone(),
            display_name: seed.display_name.clone(),
            institution: seed.institution.clone(),
            source: seed.source,
        });
        
        let mut graph = GraphAccumulator::new();
        graph.upsert_node(Node::Researcher(seed.to_node(NodeRole::Seed, 1.0)));
        
        Self {
            seed_id: seed.provider_id.clone(),
            source: seed.source,
            resolver,
            graph,
            shared_works: BTreeMap::new(),
        }
    }
    
    /// Canonical id of a work author, or None for the seed and for
    /// authors the provider gave no id
    fn identify(&mut self, author: &AuthorRef) -> Option<String> {
        let provider_id = author_key(author)?;
        let canonical = &self
            .resolver
            .insert(AuthorSummary {
                provider_id: provider_id.to_string(),
                display_name: author.display_name.clone(),
                institution: None,
                source: self.source,
            })
            .canonical_id;
        (*canonical != self.seed_id).then(|| canonical.clone())
    }
    
    fn discovered(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }
    
    fn is_coauthor(&self, id: &str) -> bool {
        self.shared_works.get(id).is_some_and(|&count| count > 0)
    }
    
    fn record_coauthors(&mut self, work: &WorkSummary) {
        let mut seen = BTreeSet::new();
        for author in &work.authors {
            let Some(id) = self.identify(author) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            
            self.graph.upsert_node(Node::Researcher(
                ResearcherNode::new(&id, &author.display_name, self.source).with_role(NodeRole::CoAuthor),
            ));
            *self.shared_works.entry(id.clone()).or_insert(0) += 1;
            log_rejected(self.graph.add_collaboration_edge(&self.seed_id, &id, 1));
        }
    }
    
    /// Authors of a work citing the seed become citers of the seed
    fn record_citers(&mut self, citing: &WorkSummary) {
        let supporting = citing.to_supporting();
        for author in &citing.authors {
            let Some(id) = self.identify(author) else {
                continue;
            };
            
            self.graph.upsert_node(Node::Researcher(ResearcherNode::new(
                &id,
                &author.display_name,
                self.source,
            )));
            log_rejected(self.graph.add_or_bump_citation_edge(&id, &self.seed_id, supporting.clone()));
        }
    }
    
    /// Link co-authors of the seed who cite `cited`. Never adds nodes.
    fn record_coauthor_citation(&mut self, cited: &str, citing: &WorkSummary) {
        let supporting = citing.to_supporting();
        for author in &citing.authors {
            let Some(provider_id) = author_key(author) else {
                continue;
            };
            let Some(citer) = self
                .resolver
                .lookup(self.source, provider_id, &author.display_name)
                .map(str::to_string)
            else {
                continue;
            };
            
            if citer == cited || !self.is_coauthor(&citer) {
                continue;
            }
            log_rejected(self.graph.add_or_bump_citation_edge(&citer, cited, supporting.clone()));
        }
    }
    
    /// Co-authors by shared work count, ties broken by id
    fn top_coauthors(&self, k: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, u32)> = self
            .shared_works
            .iter()
            .map(|(id, &count)| (id, count))
            .filter(|(_, count)| *count > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(k).map(|(id, _)| id.clone()).collect()
    }
    
    fn finish(mut self, seed_weight: f64) -> Result<Graph, NetworkError> {
        if self.discovered() == 0 {
            return Err(NetworkError::EmptyResult { id: self.seed_id });
        }
        
        for (id, &shared) in &self.shared_works {
            if let Some(node) = self.graph.researcher(id).cloned() {
                self.graph
                    .upsert_node(Node::Researcher(node.with_weight(coauthor_weight(shared))));
            }
        }
        if let Some(seed) = self.graph.researcher(&self.seed_id).cloned() {
            self.graph.upsert_node(Node::Researcher(seed.with_weight(seed_weight)));
        }
        
        Ok(self.graph.snapshot())
    }
}
