//! End-to-end builds through `NetworkService` against fixture providers

use scholarnet_common::config::NetworkConfig;
use scholarnet_common::models::{EdgeKind, Graph, Node, SourceTag, WorkSummary};
use scholarnet_common::providers::fixture::{work, FixtureProvider, Operation};
use scholarnet_common::providers::ProviderRegistry;
use scholarnet_network::{sample_network, FallbackReason, NetworkService};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn service_with(provider: FixtureProvider, call_timeout: Duration) -> NetworkService {
    let registry = ProviderRegistry::new().with_provider(Arc::new(provider));
    NetworkService::new(registry, NetworkConfig::default(), call_timeout)
}

fn service(provider: FixtureProvider) -> NetworkService {
    service_with(provider, Duration::from_millis(500))
}

fn assert_graph_invariants(graph: &Graph) {
    let mut pairs = HashSet::new();
    for edge in &graph.edges {
        assert_ne!(edge.source(), edge.target(), "self-loop on {}", edge.source());
        assert!(graph.nodes.contains_key(edge.source()), "dangling {}", edge.source());
        assert!(graph.nodes.contains_key(edge.target()), "dangling {}", edge.target());
        assert!(
            pairs.insert((edge.kind(), edge.source().to_string(), edge.target().to_string())),
            "duplicate edge {} -> {}",
            edge.source(),
            edge.target()
        );
        assert!(edge.weight() >= 1);
    }
}

/// Seed A with two works: W1 with B, cited by C; W2 with C, cited by B
fn three_researchers() -> FixtureProvider {
    let w1 = work("W1", "First", &[("A", "Ada"), ("B", "Bob")]);
    let w2 = work("W2", "Second", &[("A", "Ada"), ("C", "Cy")]);
    
    FixtureProvider::new(SourceTag::SemanticScholar)
        .with_author("A", "Ada")
        .with_author("B", "Bob")
        .with_author("C", "Cy")
        .with_work("A", w1.clone())
        .with_work("A", w2.clone())
        .with_work("B", w1)
        .with_work("C", w2)
        .with_citation("W1", work("P1", "C on W1", &[("C", "Cy")]))
        .with_citation("W2", work("P2", "B on W2", &[("B", "Bob")]))
}

#[tokio::test]
async fn test_three_researcher_citation_network() {
    let response = service(three_researchers())
        .build_citation_network("A", SourceTag::SemanticScholar)
        .await;
    
    assert!(response.fallback.is_none());
    assert_eq!(response.source, SourceTag::SemanticScholar);
    
    let graph = response.graph;
    assert_graph_invariants(&graph);
    let ids: Vec<&str> = graph.nodes.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    
    for (s, t) in [("A", "B"), ("B", "A"), ("A", "C"), ("C", "A")] {
        assert_eq!(graph.collaboration_edge(s, t).map(|e| e.weight), Some(1), "{} <-> {}", s, t);
    }
    
    let c_to_a = graph.citation_edge("C", "A").unwrap();
    assert_eq!(c_to_a.weight, 1);
    assert_eq!(c_to_a.supporting_papers.len(), 1);
    assert_eq!(c_to_a.supporting_papers[0].id, "P1");
    
    let b_to_a = graph.citation_edge("B", "A").unwrap();
    assert_eq!(b_to_a.weight, 1);
    assert_eq!(b_to_a.supporting_papers[0].id, "P2");
    
    // secondary pass: B cites W2, which is also C's work
    let b_to_c = graph.citation_edge("B", "C").unwrap();
    assert_eq!(b_to_c.weight, 1);
    assert_eq!(b_to_c.supporting_papers[0].id, "P2");
    assert!(graph.citation_edge("C", "B").is_some());
    assert_eq!(graph.citation_edges().count(), 4);
}

#[tokio::test]
async fn test_zero_works_serves_sample_network() {
    let provider = FixtureProvider::new(SourceTag::OpenAlex).with_author("A1", "Ada");
    let response = service(provider)
        .build_citation_network("A1", SourceTag::OpenAlex)
        .await;
    
    assert_eq!(response.fallback.as_ref().map(|n| n.reason), Some(FallbackReason::EmptyResult));
    assert_eq!(response.source, SourceTag::Sample);
    assert_eq!(response.graph, sample_network());
}

#[tokio::test]
async fn test_citing_works_timeout_keeps_coauthorship() {
    let provider = FixtureProvider::new(SourceTag::OpenAlex)
        .with_author("A", "Ada")
        .with_work("A", work("W1", "Slow", &[("A", "Ada"), ("B", "Bob")]))
        .with_work("A", work("W2", "Fast", &[("A", "Ada"), ("C", "Cy")]))
        .with_citation("W1", work("P1", "Never seen", &[("X", "Xena")]))
        .with_citation("W2", work("P2", "Seen", &[("D", "Dee")]))
        .hanging(Operation::CitingWorks, "W1");
    
    let response = service_with(provider, Duration::from_millis(50))
        .build_citation_network("A", SourceTag::OpenAlex)
        .await;
    
    assert!(response.fallback.is_none());
    let graph = response.graph;
    assert_graph_invariants(&graph);
    assert_eq!(graph.collaboration_edge("A", "B").map(|e| e.weight), Some(1));
    assert_eq!(graph.collaboration_edge("B", "A").map(|e| e.weight), Some(1));
    assert!(graph.researcher("X").is_none());
    assert_eq!(graph.citation_edge("D", "A").map(|e| e.weight), Some(1));
}

#[tokio::test]
async fn test_failing_provider_calls_contribute_nothing() {
    let provider = three_researchers()
        .failing(Operation::CitingWorks, "W2")
        .failing(Operation::AuthorWorks, "B");
    
    let graph = service(provider)
        .build_citation_network("A", SourceTag::SemanticScholar)
        .await
        .graph;
    
    assert_graph_invariants(&graph);
    assert!(graph.citation_edge("C", "A").is_some());
    assert!(graph.citation_edge("B", "A").is_none());
    assert!(graph.citation_edge("B", "C").is_none());
    assert!(graph.citation_edge("C", "B").is_none());
}

fn shuffled_fixture(order: &[usize]) -> FixtureProvider {
    let works: Vec<WorkSummary> = vec![
        work("W1", "One", &[("A", "Ada"), ("B", "Bob"), ("C", "Cy")]),
        work("W2", "Two", &[("A", "Ada"), ("B", "Bob")]),
        work("W3", "Three", &[("A", "Ada"), ("D", "Dee")]),
        work("W4", "Four", &[("A", "Ada")]),
    ];
    
    let mut provider = FixtureProvider::new(SourceTag::OpenAlex).with_author("A", "Ada");
    for &i in order {
        provider = provider.with_work("A", works[i].clone());
    }
    provider
        .with_work("B", works[1].clone())
        .with_citation("W1", work("P1", "p1", &[("E", "Eve"), ("B", "Bob")]))
        .with_citation("W2", work("P1", "p1", &[("E", "Eve"), ("B", "Bob")]))
        .with_citation("W3", work("P2", "p2", &[("E", "Eve")]))
        .with_citation("W4", work("P3", "p3", &[("F", "Fay"), ("C", "Cy")]))
}

#[tokio::test]
async fn test_edge_weights_do_not_depend_on_work_order() {
    let forward = service(shuffled_fixture(&[0, 1, 2, 3]))
        .build_citation_network("A", SourceTag::OpenAlex)
        .await
        .graph;
    let reversed = service(shuffled_fixture(&[3, 2, 1, 0]))
        .build_citation_network("A", SourceTag::OpenAlex)
        .await
        .graph;
    
    assert_graph_invariants(&forward);
    assert_eq!(forward, reversed);
    
    // P1 cites two of A's works but counts once per citing author
    assert_eq!(forward.citation_edge("E", "A").map(|e| e.weight), Some(2));
    assert_eq!(forward.collaboration_edge("A", "B").map(|e| e.weight), Some(2));
    // B's only known work is cited by B and a non-co-author
    assert!(forward.citation_edge("C", "B").is_none());
}

#[tokio::test]
async fn test_seed_dominates_coauthor_network() {
    let mut provider = FixtureProvider::new(SourceTag::SemanticScholar).with_author("A", "Ada");
    for i in 0..12 {
        provider = provider.with_work(
            "A",
            work(&format!("W{}", i), "Frequent", &[("A", "Ada"), ("B", "Bob"), ("C", "Cy")]),
        );
    }
    
    let response = service(provider)
        .build_coauthor_network("A", SourceTag::SemanticScholar)
        .await;
    let graph = response.graph;
    
    let seed = graph.seed().unwrap();
    assert_eq!(seed.id, "A");
    assert!(graph
        .nodes
        .values()
        .filter_map(Node::as_researcher)
        .all(|r| r.weight <= seed.weight));
    assert_eq!(graph.researcher("B").unwrap().weight, 1.5);
    assert_eq!(graph.collaboration_edge("A", "C").map(|e| e.weight), Some(12));
    assert!(graph.edges.iter().all(|e| e.kind() == EdgeKind::Collaboration));
}

#[tokio::test]
async fn test_citing_works_are_capped_per_paper() {
    let mut provider = FixtureProvider::new(SourceTag::OpenAlex)
        .with_author("A", "Ada")
        .with_work("A", work("W1", "Popular", &[("A", "Ada")]));
    for i in 0..60 {
        provider = provider.with_citation("W1", work(&format!("P{}", i), "Citing", &[("E", "Eve")]));
    }
    
    let graph = service(provider)
        .build_citation_network("A", SourceTag::OpenAlex)
        .await
        .graph;
    
    let cap = NetworkConfig::default().citing_works_cap as u32;
    assert_eq!(graph.citation_edge("E", "A").map(|e| e.weight), Some(cap));
}

#[tokio::test]
async fn test_sample_network_is_deterministic() {
    let service = service(FixtureProvider::new(SourceTag::OpenAlex));
    let first = service.sample_network();
    let second = service.sample_network();
    
    assert_eq!(first, second);
    assert!(first.fallback.is_none());
    assert_graph_invariants(&first.graph);
}

#[tokio::test]
async fn test_paper_network_through_service() {
    let provider = FixtureProvider::new(SourceTag::OpenAlex)
        .with_work("A", work("W1", "Seed", &[("A", "Ada")]))
        .with_citation("W1", work("W2", "Follow-up", &[("B", "Bob")]));
    let service = service(provider);
    
    let response = service.build_paper_network("W1", SourceTag::OpenAlex).await;
    assert!(response.fallback.is_none());
    assert!(response.graph.paper("W2").is_some());
    assert_graph_invariants(&response.graph);
    
    let missing = service.build_paper_network("W404", SourceTag::OpenAlex).await;
    assert_eq!(missing.fallback.map(|n| n.reason), Some(FallbackReason::SeedNotFound));
}
