//! Fixed sample graph
//!
//! Served when a live build cannot produce a graph, and on request for
//! offline use. It carries no live data and never changes between calls.

use crate::accumulator::GraphAccumulator;
use scholarnet_common::models::{Graph, Node, NodeRole, ResearcherNode, SourceTag, SupportingPaper};
use tracing::error;

const RESEARCHERS: [(&str, &str, f64, NodeRole); 7] = [
    ("1", "Alice Smith", 2.0, NodeRole::Seed),
    ("2", "Bob Jones", 1.5, NodeRole::CoAuthor),
    ("3", "Carol Taylor", 1.5, NodeRole::CoAuthor),
    ("4", "David Brown", 1.0, NodeRole::Citer),
    ("5", "Emma Wilson", 1.0, NodeRole::Citer),
    ("6", "Frank Miller", 1.0, NodeRole::Citer),
    ("7", "Grace Davis", 1.0, NodeRole::Citer),
];

/// (citing, cited, weight)
const CITATIONS: [(&str, &str, u32); 8] = [
    ("2", "1", 3),
    ("3", "1", 2),
    ("4", "1", 1),
    ("4", "2", 2),
    ("5", "3", 1),
    ("1", "6", 2),
    ("6", "7", 1),
    ("3", "2", 1),
];

/// The sample researcher network
pub fn sample_network() -> Graph {
    let mut acc = GraphAccumulator::new();
    
    for (id, name, weight, role) in RESEARCHERS {
        acc.upsert_node(Node::Researcher(
            ResearcherNode::new(id, name, SourceTag::Sample)
                .with_role(role)
                .with_weight(weight),
        ));
    }
    
    for (citing, cited, weight) in CITATIONS {
        for n in 1..=weight {
            let paper = sample_paper(citing, cited, n);
            if let Err(e) = acc.add_or_bump_citation_edge(citing, cited, paper) {
                error!(error = %e, "Sample graph edge rejected");
            }
        }
    }
    
    acc.snapshot()
}

fn sample_paper(citing: &str, cited: &str, n: u32) -> SupportingPaper {
    SupportingPaper {
        id: format!("sample-{}-{}-{}", citing, cited, n),
        title: format!("Sample paper {} citing researcher {}", n, cited),
        authors: Vec::new(),
        year: None,
        doi: None,
        url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_sample_is_deterministic() {
        let first = sample_network();
        let second = sample_network();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
    
    #[test]
    fn test_sample_shape() {
        let graph = sample_network();
        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.edge_count(), 8);
        assert!(graph.is_well_formed());
        
        assert_eq!(graph.citation_edge("2", "1").map(|e| e.weight), Some(3));
        assert_eq!(graph.citation_edge("4", "2").map(|e| e.weight), Some(2));
        assert_eq!(graph.citation_edge("1", "6").map(|e| e.supporting_papers.len()), Some(2));
        
        let seed = graph.seed().unwrap();
        assert_eq!(seed.display_name, "Alice Smith");
        assert!(graph
            .nodes
            .values()
            .filter_map(Node::as_researcher)
            .all(|r| r.weight <= seed.weight && r.source == SourceTag::Sample));
    }
}
