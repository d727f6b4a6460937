//! Per-build graph aggregation
//!
//! A `GraphAccumulator` lives inside one build and is owned by the task
//! folding provider results into it. Consumers only ever see the `Graph`
//! returned by [`GraphAccumulator::snapshot`].

use crate::error::GraphError;
use scholarnet_common::models::{
    CitationEdge, CollaborationEdge, Edge, Graph, Node, PaperNode, ResearcherNode, SupportingPaper,
};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
struct CitationSlot {
    supporting: Vec<SupportingPaper>,
    seen: HashSet<String>,
}

/// Mutable node and edge sets for one build
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    nodes: BTreeMap<String, Node>,
    citations: BTreeMap<(String, String), CitationSlot>,
    collaborations: BTreeMap<(String, String), u32>,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Insert a node, or merge it into the node already stored under its id.
    ///
    /// Merging fills optional fields that are still empty, keeps the larger
    /// weight and the stronger role. Returns true when the node was new.
    pub fn upsert_node(&mut self, node: Node) -> bool {
        let id = node.id().to_string();
        match self.nodes.get_mut(&id) {
            None => {
                self.nodes.insert(id, node);
                true
            }
            Some(Node::Researcher(existing)) => {
                if let Node::Researcher(incoming) = node {
                    merge_researcher(existing, incoming);
                }
                false
            }
            Some(Node::Paper(existing)) => {
                if let Node::Paper(incoming) = node {
                    merge_paper(existing, incoming);
                }
                false
            }
        }
    }
    
    /// Record that `paper` supports a `source` cites `target` relationship.
    ///
    /// A paper already attached to the edge is ignored, so the weight is the
    /// number of distinct citing works. Returns whether the weight changed.
    pub fn add_or_bump_citation_edge(
        &mut self,
        source: &str,
        target: &str,
        paper: SupportingPaper,
    ) -> Result<bool, GraphError> {
        self.check_endpoints(source, target)?;
        
        let slot = self
            .citations
            .entry((source.to_string(), target.to_string()))
            .or_default();
        if !slot.seen.insert(paper.id.clone()) {
            return Ok(false);
        }
        slot.supporting.push(paper);
        Ok(true)
    }
    
    /// Add `increment` shared works to the pair, in both directions
    pub fn add_collaboration_edge(
        &mut self,
        source: &str,
        target: &str,
        increment: u32,
    ) -> Result<(), GraphError> {
        self.check_endpoints(source, target)?;
        
        for key in [
            (source.to_string(), target.to_string()),
            (target.to_string(), source.to_string()),
        ] {
            *self.collaborations.entry(key).or_insert(0) += increment;
        }
        Ok(())
    }
    
    fn check_endpoints(&self, source: &str, target: &str) -> Result<(), GraphError> {
        if source == target {
            return Err(GraphError::SelfLoop { id: source.to_string() });
        }
        for id in [source, target] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::DanglingEndpoint { id: id.to_string() });
            }
        }
        Ok(())
    }
    
    pub fn researcher(&self, id: &str) -> Option<&ResearcherNode> {
        self.nodes.get(id).and_then(Node::as_researcher)
    }
    
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    
    /// Immutable copy with edges in (kind, source, target) order and
    /// supporting papers ordered by id
    pub fn snapshot(&self) -> Graph {
        let citations = self.citations.iter().map(|((source, target), slot)| {
            let mut supporting_papers = slot.supporting.clone();
            supporting_papers.sort_by(|a, b| a.id.cmp(&b.id));
            Edge::Citation(CitationEdge {
                source: source.clone(),
                target: target.clone(),
                weight: supporting_papers.len() as u32,
                supporting_papers,
            })
        });
        
        let collaborations = self
            .collaborations
            .iter()
            .map(|((source, target), weight)| {
                Edge::Collaboration(CollaborationEdge {
                    source: source.clone(),
                    target: target.clone(),
                    weight: *weight,
                })
            });
        
        let mut edges: Vec<Edge> = citations.chain(collaborations).collect();
        edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        
        Graph {
            nodes: self.nodes.clone(),
            edges,
        }
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn merge_researcher(existing: &mut ResearcherNode, incoming: ResearcherNode) {
    if existing.display_name.trim().is_empty() {
        existing.display_name = incoming.display_name;
    }
    fill(&mut existing.institution, incoming.institution);
    fill(&mut existing.paper_count, incoming.paper_count);
    fill(&mut existing.citation_count, incoming.citation_count);
    existing.weight = existing.weight.max(incoming.weight);
    existing.role = existing.role.max(incoming.role);
}

fn merge_paper(existing: &mut PaperNode, incoming: PaperNode) {
    if existing.title.trim().is_empty() {
        existing.title = incoming.title;
    }
    if existing.authors.is_empty() {
        existing.authors = incoming.authors;
    }
    fill(&mut existing.year, incoming.year);
    fill(&mut existing.doi, incoming.doi);
    fill(&mut existing.venue, incoming.venue);
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarnet_common::models::{NodeRole, SourceTag};
    
    fn researcher(id: &str) -> Node {
        Node::Researcher(ResearcherNode::new(id, id, SourceTag::OpenAlex))
    }
    
    fn paper(id: &str) -> SupportingPaper {
        SupportingPaper {
            id: id.to_string(),
            title: format!("Paper {}", id),
            authors: Vec::new(),
            year: Some(2020),
            doi: None,
            url: None,
        }
    }
    
    fn accumulator(ids: &[&str]) -> GraphAccumulator {
        let mut acc = GraphAccumulator::new();
        for id in ids {
            acc.upsert_node(researcher(id));
        }
        acc
    }
    
    #[test]
    fn test_upsert_merges_without_clobbering() {
        let mut acc = GraphAccumulator::new();
        let mut first = ResearcherNode::new("A", "Ada", SourceTag::OpenAlex).with_weight(1.2);
        first.institution = Some("Cambridge".into());
        assert!(acc.upsert_node(Node::Researcher(first)));
        
        let mut second = ResearcherNode::new("A", "", SourceTag::OpenAlex)
            .with_role(NodeRole::CoAuthor)
            .with_weight(1.0);
        second.institution = Some("Oxford".into());
        second.paper_count = Some(12);
        assert!(!acc.upsert_node(Node::Researcher(second)));
        
        let merged = acc.researcher("A").unwrap();
        assert_eq!(merged.display_name, "Ada");
        assert_eq!(merged.institution.as_deref(), Some("Cambridge"));
        assert_eq!(merged.paper_count, Some(12));
        assert_eq!(merged.weight, 1.2);
        assert_eq!(merged.role, NodeRole::CoAuthor);
    }
    
    #[test]
    fn test_citation_edge_bumps_per_distinct_paper() {
        let mut acc = accumulator(&["A", "B"]);
        assert!(acc.add_or_bump_citation_edge("B", "A", paper("p1")).unwrap());
        assert!(acc.add_or_bump_citation_edge("B", "A", paper("p2")).unwrap());
        assert!(!acc.add_or_bump_citation_edge("B", "A", paper("p1")).unwrap());
        
        let graph = acc.snapshot();
        let edge = graph.citation_edge("B", "A").unwrap();
        assert_eq!(edge.weight, 2);
        assert_eq!(edge.supporting_papers.len(), 2);
        assert_eq!(graph.citation_edges().count(), 1);
    }
    
    #[test]
    fn test_collaboration_edge_is_symmetric() {
        let mut acc = accumulator(&["A", "B"]);
        acc.add_collaboration_edge("A", "B", 1).unwrap();
        acc.add_collaboration_edge("B", "A", 2).unwrap();
        
        let graph = acc.snapshot();
        assert_eq!(graph.collaboration_edge("A", "B").unwrap().weight, 3);
        assert_eq!(graph.collaboration_edge("B", "A").unwrap().weight, 3);
        assert_eq!(graph.collaboration_edges().count(), 2);
    }
    
    #[test]
    fn test_rejects_self_loops_and_dangling_edges() {
        let mut acc = accumulator(&["A"]);
        assert_eq!(
            acc.add_or_bump_citation_edge("A", "A", paper("p1")),
            Err(GraphError::SelfLoop { id: "A".into() })
        );
        assert_eq!(
            acc.add_collaboration_edge("A", "Z", 1),
            Err(GraphError::DanglingEndpoint { id: "Z".into() })
        );
        assert_eq!(acc.snapshot().edge_count(), 0);
    }
    
    #[test]
    fn test_snapshot_is_order_independent() {
        let triples = [("B", "A", "p1"), ("C", "A", "p2"), ("B", "A", "p3"), ("C", "B", "p1")];
        
        let mut forward = accumulator(&["A", "B", "C"]);
        for (s, t, p) in triples {
            forward.add_or_bump_citation_edge(s, t, paper(p)).unwrap();
        }
        let mut reverse = accumulator(&["C", "B", "A"]);
        for (s, t, p) in triples.iter().rev() {
            reverse.add_or_bump_citation_edge(s, t, paper(p)).unwrap();
        }
        
        let forward = forward.snapshot();
        assert_eq!(forward, reverse.snapshot());
        assert!(forward.is_well_formed());
        let order: Vec<_> = forward.edges.iter().map(|e| (e.source(), e.target())).collect();
        assert_eq!(order, vec![("B", "A"), ("C", "A"), ("C", "B")]);
    }
    
    #[test]
    fn test_snapshot_is_detached() {
        let mut acc = accumulator(&["A", "B"]);
        let before = acc.snapshot();
        acc.add_collaboration_edge("A", "B", 1).unwrap();
        assert_eq!(before.edge_count(), 0);
        assert_eq!(acc.snapshot().edge_count(), 2);
    }
}
