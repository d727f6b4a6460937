//! Immutable graph snapshot handed to renderers

use super::{PaperNode, ResearcherNode, SupportingPaper};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Graph vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Researcher(ResearcherNode),
    Paper(PaperNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Researcher(r) => &r.id,
            Node::Paper(p) => &p.id,
        }
    }
    
    pub fn as_researcher(&self) -> Option<&ResearcherNode> {
        match self {
            Node::Researcher(r) => Some(r),
            Node::Paper(_) => None,
        }
    }
    
    pub fn as_paper(&self) -> Option<&PaperNode> {
        match self {
            Node::Paper(p) => Some(p),
            Node::Researcher(_) => None,
        }
    }
}

/// Directed citation relationship: `source` cites `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationEdge {
    pub source: String,
    pub target: String,
    /// Number of distinct citing works behind this edge
    pub weight: u32,
    pub supporting_papers: Vec<SupportingPaper>,
}

/// One direction of a co-authorship; weight is the shared work count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Citation,
    Collaboration,
}

/// Graph edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edge {
    Citation(CitationEdge),
    Collaboration(CollaborationEdge),
}

impl Edge {
    pub fn kind(&self) -> EdgeKind {
        match self {
            Edge::Citation(_) => EdgeKind::Citation,
            Edge::Collaboration(_) => EdgeKind::Collaboration,
        }
    }
    
    pub fn source(&self) -> &str {
        match self {
            Edge::Citation(e) => &e.source,
            Edge::Collaboration(e) => &e.source,
        }
    }
    
    pub fn target(&self) -> &str {
        match self {
            Edge::Citation(e) => &e.target,
            Edge::Collaboration(e) => &e.target,
        }
    }
    
    pub fn weight(&self) -> u32 {
        match self {
            Edge::Citation(e) => e.weight,
            Edge::Collaboration(e) => e.weight,
        }
    }
    
    /// Sort key giving snapshots a stable edge order
    pub fn sort_key(&self) -> (EdgeKind, &str, &str) {
        (self.kind(), self.source(), self.target())
    }
}

/// Nodes keyed by id plus the edges between them.
///
/// A graph is a snapshot: builders produce a fresh one per request and
/// nothing mutates it after it is returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    
    pub fn researcher(&self, id: &str) -> Option<&ResearcherNode> {
        self.nodes.get(id).and_then(Node::as_researcher)
    }
    
    pub fn paper(&self, id: &str) -> Option<&PaperNode> {
        self.nodes.get(id).and_then(Node::as_paper)
    }
    
    pub fn citation_edge(&self, source: &str, target: &str) -> Option<&CitationEdge> {
        self.edges.iter().find_map(|edge| match edge {
            Edge::Citation(e) if e.source == source && e.target == target => Some(e),
            _ => None,
        })
    }
    
    pub fn collaboration_edge(&self, source: &str, target: &str) -> Option<&CollaborationEdge> {
        self.edges.iter().find_map(|edge| match edge {
            Edge::Collaboration(e) if e.source == source && e.target == target => Some(e),
            _ => None,
        })
    }
    
    pub fn citation_edges(&self) -> impl Iterator<Item = &CitationEdge> {
        self.edges.iter().filter_map(|edge| match edge {
            Edge::Citation(e) => Some(e),
            Edge::Collaboration(_) => None,
        })
    }
    
    pub fn collaboration_edges(&self) -> impl Iterator<Item = &CollaborationEdge> {
        self.edges.iter().filter_map(|edge| match edge {
            Edge::Collaboration(e) => Some(e),
            Edge::Citation(_) => None,
        })
    }
    
    /// The seed researcher, if the graph is researcher-centric
    pub fn seed(&self) -> Option<&ResearcherNode> {
        self.nodes
            .values()
            .filter_map(Node::as_researcher)
            .find(|r| r.is_seed())
    }
    
    /// Nodes other than the seed researcher
    pub fn non_seed_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| !node.as_researcher().is_some_and(ResearcherNode::is_seed))
            .count()
    }
    
    /// Every edge endpoint is a node key and no edge is a self-loop
    pub fn is_well_formed(&self) -> bool {
        self.edges.iter().all(|edge| {
            edge.source() != edge.target()
                && self.nodes.contains_key(edge.source())
                && self.nodes.contains_key(edge.target())
        })
    }
}
