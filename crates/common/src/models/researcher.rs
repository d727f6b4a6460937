//! Researcher records

use super::SourceTag;
use serde::{Deserialize, Serialize};

/// Role a researcher plays relative to the seed of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Cited the seed's work but never co-authored with the seed
    Citer,
    CoAuthor,
    Seed,
}

/// Researcher vertex of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherNode {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,
    /// Rendering size hint
    pub weight: f64,
    pub role: NodeRole,
    pub source: SourceTag,
}

impl ResearcherNode {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, source: SourceTag) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            institution: None,
            paper_count: None,
            citation_count: None,
            weight: 1.0,
            role: NodeRole::Citer,
            source,
        }
    }
    
    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }
    
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }
    
    pub fn is_seed(&self) -> bool {
        self.role == NodeRole::Seed
    }
}

/// Author hit from a provider search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub provider_id: String,
    pub display_name: String,
    pub institution: Option<String>,
    pub source: SourceTag,
}

/// Author profile from a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDetail {
    pub provider_id: String,
    pub display_name: String,
    pub institution: Option<String>,
    pub paper_count: Option<u64>,
    pub citation_count: Option<u64>,
    pub source: SourceTag,
}

impl AuthorDetail {
    /// Node for this author with the given role and size hint
    pub fn to_node(&self, role: NodeRole, weight: f64) -> ResearcherNode {
        ResearcherNode {
            id: self.provider_id.clone(),
            display_name: self.display_name.clone(),
            institution: self.institution.clone(),
            paper_count: self.paper_count,
            citation_count: self.citation_count,
            weight: weight.max(0.0),
            role,
            source: self.source,
        }
    }
}

/// Search result exposed to the rest of the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherSummary {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    pub source: SourceTag,
}
