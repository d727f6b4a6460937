//! Paper records

use super::SourceTag;
use serde::{Deserialize, Serialize};

/// Author entry on a work. Providers occasionally omit the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub provider_id: Option<String>,
    pub display_name: String,
}

impl AuthorRef {
    pub fn new(provider_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            display_name: display_name.into(),
        }
    }
}

/// Provider-normalized work with its ordered author list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub venue: Option<String>,
    pub url: Option<String>,
    pub authors: Vec<AuthorRef>,
}

impl WorkSummary {
    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().map(|a| a.display_name.clone()).collect()
    }
    
    /// Lightweight record attached to citation edges
    pub fn to_supporting(&self) -> SupportingPaper {
        SupportingPaper {
            id: self.id.clone(),
            title: self.title.clone(),
            authors: self.author_names(),
            year: self.year,
            doi: self.doi.clone(),
            url: self.url.clone(),
        }
    }
    
    pub fn to_node(&self, source: SourceTag) -> PaperNode {
        PaperNode {
            id: self.id.clone(),
            title: self.title.clone(),
            year: self.year,
            authors: self.author_names(),
            doi: self.doi.clone(),
            venue: self.venue.clone(),
            source,
        }
    }
}

/// Paper vertex, used by paper-citation networks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperNode {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub source: SourceTag,
}

/// Evidence explaining why a citation edge exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingPaper {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
