//! Semantic Scholar graph API client

use super::http::{HttpFetcher, HttpSettings};
use super::ProviderClient;
use crate::config::{ProvidersConfig, SemanticScholarConfig};
use crate::errors::{AppError, Result};
use crate::models::{AuthorDetail, AuthorRef, AuthorSummary, SourceTag, WorkSummary};
use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::OnceLock;

const AUTHOR_SEARCH_FIELDS: &str = "name,affiliations,paperCount";
const AUTHOR_FIELDS: &str = "name,affiliations,paperCount,citationCount,hIndex";
const PAPER_FIELDS: &str = "title,venue,year,authors,externalIds,url";

/// Largest page the citations endpoint serves
const MAX_CITATIONS_PAGE: usize = 1000;

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Author {
    author_id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    affiliations: Vec<String>,
    paper_count: Option<u64>,
    citation_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2AuthorRef {
    author_id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    venue: Option<String>,
    year: Option<i32>,
    url: Option<String>,
    #[serde(default)]
    external_ids: Option<S2ExternalIds>,
    #[serde(default)]
    authors: Vec<S2AuthorRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Citation {
    citing_paper: Option<S2Paper>,
}

/// Client for `api.semanticscholar.org/graph/v1`
pub struct SemanticScholarClient {
    http: HttpFetcher,
    base_url: String,
    works_limit: usize,
}

impl SemanticScholarClient {
    pub fn new(config: &SemanticScholarConfig, providers: &ProvidersConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| AppError::Configuration {
                message: "semantic_scholar.api_key is not a valid header value".to_string(),
            })?;
            headers.insert("x-api-key", value);
        }
        
        let http = HttpFetcher::new(HttpSettings {
            source: SourceTag::SemanticScholar,
            call_timeout: providers.call_timeout(),
            requests_per_second: config.requests_per_second,
            max_retries: providers.max_retries,
            default_headers: headers,
        })?;
        
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            works_limit: config.works_limit,
        })
    }
    
    /// Reject ids that would change the request path
    fn checked_id<'a>(&self, id: &'a str) -> Result<&'a str> {
        static ID: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = ID
            .get_or_init(|| Regex::new(r"^[0-9A-Za-z]+$").ok())
            .as_ref()
            .ok_or_else(|| AppError::Internal {
                message: "SemanticScholar id pattern failed to compile".to_string(),
            })?;
        
        let id = id.trim();
        if pattern.is_match(id) {
            Ok(id)
        } else {
            Err(AppError::InvalidIdentifier {
                provider: SourceTag::SemanticScholar.to_string(),
                id: id.to_string(),
            })
        }
    }
}

fn normalize_summary(author: S2Author) -> Option<AuthorSummary> {
    Some(AuthorSummary {
        provider_id: author.author_id?,
        display_name: author.name.unwrap_or_default(),
        institution: author.affiliations.into_iter().next().filter(|a| !a.is_empty()),
        source: SourceTag::SemanticScholar,
    })
}

fn normalize_detail(author: S2Author, requested_id: &str) -> AuthorDetail {
    AuthorDetail {
        provider_id: author.author_id.unwrap_or_else(|| requested_id.to_string()),
        display_name: author.name.unwrap_or_default(),
        institution: author.affiliations.into_iter().next().filter(|a| !a.is_empty()),
        paper_count: author.paper_count,
        citation_count: author.citation_count,
        source: SourceTag::SemanticScholar,
    }
}

/// Papers without an id cannot back an edge and are dropped
fn normalize_paper(paper: S2Paper) -> Option<WorkSummary> {
    let id = paper.paper_id?;
    Some(WorkSummary {
        id,
        title: paper.title.unwrap_or_default(),
        year: paper.year,
        doi: paper.external_ids.and_then(|ids| ids.doi),
        venue: paper.venue.filter(|v| !v.is_empty()),
        url: paper.url,
        authors: paper
            .authors
            .into_iter()
            .map(|a| AuthorRef {
                provider_id: a.author_id,
                display_name: a.name.unwrap_or_default(),
            })
            .collect(),
    })
}

#[async_trait]
impl ProviderClient for SemanticScholarClient {
    fn source(&self) -> SourceTag {
        SourceTag::SemanticScholar
    }
    
    async fn search_authors(&self, name: &str) -> Result<Vec<AuthorSummary>> {
        let url = format!("{}/author/search", self.base_url);
        let page: Page<S2Author> = self.http
            .get_json(
                &url,
                &[("query", name.to_string()), ("fields", AUTHOR_SEARCH_FIELDS.to_string())],
                "author search",
                name,
            )
            .await?;
        
        Ok(page.data.into_iter().filter_map(normalize_summary).collect())
    }
    
    async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail> {
        let id = self.checked_id(author_id)?;
        let url = format!("{}/author/{}", self.base_url, id);
        let author: S2Author = self.http
            .get_json(&url, &[("fields", AUTHOR_FIELDS.to_string())], "author", id)
            .await?;
        
        Ok(normalize_detail(author, id))
    }
    
    async fn get_author_works(&self, author_id: &str) -> Result<Vec<WorkSummary>> {
        let id = self.checked_id(author_id)?;
        let url = format!("{}/author/{}/papers", self.base_url, id);
        let page: Page<S2Paper> = self.http
            .get_json(
                &url,
                &[
                    ("fields", PAPER_FIELDS.to_string()),
                    ("limit", self.works_limit.to_string()),
                ],
                "author",
                id,
            )
            .await?;
        
        Ok(page.data.into_iter().filter_map(normalize_paper).collect())
    }
    
    async fn get_citing_works(&self, work_id: &str, limit: usize) -> Result<Vec<WorkSummary>> {
        let id = self.checked_id(work_id)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        
        let url = format!("{}/paper/{}/citations", self.base_url, id);
        let page: Page<S2Citation> = self.http
            .get_json(
                &url,
                &[
                    ("fields", PAPER_FIELDS.to_string()),
                    ("limit", limit.min(MAX_CITATIONS_PAGE).to_string()),
                ],
                "paper",
                id,
            )
            .await?;
        
        Ok(page
            .data
            .into_iter()
            .filter_map(|c| c.citing_paper)
            .filter_map(normalize_paper)
            .take(limit)
            .collect())
    }
    
    async fn get_work(&self, work_id: &str) -> Result<WorkSummary> {
        let id = self.checked_id(work_id)?;
        let url = format!("{}/paper/{}", self.base_url, id);
        let paper: S2Paper = self.http
            .get_json(&url, &[("fields", PAPER_FIELDS.to_string())], "paper", id)
            .await?;
        
        normalize_paper(paper).ok_or_else(|| AppError::NotFound {
            resource_type: "paper".to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_normalize_author_search() {
        let body = r#"{
            "total": 2,
            "data": [
                {"authorId": "1741101", "name": "Oren Etzioni", "affiliations": ["Allen Institute for AI"], "paperCount": 300},
                {"authorId": null, "name": "Ghost"}
            ]
        }"#;
        let page: Page<S2Author> = serde_json::from_str(body).unwrap();
        let authors: Vec<_> = page.data.into_iter().filter_map(normalize_summary).collect();
        
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].provider_id, "1741101");
        assert_eq!(authors[0].institution.as_deref(), Some("Allen Institute for AI"));
        assert_eq!(authors[0].source, SourceTag::SemanticScholar);
    }
    
    #[test]
    fn test_normalize_citations_page() {
        let body = r#"{
            "offset": 0,
            "data": [
                {"citingPaper": {
                    "paperId": "abc123",
                    "title": "Follow-up work",
                    "venue": "",
                    "year": 2021,
                    "url": "https://www.semanticscholar.org/paper/abc123",
                    "externalIds": {"DOI": "10.1000/xyz"},
                    "authors": [{"authorId": "42", "name": "Grace Hopper"}, {"authorId": null, "name": "Anon"}]
                }},
                {"citingPaper": {"paperId": null, "title": "Unresolved"}}
            ]
        }"#;
        let page: Page<S2Citation> = serde_json::from_str(body).unwrap();
        let works: Vec<_> = page
            .data
            .into_iter()
            .filter_map(|c| c.citing_paper)
            .filter_map(normalize_paper)
            .collect();
        
        assert_eq!(works.len(), 1);
        let work = &works[0];
        assert_eq!(work.doi.as_deref(), Some("10.1000/xyz"));
        assert!(work.venue.is_none());
        assert_eq!(work.authors[0], AuthorRef::new("42", "Grace Hopper"));
        assert!(work.authors[1].provider_id.is_none());
    }
    
    #[test]
    fn test_unnamed_authors_keep_blank_names() {
        let body = r#"{
            "paperId": "p1",
            "title": "Anonymous contributors",
            "authors": [{"authorId": "1"}, {"authorId": "2", "name": null}]
        }"#;
        let paper: S2Paper = serde_json::from_str(body).unwrap();
        let work = normalize_paper(paper).unwrap();
        
        assert_eq!(work.authors[0], AuthorRef::new("1", ""));
        assert_eq!(work.authors[1], AuthorRef::new("2", ""));
    }
    
    #[test]
    fn test_missing_data_is_empty_page() {
        let page: Page<S2Paper> = serde_json::from_str(r#"{"offset": 0}"#).unwrap();
        assert!(page.data.is_empty());
    }
    
    #[test]
    fn test_path_ids_are_validated() {
        let client = SemanticScholarClient::new(
            &SemanticScholarConfig::default(),
            &ProvidersConfig::default(),
        )
        .unwrap();
        assert!(client.checked_id("1741101").is_ok());
        assert!(client.checked_id("../paper/x").is_err());
    }
}
