//! OpenAlex client
//!
//! OpenAlex reports ids as URLs (`https://openalex.org/A5023888391`). The
//! client strips that prefix everywhere so ids compare equal no matter
//! which endpoint produced them.

use super::http::{HttpFetcher, HttpSettings};
use super::ProviderClient;
use crate::config::{OpenAlexConfig, ProvidersConfig};
use crate::errors::{AppError, Result};
use crate::models::{AuthorDetail, AuthorRef, AuthorSummary, SourceTag, WorkSummary};
use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::OnceLock;

const ID_PREFIX: &str = "https://openalex.org/";
const DOI_PREFIX: &str = "https://doi.org/";

/// Largest page OpenAlex serves
const MAX_PER_PAGE: usize = 200;

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Deserialize)]
struct Institution {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct OaAuthor {
    id: String,
    display_name: Option<String>,
    works_count: Option<u64>,
    cited_by_count: Option<u64>,
    #[serde(default)]
    last_known_institutions: Vec<Institution>,
    #[serde(default)]
    last_known_institution: Option<Institution>,
}

impl OaAuthor {
    fn institution(&mut self) -> Option<String> {
        let first = if self.last_known_institutions.is_empty() {
            self.last_known_institution.take()
        } else {
            Some(self.last_known_institutions.swap_remove(0))
        };
        first.and_then(|i| i.display_name).filter(|n| !n.is_empty())
    }
}

#[derive(Deserialize)]
struct OaAuthorRef {
    id: Option<String>,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct OaAuthorship {
    author: OaAuthorRef,
}

#[derive(Deserialize)]
struct OaSource {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct OaLocation {
    source: Option<OaSource>,
    landing_page_url: Option<String>,
}

#[derive(Deserialize)]
struct OaWork {
    id: String,
    title: Option<String>,
    display_name: Option<String>,
    publication_year: Option<i32>,
    doi: Option<String>,
    primary_location: Option<OaLocation>,
    #[serde(default)]
    authorships: Vec<OaAuthorship>,
}

/// Client for `api.openalex.org`
pub struct OpenAlexClient {
    http: HttpFetcher,
    base_url: String,
    mailto: Option<String>,
    works_limit: usize,
}

/// Strip the URL prefix OpenAlex puts on entity ids
pub fn clean_id(id: &str) -> &str {
    let id = id.trim();
    id.strip_prefix(ID_PREFIX).unwrap_or(id)
}

fn normalize_doi(doi: String) -> String {
    doi.strip_prefix(DOI_PREFIX).map(str::to_string).unwrap_or(doi)
}

impl OpenAlexClient {
    pub fn new(config: &OpenAlexConfig, providers: &ProvidersConfig) -> Result<Self> {
        let http = HttpFetcher::new(HttpSettings {
            source: SourceTag::OpenAlex,
            call_timeout: providers.call_timeout(),
            requests_per_second: config.requests_per_second,
            max_retries: providers.max_retries,
            default_headers: HeaderMap::new(),
        })?;
        
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
            works_limit: config.works_limit.clamp(1, MAX_PER_PAGE),
        })
    }
    
    /// Clean the id and check it is an author (`A…`) or work (`W…`) key
    fn checked_id<'a>(&self, id: &'a str, kind: char) -> Result<&'a str> {
        static ID: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = ID
            .get_or_init(|| Regex::new(r"^[AW][0-9]+$").ok())
            .as_ref()
            .ok_or_else(|| AppError::Internal {
                message: "OpenAlex id pattern failed to compile".to_string(),
            })?;
        
        let cleaned = clean_id(id);
        if pattern.is_match(cleaned) && cleaned.starts_with(kind) {
            Ok(cleaned)
        } else {
            Err(AppError::InvalidIdentifier {
                provider: SourceTag::OpenAlex.to_string(),
                id: id.to_string(),
            })
        }
    }
    
    fn query(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.clone()));
        }
        params
    }
}

fn normalize_summary(mut author: OaAuthor) -> AuthorSummary {
    let institution = author.institution();
    AuthorSummary {
        provider_id: clean_id(&author.id).to_string(),
        display_name: author.display_name.unwrap_or_default(),
        institution,
        source: SourceTag::OpenAlex,
    }
}

fn normalize_detail(mut author: OaAuthor) -> AuthorDetail {
    let institution = author.institution();
    AuthorDetail {
        provider_id: clean_id(&author.id).to_string(),
        display_name: author.display_name.unwrap_or_default(),
        institution,
        paper_count: author.works_count,
        citation_count: author.cited_by_count,
        source: SourceTag::OpenAlex,
    }
}

fn normalize_work(work: OaWork) -> WorkSummary {
    let (venue, url) = match work.primary_location {
        Some(location) => (
            location.source.and_then(|s| s.display_name),
            location.landing_page_url,
        ),
        None => (None, None),
    };
    
    WorkSummary {
        id: clean_id(&work.id).to_string(),
        title: work.title.or(work.display_name).unwrap_or_default(),
        year: work.publication_year,
        doi: work.doi.map(normalize_doi),
        venue,
        url,
        authors: work
            .authorships
            .into_iter()
            .map(|a| AuthorRef {
                provider_id: a.author.id.as_deref().map(clean_id).map(str::to_string),
                display_name: a.author.display_name.unwrap_or_default(),
            })
            .collect(),
    }
}

#[async_trait]
impl ProviderClient for OpenAlexClient {
    fn source(&self) -> SourceTag {
        SourceTag::OpenAlex
    }
    
    async fn search_authors(&self, name: &str) -> Result<Vec<AuthorSummary>> {
        let url = format!("{}/authors", self.base_url);
        let query = self.query(vec![("search", name.to_string())]);
        let page: Page<OaAuthor> = self.http
            .get_json(&url, &query, "author search", name)
            .await?;
        
        Ok(page.results.into_iter().map(normalize_summary).collect())
    }
    
    async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail> {
        let id = self.checked_id(author_id, 'A')?;
        let url = format!("{}/authors/{}", self.base_url, id);
        let author: OaAuthor = self.http
            .get_json(&url, &self.query(Vec::new()), "author", id)
            .await?;
        
        Ok(normalize_detail(author))
    }
    
    async fn get_author_works(&self, author_id: &str) -> Result<Vec<WorkSummary>> {
        let id = self.checked_id(author_id, 'A')?;
        let url = format!("{}/works", self.base_url);
        let query = self.query(vec![
            ("filter", format!("author.id:{}", id)),
            ("per-page", self.works_limit.to_string()),
        ]);
        let page: Page<OaWork> = self.http.get_json(&url, &query, "author", id).await?;
        
        Ok(page.results.into_iter().map(normalize_work).collect())
    }
    
    async fn get_citing_works(&self, work_id: &str, limit: usize) -> Result<Vec<WorkSummary>> {
        let id = self.checked_id(work_id, 'W')?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        
        let url = format!("{}/works", self.base_url);
        let query = self.query(vec![
            ("filter", format!("cites:{}", id)),
            ("per-page", limit.min(MAX_PER_PAGE).to_string()),
        ]);
        let page: Page<OaWork> = self.http.get_json(&url, &query, "work", id).await?;
        
        Ok(page.results.into_iter().map(normalize_work).take(limit).collect())
    }
    
    async fn get_work(&self, work_id: &str) -> Result<WorkSummary> {
        let id = self.checked_id(work_id, 'W')?;
        let url = format!("{}/works/{}", self.base_url, id);
        let work: OaWork = self.http
            .get_json(&url, &self.query(Vec::new()), "work", id)
            .await?;
        
        Ok(normalize_work(work))
    }
}
