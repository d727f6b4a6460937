//! In-memory provider for tests and offline runs
//!
//! Serves authors, works, and citation lists registered up front, and can
//! be told to fail or never answer selected calls.

use super::ProviderClient;
use crate::errors::{AppError, Result};
use crate::models::{AuthorDetail, AuthorRef, AuthorSummary, SourceTag, WorkSummary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider operation, used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SearchAuthors,
    AuthorDetail,
    AuthorWorks,
    CitingWorks,
    Work,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Fail,
    Hang,
}

/// Build a work with the given `(author_id, display_name)` authors
pub fn work(id: &str, title: &str, authors: &[(&str, &str)]) -> WorkSummary {
    WorkSummary {
        id: id.to_string(),
        title: title.to_string(),
        year: None,
        doi: None,
        venue: None,
        url: None,
        authors: authors
            .iter()
            .map(|(author_id, name)| AuthorRef::new(*author_id, *name))
            .collect(),
    }
}

/// Provider backed by in-memory maps
#[derive(Default)]
pub struct FixtureProvider {
    source: SourceTag,
    authors: HashMap<String, AuthorDetail>,
    author_order: Vec<String>,
    works: HashMap<String, Vec<WorkSummary>>,
    works_by_id: HashMap<String, WorkSummary>,
    citations: HashMap<String, Vec<WorkSummary>>,
    faults: HashMap<(Operation, String), Fault>,
    unavailable: bool,
    calls: AtomicUsize,
    call_log: std::sync::Mutex<Vec<(Operation, String)>>,
}

impl FixtureProvider {
    pub fn new(source: SourceTag) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }
    
    pub fn with_author(self, id: &str, name: &str) -> Self {
        let source = self.source;
        self.with_author_detail(AuthorDetail {
            provider_id: id.to_string(),
            display_name: name.to_string(),
            institution: None,
            paper_count: None,
            citation_count: None,
            source,
        })
    }
    
    pub fn with_author_detail(mut self, detail: AuthorDetail) -> Self {
        if !self.authors.contains_key(&detail.provider_id) {
            self.author_order.push(detail.provider_id.clone());
        }
        self.authors.insert(detail.provider_id.clone(), detail);
        self
    }
    
    /// Append a work to an author's list; works keep registration order
    pub fn with_work(mut self, author_id: &str, work: WorkSummary) -> Self {
        self.works_by_id.insert(work.id.clone(), work.clone());
        self.works.entry(author_id.to_string()).or_default().push(work);
        self
    }
    
    /// Record that `citing` cites the work `cited_id`
    pub fn with_citation(mut self, cited_id: &str, citing: WorkSummary) -> Self {
        self.works_by_id.entry(citing.id.clone()).or_insert_with(|| citing.clone());
        self.citations.entry(cited_id.to_string()).or_default().push(citing);
        self
    }
    
    /// Make one call fail with `ProviderUnavailable`
    pub fn failing(mut self, operation: Operation, key: &str) -> Self {
        self.faults.insert((operation, key.to_string()), Fault::Fail);
        self
    }
    
    /// Make one call never complete
    pub fn hanging(mut self, operation: Operation, key: &str) -> Self {
        self.faults.insert((operation, key.to_string()), Fault::Hang);
        self
    }
    
    /// Make every call fail with `ProviderUnavailable`
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
    
    /// Calls made so far, including failed ones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    
    /// Calls made so far for one operation
    pub fn calls_to(&self, operation: Operation) -> Vec<String> {
        self.call_log
            .lock()
            .map(|log| {
                log.iter()
                    .filter(|(op, _)| *op == operation)
                    .map(|(_, key)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
    
    async fn enter(&self, operation: Operation, key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.call_log.lock() {
            log.push((operation, key.to_string()));
        }
        
        if self.unavailable {
            return Err(self.unavailable_error(key));
        }
        
        match self.faults.get(&(operation, key.to_string())) {
            Some(Fault::Fail) => Err(self.unavailable_error(key)),
            Some(Fault::Hang) => std::future::pending().await,
            None => Ok(()),
        }
    }
    
    fn unavailable_error(&self, key: &str) -> AppError {
        AppError::ProviderUnavailable {
            provider: self.source.to_string(),
            message: format!("injected failure for {}", key),
        }
    }
}

#[async_trait]
impl ProviderClient for FixtureProvider {
    fn source(&self) -> SourceTag {
        self.source
    }
    
    async fn search_authors(&self, name: &str) -> Result<Vec<AuthorSummary>> {
        self.enter(Operation::SearchAuthors, name).await?;
        let needle = name.trim().to_lowercase();
        
        Ok(self
            .author_order
            .iter()
            .filter_map(|id| self.authors.get(id))
            .filter(|a| a.display_name.to_lowercase().contains(&needle))
            .map(|a| AuthorSummary {
                provider_id: a.provider_id.clone(),
                display_name: a.display_name.clone(),
                institution: a.institution.clone(),
                source: self.source,
            })
            .collect())
    }
    
    async fn get_author_detail(&self, author_id: &str) -> Result<AuthorDetail> {
        self.enter(Operation::AuthorDetail, author_id).await?;
        self.authors.get(author_id).cloned().ok_or_else(|| AppError::NotFound {
            resource_type: "author".to_string(),
            id: author_id.to_string(),
        })
    }
    
    async fn get_author_works(&self, author_id: &str) -> Result<Vec<WorkSummary>> {
        self.enter(Operation::AuthorWorks, author_id).await?;
        Ok(self.works.get(author_id).cloned().unwrap_or_default())
    }
    
    async fn get_citing_works(&self, work_id: &str, limit: usize) -> Result<Vec<WorkSummary>> {
        self.enter(Operation::CitingWorks, work_id).await?;
        Ok(self
            .citations
            .get(work_id)
            .map(|citing| citing.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
    
    async fn get_work(&self, work_id: &str) -> Result<WorkSummary> {
        self.enter(Operation::Work, work_id).await?;
        self.works_by_id.get(work_id).cloned().ok_or_else(|| AppError::NotFound {
            resource_type: "work".to_string(),
            id: work_id.to_string(),
        })
    }
}
