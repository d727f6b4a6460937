//! Author identity resolution
//!
//! Records denote the same researcher when their display names match
//! case-insensitively after trimming. No ORCID cross-referencing or
//! fuzzy matching is attempted, so distinct people sharing a name are
//! merged and name variants stay apart.

use scholarnet_common::models::{AuthorSummary, ResearcherSummary, SourceTag};
use std::collections::HashMap;

/// One logical researcher and the provider records merged into it
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResearcher {
    pub canonical_id: String,
    pub display_name: String,
    pub institution: Option<String>,
    pub source: SourceTag,
    /// Merged records in arrival order
    pub source_records: Vec<AuthorSummary>,
}

impl CanonicalResearcher {
    fn from_record(record: AuthorSummary) -> Self {
        Self {
            canonical_id: record.provider_id.clone(),
            display_name: record.display_name.clone(),
            institution: record.institution.clone(),
            source: record.source,
            source_records: vec![record],
        }
    }
    
    fn absorb(&mut self, record: AuthorSummary) {
        // Sample data never wins over live data
        if self.source == SourceTag::Sample && record.source.is_live() {
            self.canonical_id = record.provider_id.clone();
            self.display_name = record.display_name.clone();
            self.institution = record.institution.clone().or(self.institution.take());
            self.source = record.source;
        } else if self.institution.is_none() && (record.source.is_live() || !self.source.is_live()) {
            self.institution = record.institution.clone();
        }
        self.source_records.push(record);
    }
}

impl From<CanonicalResearcher> for ResearcherSummary {
    fn from(researcher: CanonicalResearcher) -> Self {
        Self {
            id: researcher.canonical_id,
            display_name: researcher.display_name,
            institution: researcher.institution,
            source: researcher.source,
        }
    }
}

/// Incremental resolver. Earlier records take precedence over later ones.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    researchers: Vec<CanonicalResearcher>,
    by_name: HashMap<String, usize>,
    by_record: HashMap<(SourceTag, String), usize>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Resolve a batch of records in input order
    pub fn resolve(records: impl IntoIterator<Item = AuthorSummary>) -> Vec<CanonicalResearcher> {
        let mut resolver = Self::new();
        for record in records {
            resolver.insert(record);
        }
        resolver.into_canonical()
    }
    
    /// Key under which two names are considered the same person
    pub fn match_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
    
    /// Merge one record and return the canonical researcher it belongs to
    pub fn insert(&mut self, record: AuthorSummary) -> &CanonicalResearcher {
        let record_key = (record.source, record.provider_id.clone());
        let name_key = Self::match_key(&record.display_name);
        
        let existing = self
            .by_record
            .get(&record_key)
            .or_else(|| (!name_key.is_empty()).then(|| self.by_name.get(&name_key)).flatten())
            .copied();
        
        let index = match existing {
            Some(index) => {
                if !self.by_record.contains_key(&record_key) {
                    self.researchers[index].absorb(record);
                }
                index
            }
            None => {
                self.researchers.push(CanonicalResearcher::from_record(record));
                self.researchers.len() - 1
            }
        };
        
        self.by_record.insert(record_key, index);
        if !name_key.is_empty() {
            self.by_name.entry(name_key).or_insert(index);
        }
        &self.researchers[index]
    }
    
    /// Canonical id for a record without merging it
    pub fn lookup(&self, source: SourceTag, provider_id: &str, display_name: &str) -> Option<&str> {
        let name_key = Self::match_key(display_name);
        self.by_record
            .get(&(source, provider_id.to_string()))
            .or_else(|| (!name_key.is_empty()).then(|| self.by_name.get(&name_key)).flatten())
            .map(|&index| self.researchers[index].canonical_id.as_str())
    }
    
    pub fn len(&self) -> usize {
        self.researchers.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.researchers.is_empty()
    }
    
    pub fn into_canonical(self) -> Vec<CanonicalResearcher> {
        self.researchers
    }
}
