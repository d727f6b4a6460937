//! Data source tags

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which bibliographic provider a record came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    #[default]
    SemanticScholar,
    OpenAlex,
    /// Hand-authored sample data; never overrides live records
    Sample,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::SemanticScholar => "semanticscholar",
            SourceTag::OpenAlex => "openalex",
            SourceTag::Sample => "sample",
        }
    }
    
    pub fn is_live(&self) -> bool {
        !matches!(self, SourceTag::Sample)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = AppError;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semanticscholar" | "semantic_scholar" | "s2" => Ok(SourceTag::SemanticScholar),
            "openalex" => Ok(SourceTag::OpenAlex),
            "sample" => Ok(SourceTag::Sample),
            _ => Err(AppError::UnknownSource { source_tag: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("OpenAlex".parse::<SourceTag>().unwrap(), SourceTag::OpenAlex);
        assert_eq!("semanticscholar".parse::<SourceTag>().unwrap(), SourceTag::SemanticScholar);
        assert!("crossref".parse::<SourceTag>().is_err());
    }
    
    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&SourceTag::SemanticScholar).unwrap();
        assert_eq!(json, "\"semanticscholar\"");
        assert!(!SourceTag::Sample.is_live());
    }
}
