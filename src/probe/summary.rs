use crate::api::{QueryResponse, SearchHit, SearchResponse};
use serde_json::Value;
use std::collections::BTreeMap;

/// Terms that suggest an answer drew on ER-modeling material.
pub const DEFAULT_KEYWORDS: [&str; 6] = [
    "entity relationship",
    "er model",
    "entity",
    "relationship",
    "attribute",
    "primary key",
];

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySummary {
    pub response_length: usize,
    pub has_search_results: bool,
    pub metadata: Value,
    pub response: String,
    pub results: Vec<SearchHit>,
}

impl QuerySummary {
    pub fn from_response(response: QueryResponse) -> Self {
        let text = response.response.unwrap_or_default();
        let results = response.search_results.unwrap_or_default();

        Self {
            response_length: text.chars().count(),
            has_search_results: !results.is_empty(),
            metadata: response.metadata,
            response: text,
            results,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        Self::from_response(QueryResponse::from_value(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub total: usize,
    /// Chunk count per source name.
    pub sources: BTreeMap<String, usize>,
    /// `None` when no target was named.
    pub target_found: Option<bool>,
    pub target_sample: Option<String>,
}

impl SearchSummary {
    pub fn from_response(response: &SearchResponse, target: Option<&str>) -> Self {
        let mut sources = BTreeMap::new();
        for hit in &response.results {
            *sources.entry(hit.source_name.clone()).or_insert(0) += 1;
        }

        let target_hit = target.and_then(|t| response.results.iter().find(|hit| hit.source_name == t));

        Self {
            total: response.results.len(),
            sources,
            target_found: target.map(|_| target_hit.is_some()),
            target_sample: target_hit.map(|hit| hit.content.clone()),
        }
    }
}

/// What an answer mentions, by case-insensitive substring containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    TargetSource(String),
    Keywords(Vec<String>),
    Nothing,
}

impl Mention {
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::Nothing)
    }
}

/// The target source name wins over keywords; keywords are listed in the
/// order given.
pub fn check_mentions<S: AsRef<str>>(text: &str, target: Option<&str>, keywords: &[S]) -> Mention {
    let haystack = text.to_lowercase();

    if let Some(target) = target {
        if haystack.contains(&target.to_lowercase()) {
            return Mention::TargetSource(target.to_string());
        }
    }

    let found: Vec<String> = keywords
        .iter()
        .filter_map(|keyword| {
            let keyword: &str = keyword.as_ref();
            haystack
                .contains(&keyword.to_lowercase())
                .then(|| keyword.to_string())
        })
        .collect();

    if found.is_empty() {
        Mention::Nothing
    } else {
        Mention::Keywords(found)
    }
}
