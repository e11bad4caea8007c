// tools/knowledge.rs
use super::{parse_args, to_value};
use crate::error::ToolError;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Built-in glossary a knowledge agent starts with.
pub const DEFAULT_ENTRIES: [(&str, &str); 7] = [
    ("agent", "An autonomous system that perceives, thinks, communicates, and acts"),
    ("tool", "A capability or function that enables agents to perform tasks"),
    ("graph", "A structure representing relationships between agents and tasks"),
    ("workflow", "A coordinated sequence of steps to accomplish goals"),
    ("multiagent", "Multiple agents working together to solve complex problems"),
    ("communication", "Message passing between agents for coordination"),
    ("coordination", "Mechanism to synchronize actions between multiple agents"),
];

/// Ordered key/value store searched by substring.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KnowledgeBase {
    entries: Vec<(String, String)>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut base = Self::new();
        for (key, value) in DEFAULT_ENTRIES {
            base.insert(key, value);
        }
        base
    }

    /// Adds an entry, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over keys and values. Key hits rank
    /// 0.9, value-only hits 0.7.
    pub fn search(&self, query: &str) -> SearchResults {
        let needle = query.to_lowercase();
        let results: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|(key, value)| {
                let in_key = key.to_lowercase().contains(&needle);
                if !in_key && !value.to_lowercase().contains(&needle) {
                    return None;
                }
                Some(SearchHit {
                    key: key.clone(),
                    value: value.clone(),
                    relevance: if in_key { 0.9 } else { 0.7 },
                })
            })
            .collect();

        SearchResults {
            query: query.to_string(),
            result_count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub key: String,
    pub value: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub result_count: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordHit {
    pub found: bool,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub text_length: usize,
    pub keywords_found: usize,
    pub extracted: BTreeMap<String, KeywordHit>,
}

/// Counts case-insensitive, non-overlapping occurrences of each keyword.
pub fn extract_information(text: &str, keywords: &[String]) -> Extraction {
    let haystack = text.to_lowercase();
    let extracted: BTreeMap<String, KeywordHit> = keywords
        .iter()
        .map(|keyword| {
            let count = haystack.matches(&keyword.to_lowercase()).count();
            (keyword.clone(), KeywordHit { found: count > 0, count })
        })
        .collect();

    Extraction {
        text_length: text.chars().count(),
        keywords_found: extracted.values().filter(|hit| hit.found).count(),
        extracted,
    }
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
struct ExtractArgs {
    text: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Search tool bound to one knowledge base.
pub fn search_knowledge_base_tool(base: Arc<KnowledgeBase>) -> Tool {
    Tool::new(
        "search_knowledge_base",
        "Search for information in knowledge base",
        move |args| {
            let params: SearchArgs = parse_args(args)?;
            if params.query.is_empty() {
                return Err(ToolError::InvalidArguments("query must not be empty".into()));
            }
            to_value(&base.search(&params.query))
        },
    )
    .with_parameter("query", "str")
}

pub fn extract_information_tool() -> Tool {
    Tool::new(
        "extract_information",
        "Extract specific information from text",
        |args| {
            let params: ExtractArgs = parse_args(args)?;
            to_value(&extract_information(&params.text, &params.keywords))
        },
    )
    .with_parameter("text", "str")
    .with_parameter("keywords", "List[str]")
}
