//! Common types used across the DocChat system

use serde::{Deserialize, Serialize};

/// A chunk of document text paired with its embedding, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub content: String,
    pub vector: Vec<f32>,
}

/// A persisted chunk record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub source: String,
    pub vector: Vec<f32>,
}

/// One similarity hit from the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub source: String,
    pub score: f32,
}

/// Answer returned by a generation backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    /// Distinct document names in first-seen order
    pub sources: Vec<String>,
}

impl ChatAnswer {
    pub fn ungrounded(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub document_count: usize,
    pub chunk_count: usize,
}

/// Collapse sources into an ordered set, keeping the first occurrence of each
pub fn distinct_sources<'a, I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<String> = Vec::new();
    for source in sources {
        if !seen.iter().any(|s| s == source) {
            seen.push(source.to_string());
        }
    }
    seen
}
