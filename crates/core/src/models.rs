use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata shared by every chunk cut from one note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteMetadata {
    pub path: String,
    pub source: String,
    pub author: String,
    pub folder: String,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NoteMetadata {
    pub fn with_created(mut self, created: Option<NaiveDateTime>) -> Self {
        self.date = created.map(|value| value.date());
        self.created_date = created;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    #[serde(flatten)]
    pub metadata: NoteMetadata,
}

/// Row metadata persisted next to each embedding. `text` holds the
/// translated window, `text_original` the window as written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredChunk {
    pub text: String,
    pub text_original: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    #[serde(flatten)]
    pub metadata: NoteMetadata,
}

impl StoredChunk {
    pub fn new(chunk: &Chunk, translated: String) -> Self {
        Self {
            text: translated,
            text_original: chunk.text.clone(),
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Raw row handed back by the store's similarity procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreMatch {
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct QueryFilters {
    pub source: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchRequest {
    pub text: String,
    pub limit: Option<usize>,
    pub min_similarity: Option<f64>,
    pub filters: QueryFilters,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub path: String,
    /// Original-language text when stored, otherwise the translation.
    pub text: String,
    pub text_translated: String,
    /// Percentage in `[0, 100]`, one decimal.
    pub similarity: f64,
    pub author: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub source: String,
    pub author: String,
    pub extension: String,
    pub recursive: bool,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            source: "obsidian".to_string(),
            author: "unknown".to_string(),
            extension: "md".to_string(),
            recursive: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InputKind {
    Document,
    Query,
}

/// Ranked hits for one query, with the text that was actually embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    /// Present only when translation changed the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_query: Option<String>,
    pub hits: Vec<SearchHit>,
}
