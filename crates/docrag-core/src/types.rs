//! Domain types shared by the chunker, the indexes, retrieval and evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ChunkId = String;

/// Metric name to value. Ordered so reports serialize deterministically.
pub type MetricSet = BTreeMap<String, f64>;

pub const UNKNOWN_TITLE: &str = "Unknown";

/// Provenance attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(alias = "paper_title")]
    pub document_title: String,
    pub section: String,
    pub level: u32,
    pub page_start: u32,
}

/// The atomic retrievable unit.
///
/// - `chunk_id`: `chunk_<n>`, sequential within one ingestion run
/// - `text`: never empty
/// - `token_count`: tokens under the chunker's counter, budget accounting only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub token_count: usize,
}

/// One fused candidate returned by hybrid retrieval.
///
/// `hybrid_score` is only comparable between results of the same query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub hybrid_score: f32,
}

impl RetrievalResult {
    pub fn from_chunk(chunk: &Chunk, hybrid_score: f32) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            text: chunk.text.clone(),
            metadata: chunk.metadata.clone(),
            hybrid_score,
        }
    }
}

/// A nearest-neighbour candidate from the semantic index. Smaller is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    pub chunk_id: ChunkId,
    pub distance: f32,
}

/// Section of a parsed document as supplied by the ingestion front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub page_start: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl Section {
    /// Nesting level, 1 when the parser did not report one.
    pub fn level(&self) -> u32 {
        self.level.unwrap_or(1)
    }

    /// Starting page: `page_start`, then `page`, then 1.
    pub fn page_start(&self) -> u32 {
        self.page_start.or(self.page).unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Document-level metadata. Anything besides the title is carried through
/// untouched into the processed record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }
}

/// Input record for one document: metadata plus recovered structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub structure: DocumentStructure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub num_chunks: usize,
}

/// Persisted output of chunking one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub metadata: DocumentMetadata,
    pub chunks: Vec<Chunk>,
    pub stats: DocumentStats,
}

/// Golden dataset identifiers appear both as numbers and strings in the wild.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// One labelled question of the golden dataset. Read-only ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub id: ItemId,
    pub question: String,
    pub relevant_chunk_ids: Vec<ChunkId>,
    pub golden_answer: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_sections: Option<Vec<String>>,
}
