//! Processed-document records on disk and the chunk cache built from them.
//!
//! Every ingested document is written as `<stem>.json` holding its metadata,
//! chunks and stats. The cache scans all of them on construction; there is no
//! incremental refresh, a re-ingest means building a new cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Chunk, ProcessedDocument};

pub fn write_processed(dir: &Path, stem: &str, record: &ProcessedDocument) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = dir.join(format!("{stem}.json"));
    let body = serde_json::to_string_pretty(record).map_err(|e| Error::parse(&path, e))?;
    fs::write(&path, body).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

pub fn read_processed(path: &Path) -> Result<ProcessedDocument> {
    let body = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&body).map_err(|e| Error::parse(path, e))
}

/// Sorted `*.json` files directly or transitively under `dir`.
pub fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// All chunks of a processed corpus, in file order then chunk order.
pub fn load_all_chunks(dir: &Path) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for path in list_json_files(dir) {
        chunks.extend(read_processed(&path)?.chunks);
    }
    Ok(chunks)
}

/// Read-only lookup from `chunk_id` to the full chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkCache {
    chunks: HashMap<String, Chunk>,
}

impl ChunkCache {
    /// Full scan of the processed-record directory. A missing directory
    /// gives an empty cache.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "processed directory missing, chunk cache is empty");
            return Ok(Self::default());
        }
        let cache = Self::from_chunks(load_all_chunks(dir)?);
        tracing::info!(dir = %dir.display(), chunks = cache.len(), "chunk cache loaded");
        Ok(cache)
    }

    /// Later chunks win on id collision.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        let mut map = HashMap::new();
        for chunk in chunks {
            if let Some(prev) = map.insert(chunk.chunk_id.clone(), chunk) {
                tracing::warn!(chunk_id = %prev.chunk_id, "duplicate chunk id in corpus");
            }
        }
        Self { chunks: map }
    }

    pub fn get(&self, chunk_id: &str) -> Option<&Chunk> {
        self.chunks.get(chunk_id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
