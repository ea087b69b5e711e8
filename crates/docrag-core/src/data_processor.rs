//! Ingestion run: parsed-document JSON in, processed records and chunks out.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::chunker::HierarchicalChunker;
use crate::error::{Error, Result};
use crate::store::{list_json_files, write_processed};
use crate::types::{Chunk, DocumentStats, ParsedDocument, ProcessedDocument};

#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub total_chunks: usize,
    /// Every chunk of the run, in document order.
    pub chunks: Vec<Chunk>,
}

pub struct DataProcessor {
    chunker: HierarchicalChunker,
    output_dir: PathBuf,
}

impl DataProcessor {
    pub fn new(chunker: HierarchicalChunker, output_dir: impl Into<PathBuf>) -> Self {
        Self { chunker, output_dir: output_dir.into() }
    }

    /// Chunk every `*.json` parsed document under `data_dir`, at most `limit`
    /// of them. One id counter spans the run so ids stay unique across
    /// documents. Unreadable documents are skipped and counted as failed.
    ///
    /// Records are named after the path relative to `data_dir`, so
    /// `a/paper.json` becomes `a__paper.json`.
    pub fn process_directory(&self, data_dir: &Path, limit: Option<usize>) -> Result<IngestReport> {
        self.process_into(data_dir, limit, &self.output_dir)
    }

    /// Replace the records in the output directory with a fresh run.
    ///
    /// The run is written to a sibling staging directory first. Existing
    /// records are only swapped out when the run produced chunks; otherwise
    /// they are left untouched and `Error::Operation` is returned.
    pub fn rebuild(&self, data_dir: &Path, limit: Option<usize>) -> Result<IngestReport> {
        let staging = staging_dir(&self.output_dir);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;
        }
        let report = match self.process_into(data_dir, limit, &staging) {
            Ok(report) => report,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };
        if report.total_chunks == 0 {
            let _ = fs::remove_dir_all(&staging);
            return Err(Error::Operation(format!(
                "no chunks produced from {}, existing records kept",
                data_dir.display()
            )));
        }
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
        }
        fs::rename(&staging, &self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
        tracing::info!(dir = %self.output_dir.display(), "processed records replaced");
        Ok(report)
    }

    fn process_into(&self, data_dir: &Path, limit: Option<usize>, out_dir: &Path) -> Result<IngestReport> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("parsed document directory {}", data_dir.display())));
        }
        let mut files = list_json_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no parsed documents found");
            return Ok(IngestReport::default());
        }
        if let Some(limit) = limit {
            if files.len() > limit {
                files.truncate(limit);
                tracing::info!(limit, "limited ingestion to first documents");
            }
        }
        let mut report = IngestReport::default();
        let mut stems = HashSet::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::info!(file = %file_path.display(), "processing {}/{}", file_index + 1, files.len());
            let parsed = match read_parsed(file_path) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(file = %file_path.display(), error = %e, "skipping document");
                    report.documents_failed += 1;
                    continue;
                }
            };
            let chunks = self.chunker.chunk_document_from(&parsed.structure, &parsed.metadata, report.total_chunks);
            let record = ProcessedDocument {
                metadata: parsed.metadata,
                stats: DocumentStats { num_chunks: chunks.len() },
                chunks,
            };
            let stem = record_stem(data_dir, file_path);
            if !stems.insert(stem.clone()) {
                return Err(Error::Operation(format!(
                    "{} maps to record name {stem:?} which is already taken",
                    file_path.display()
                )));
            }
            write_processed(out_dir, &stem, &record)?;
            tracing::info!(chunks = record.chunks.len(), "document chunked");
            report.documents_processed += 1;
            report.total_chunks += record.chunks.len();
            report.chunks.extend(record.chunks);
        }
        tracing::info!(
            processed = report.documents_processed,
            failed = report.documents_failed,
            chunks = report.total_chunks,
            "ingestion complete"
        );
        Ok(report)
    }
}

fn read_parsed(path: &Path) -> Result<ParsedDocument> {
    let body = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&body).map_err(|e| Error::parse(path, e))
}

/// Relative path without extension, components joined by `__`.
fn record_stem(data_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(data_dir).unwrap_or(path).with_extension("");
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        "document".to_string()
    } else {
        parts.join("__")
    }
}

fn staging_dir(output_dir: &Path) -> PathBuf {
    let name = output_dir
        .file_name()
        .map_or_else(|| "processed".to_string(), |n| n.to_string_lossy().to_string());
    output_dir.with_file_name(format!("{name}.staging"))
}
