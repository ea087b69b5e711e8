use std::fs;
use tempfile::TempDir;

use docrag_core::chunker::HierarchicalChunker;
use docrag_core::data_processor::DataProcessor;
use docrag_core::error::Error;
use docrag_core::store::{load_all_chunks, read_processed, ChunkCache};

const PAPER_A: &str = r#"{
  "metadata": {"title": "Momentum Strategies", "year": 2021},
  "structure": {"sections": [
    {"title": "Abstract", "content": ["Momentum persists across markets.", "It decays after a year."], "page_start": 1},
    {"title": "Data", "content": ["We use daily prices."], "level": 2, "page": 3}
  ]}
}"#;

const PAPER_B: &str = r#"{
  "metadata": {},
  "structure": {"sections": [
    {"title": "Intro", "content": ["Volatility clusters in time."]}
  ]}
}"#;

fn processor(out: &std::path::Path) -> DataProcessor {
    DataProcessor::new(HierarchicalChunker::with_defaults(400, 50).expect("chunker"), out)
}

#[test]
fn ingestion_writes_records_with_run_unique_ids() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("b.json"), PAPER_B).unwrap();

    let report = processor(out.path()).process_directory(raw.path(), None).expect("ingest");
    assert_eq!(report.documents_processed, 2);
    assert_eq!(report.documents_failed, 0);
    assert_eq!(report.total_chunks, 3);

    let ids: Vec<&str> = report.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(ids, vec!["chunk_0", "chunk_1", "chunk_2"]);

    let a = read_processed(&out.path().join("a.json")).expect("record a");
    assert_eq!(a.stats.num_chunks, 2);
    assert_eq!(a.metadata.title.as_deref(), Some("Momentum Strategies"));
    assert_eq!(a.metadata.extra.get("year").and_then(|v| v.as_u64()), Some(2021));
    assert_eq!(a.chunks[1].metadata.level, 2);
    assert_eq!(a.chunks[1].metadata.page_start, 3);

    let b = read_processed(&out.path().join("b.json")).expect("record b");
    assert_eq!(b.chunks[0].chunk_id, "chunk_2");
    assert_eq!(b.chunks[0].metadata.document_title, "Unknown");
}

#[test]
fn malformed_document_is_skipped() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("broken.json"), "{ not json").unwrap();

    let report = processor(out.path()).process_directory(raw.path(), None).expect("ingest");
    assert_eq!(report.documents_processed, 1);
    assert_eq!(report.documents_failed, 1);
    assert!(!out.path().join("broken.json").exists());
}

#[test]
fn limit_caps_documents() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("b.json"), PAPER_B).unwrap();

    let report = processor(out.path()).process_directory(raw.path(), Some(1)).expect("ingest");
    assert_eq!(report.documents_processed, 1);
    assert_eq!(load_all_chunks(out.path()).expect("chunks").len(), 2);
}

#[test]
fn chunk_cache_indexes_every_processed_chunk() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("b.json"), PAPER_B).unwrap();
    processor(out.path()).process_directory(raw.path(), None).expect("ingest");

    let cache = ChunkCache::load(out.path()).expect("cache");
    assert_eq!(cache.len(), 3);
    let chunk = cache.get("chunk_2").expect("chunk_2");
    assert_eq!(chunk.text, "Volatility clusters in time.");
    assert!(cache.get("chunk_99").is_none());
}

#[test]
fn chunk_cache_tolerates_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let cache = ChunkCache::load(&tmp.path().join("nope")).expect("cache");
    assert!(cache.is_empty());
}

#[test]
fn same_stem_in_subdirectories_keeps_both_records() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::create_dir_all(raw.path().join("a")).unwrap();
    fs::create_dir_all(raw.path().join("b")).unwrap();
    fs::write(raw.path().join("a/paper.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("b/paper.json"), PAPER_B).unwrap();

    let report = processor(out.path()).process_directory(raw.path(), None).expect("ingest");
    assert_eq!(report.total_chunks, 3);
    assert!(out.path().join("a__paper.json").exists());
    assert!(out.path().join("b__paper.json").exists());

    let cache = ChunkCache::load(out.path()).expect("cache");
    for chunk in &report.chunks {
        assert!(cache.get(&chunk.chunk_id).is_some(), "{} missing from cache", chunk.chunk_id);
    }
}

#[test]
fn colliding_record_names_are_rejected() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::create_dir_all(raw.path().join("a")).unwrap();
    fs::write(raw.path().join("a/paper.json"), PAPER_A).unwrap();
    fs::write(raw.path().join("a__paper.json"), PAPER_B).unwrap();

    let err = processor(out.path()).process_directory(raw.path(), None).unwrap_err();
    assert!(matches!(err, Error::Operation(_)));
}

#[test]
fn missing_input_directory_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = processor(tmp.path()).process_directory(&tmp.path().join("typo"), None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn rebuild_replaces_records_after_a_productive_run() {
    let raw = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let out = root.path().join("processed");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("stale.json"), "{}").unwrap();
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();

    let report = processor(&out).rebuild(raw.path(), None).expect("rebuild");
    assert_eq!(report.total_chunks, 2);
    assert!(!out.join("stale.json").exists());
    assert_eq!(load_all_chunks(&out).expect("chunks").len(), 2);
    assert!(!root.path().join("processed.staging").exists());
}

#[test]
fn rebuild_without_chunks_keeps_existing_records() {
    let raw = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let out = root.path().join("processed");
    fs::write(raw.path().join("a.json"), PAPER_A).unwrap();
    processor(&out).rebuild(raw.path(), None).expect("first run");

    let empty = TempDir::new().unwrap();
    let err = processor(&out).rebuild(empty.path(), None).unwrap_err();
    assert!(matches!(err, Error::Operation(_)));
    let err = processor(&out).rebuild(&raw.path().join("typo"), None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(load_all_chunks(&out).expect("chunks").len(), 2);
    assert!(!root.path().join("processed.staging").exists());
}
