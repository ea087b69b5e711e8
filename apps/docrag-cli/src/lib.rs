//! Wiring shared by the `docrag-*` binaries: logging setup and building the
//! chunker and retrieval engine from one loaded `AppConfig`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use docrag_core::chunker::{HierarchicalChunker, WhitespaceTokenCounter};
use docrag_core::config::AppConfig;
use docrag_core::store::ChunkCache;
use docrag_core::traits::TokenCounter;
use docrag_embed::{build_embedder, HfTokenCounter};
use docrag_hybrid::HybridSearchEngine;
use docrag_text::TantivyLexicalIndex;
use docrag_vector::LanceSemanticIndex;

pub type Engine = HybridSearchEngine<LanceSemanticIndex, TantivyLexicalIndex>;

/// Logs go to stderr, filtered by `RUST_LOG` (default `info`); stdout is for results.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub fn load_config() -> Result<AppConfig> {
    AppConfig::load().context("Error loading config")
}

pub fn build_chunker(config: &AppConfig) -> Result<HierarchicalChunker> {
    let counter: Box<dyn TokenCounter> = match &config.chunking.tokenizer_path {
        Some(path) => Box::new(HfTokenCounter::from_file(&config.path(path))?),
        None => Box::new(WhitespaceTokenCounter),
    };
    Ok(HierarchicalChunker::from_config(&config.chunking, counter)?)
}

pub fn open_lexical(config: &AppConfig) -> Result<TantivyLexicalIndex> {
    TantivyLexicalIndex::open_or_create(&config.path(&config.data.tantivy_index_dir))
}

pub fn open_semantic(config: &AppConfig) -> Result<LanceSemanticIndex> {
    let embedder = build_embedder(config)?;
    LanceSemanticIndex::open(&config.path(&config.data.lancedb_dir), &config.data.lancedb_table, embedder)
}

/// Both indexes plus the chunk cache scanned from the processed records.
pub fn open_engine(config: &AppConfig) -> Result<Engine> {
    let cache = ChunkCache::load(&config.path(&config.data.processed_dir))?;
    let engine = HybridSearchEngine::from_config(open_semantic(config)?, open_lexical(config)?, cache, &config.retrieval)?;
    Ok(engine)
}
