use anyhow::{Context, Result};
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

use docrag_core::traits::LexicalIndex;
use docrag_core::types::Chunk;

use crate::tantivy_utils::{
    build_schema, register_tokenizer, FIELD_CHUNK_ID, FIELD_DOCUMENT_TITLE, FIELD_SECTION, FIELD_TEXT,
};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// BM25 ranking over chunk text. On disk the index survives restarts;
/// `build` swaps the whole content in a single commit.
pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    chunk_id_field: Field,
    text_field: Field,
    section_field: Field,
    title_field: Field,
}

impl TantivyLexicalIndex {
    /// Reopen the index persisted in `index_dir`, or create an empty one.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        let index = if index_dir.join("meta.json").exists() {
            tracing::debug!(dir = %index_dir.display(), "opening lexical index");
            Index::open_in_dir(index_dir)
                .with_context(|| format!("Failed to open tantivy index at {}", index_dir.display()))?
        } else {
            std::fs::create_dir_all(index_dir)?;
            tracing::info!(dir = %index_dir.display(), "creating lexical index");
            Index::create_in_dir(index_dir, build_schema())?
        };
        Self::from_index(index)
    }

    /// Throwaway index held in RAM.
    pub fn in_memory() -> Result<Self> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    fn from_index(index: Index) -> Result<Self> {
        register_tokenizer(&index);
        let schema = index.schema();
        let chunk_id_field = schema.get_field(FIELD_CHUNK_ID)?;
        let text_field = schema.get_field(FIELD_TEXT)?;
        let section_field = schema.get_field(FIELD_SECTION)?;
        let title_field = schema.get_field(FIELD_DOCUMENT_TITLE)?;
        let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
        Ok(Self { index, reader, chunk_id_field, text_field, section_field, title_field })
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

impl LexicalIndex for TantivyLexicalIndex {
    fn build(&self, chunks: &[Chunk]) -> Result<()> {
        let mut writer: IndexWriter = self.index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET)?;
        writer.delete_all_documents()?;
        for c in chunks {
            writer.add_document(doc!(
                self.chunk_id_field => c.chunk_id.clone(),
                self.text_field => c.text.clone(),
                self.section_field => c.metadata.section.clone(),
                self.title_field => c.metadata.document_title.clone(),
            ))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        tracing::info!(chunks = chunks.len(), "lexical index built");
        Ok(())
    }

    fn search(&self, query: &str, n: usize) -> Result<Vec<String>> {
        if n == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            tracing::debug!(query, errors = errors.len(), "lenient query parse dropped terms");
        }
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(n))?;
        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            if let Some(id) = doc.get_first(self.chunk_id_field).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }
}
