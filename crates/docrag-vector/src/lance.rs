use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use docrag_core::traits::{Embedder, SemanticIndex};
use docrag_core::types::{Chunk, SemanticHit};

use crate::schema::build_arrow_schema;

const BATCH_SIZE: usize = 1000;

/// Chunk embeddings in a LanceDB table, searched by cosine distance.
///
/// lancedb is async; the index owns a runtime and blocks on it so callers
/// stay synchronous. Do not call from inside another tokio runtime.
pub struct LanceSemanticIndex {
    runtime: Runtime,
    db: Connection,
    table_name: String,
    embedder: Box<dyn Embedder>,
}

impl LanceSemanticIndex {
    pub fn open(db_path: &Path, table_name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
        std::fs::create_dir_all(db_path)?;
        let runtime = Runtime::new()?;
        let db = runtime.block_on(async { connect(db_path.to_string_lossy().as_ref()).execute().await })?;
        tracing::debug!(db = %db_path.display(), table = table_name, "opened semantic index");
        Ok(Self { runtime, db, table_name: table_name.to_string(), embedder })
    }

    async fn table_exists(&self) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.table_name))
    }

    pub fn count(&self) -> Result<usize> {
        self.runtime.block_on(async {
            if !self.table_exists().await? {
                return Ok(0);
            }
            let table = self.db.open_table(&self.table_name).execute().await?;
            Ok(table.count_rows(None).await?)
        })
    }

    async fn insert_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<()> {
        let record_batch = self.to_record_batch(chunks, vectors)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.table_exists().await? {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Result<RecordBatch> {
        let dim = i32::try_from(self.embedder.dim())?;
        let mut ids = Vec::with_capacity(chunks.len());
        let mut texts = Vec::with_capacity(chunks.len());
        let mut titles = Vec::with_capacity(chunks.len());
        let mut sections = Vec::with_capacity(chunks.len());
        let mut levels = Vec::with_capacity(chunks.len());
        let mut pages = Vec::with_capacity(chunks.len());
        for c in chunks {
            ids.push(c.chunk_id.clone());
            texts.push(c.text.clone());
            titles.push(c.metadata.document_title.clone());
            sections.push(c.metadata.section.clone());
            levels.push(i32::try_from(c.metadata.level)?);
            pages.push(i32::try_from(c.metadata.page_start)?);
        }
        let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
        Ok(RecordBatch::try_new(
            build_arrow_schema(dim),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(titles)),
                Arc::new(StringArray::from(sections)),
                Arc::new(Int32Array::from(levels)),
                Arc::new(Int32Array::from(pages)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
            ],
        )?)
    }

    async fn search_async(&self, query: &str, n: usize) -> Result<Vec<SemanticHit>> {
        if !self.table_exists().await? {
            tracing::debug!(table = %self.table_name, "semantic table missing");
            return Ok(Vec::new());
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        if table.count_rows(None).await? == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        let mut stream = table
            .vector_search(query_vec)?
            .distance_type(DistanceType::Cosine)
            .limit(n)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = batch
                .column_by_name("chunk_id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("chunk_id column missing"))?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("_distance column missing"))?;
            for i in 0..batch.num_rows() {
                hits.push(SemanticHit { chunk_id: ids.value(i).to_string(), distance: distances.value(i) });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n);
        Ok(hits)
    }
}

impl SemanticIndex for LanceSemanticIndex {
    fn add(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            tracing::info!("no chunks to add to the semantic index");
            return Ok(());
        }
        tracing::info!(chunks = chunks.len(), table = %self.table_name, "adding chunks to semantic index");
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
                .progress_chars("#>-"),
        );
        for batch in chunks.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len()));
            }
            self.runtime.block_on(self.insert_batch(batch, vectors))?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(chunks = chunks.len(), "semantic index updated");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.runtime.block_on(async {
            if self.table_exists().await? {
                let table = self.db.open_table(&self.table_name).execute().await?;
                table.delete("true").await?;
                tracing::info!(table = %self.table_name, "semantic index cleared");
            }
            Ok(())
        })
    }

    fn search(&self, query: &str, n: usize) -> Result<Vec<SemanticHit>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        self.runtime.block_on(self.search_async(query, n))
    }
}
