use anyhow::{anyhow, Result};
use std::sync::RwLock;

use docrag_core::traits::{Embedder, SemanticIndex};
use docrag_core::types::{Chunk, SemanticHit};

/// Brute-force cosine search held in RAM. For tests and small corpora.
pub struct InMemorySemanticIndex {
    embedder: Box<dyn Embedder>,
    rows: RwLock<Vec<(String, Vec<f32>)>>,
}

impl InMemorySemanticIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self { embedder, rows: RwLock::new(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

impl SemanticIndex for InMemorySemanticIndex {
    fn add(&self, chunks: &[Chunk]) -> Result<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len()));
        }
        let mut rows = self.rows.write().map_err(|_| anyhow!("semantic index lock poisoned"))?;
        rows.extend(chunks.iter().map(|c| c.chunk_id.clone()).zip(vectors));
        tracing::debug!(added = chunks.len(), total = rows.len(), "in-memory semantic index updated");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.rows.write().map_err(|_| anyhow!("semantic index lock poisoned"))?.clear();
        Ok(())
    }

    fn search(&self, query: &str, n: usize) -> Result<Vec<SemanticHit>> {
        let rows = self.rows.read().map_err(|_| anyhow!("semantic index lock poisoned"))?;
        if n == 0 || rows.is_empty() {
            return Ok(Vec::new());
        }
        let q = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        let mut hits: Vec<SemanticHit> = rows
            .iter()
            .map(|(id, v)| SemanticHit { chunk_id: id.clone(), distance: cosine_distance(&q, v) })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::cosine_distance;

    #[test]
    fn distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
