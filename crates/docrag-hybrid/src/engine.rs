use std::collections::HashMap;

use docrag_core::config::{check_unit_interval, RetrievalConfig};
use docrag_core::error::{Error, Result};
use docrag_core::store::ChunkCache;
use docrag_core::traits::{LexicalIndex, Retriever, SemanticIndex};
use docrag_core::types::RetrievalResult;

/// Weighted fusion of semantic similarity and lexical rank.
///
/// Each side is asked for `2k` candidates. Semantic candidates contribute
/// `(1 - distance) * semantic_weight`; lexical candidates contribute
/// `(n - position) / n * keyword_weight`, so raw BM25 scores never leak into
/// the ranking. A side that fails or returns nothing contributes nothing.
pub struct HybridSearchEngine<S, L>
where
    S: SemanticIndex,
    L: LexicalIndex,
{
    semantic: S,
    lexical: L,
    cache: ChunkCache,
    semantic_weight: f32,
    keyword_weight: f32,
}

impl<S, L> HybridSearchEngine<S, L>
where
    S: SemanticIndex,
    L: LexicalIndex,
{
    pub fn new(semantic: S, lexical: L, cache: ChunkCache, semantic_weight: f32, keyword_weight: f32) -> Result<Self> {
        check_unit_interval("semantic_weight", f64::from(semantic_weight))?;
        check_unit_interval("keyword_weight", f64::from(keyword_weight))?;
        if (semantic_weight + keyword_weight - 1.0).abs() > 1e-4 {
            return Err(Error::InvalidConfig(format!(
                "retrieval weights must sum to 1 (semantic {semantic_weight} + keyword {keyword_weight})"
            )));
        }
        Ok(Self { semantic, lexical, cache, semantic_weight, keyword_weight })
    }

    pub fn from_config(semantic: S, lexical: L, cache: ChunkCache, config: &RetrievalConfig) -> Result<Self> {
        let (semantic_weight, keyword_weight) = config.weights()?;
        Self::new(semantic, lexical, cache, semantic_weight, keyword_weight)
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Up to `k` chunks, best fused score first.
    pub fn search(&self, query: &str, k: usize) -> Vec<RetrievalResult> {
        if k == 0 {
            return Vec::new();
        }
        let candidates = k * 2;
        let mut fused = FusedScores::default();

        match self.semantic.search(query, candidates) {
            Ok(hits) => {
                for hit in hits {
                    fused.add_once(Side::Semantic, &hit.chunk_id, (1.0 - hit.distance) * self.semantic_weight);
                }
            }
            Err(e) => tracing::warn!(error = %e, "semantic index unavailable, using lexical ranking only"),
        }

        match self.lexical.search(query, candidates) {
            Ok(ids) => {
                let n = ids.len() as f32;
                for (position, id) in ids.iter().enumerate() {
                    let rank_score = (n - position as f32) / n;
                    fused.add_once(Side::Lexical, id, rank_score * self.keyword_weight);
                }
            }
            Err(e) => tracing::warn!(error = %e, "lexical index unavailable, using semantic ranking only"),
        }

        // top k first, then cache misses are dropped without backfilling
        let mut results = Vec::with_capacity(k);
        for (chunk_id, score) in fused.ranked().into_iter().take(k) {
            match self.cache.get(&chunk_id) {
                Some(chunk) => results.push(RetrievalResult::from_chunk(chunk, score)),
                None => tracing::warn!(%chunk_id, "retrieved chunk missing from cache, dropped"),
            }
        }
        tracing::debug!(query, k, returned = results.len(), "hybrid search");
        results
    }
}

impl<S, L> Retriever for HybridSearchEngine<S, L>
where
    S: SemanticIndex,
    L: LexicalIndex,
{
    fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievalResult> {
        self.search(query, k)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Semantic,
    Lexical,
}

/// Running scores in first-seen order. Each side counts a chunk at most once.
#[derive(Default)]
struct FusedScores {
    order: Vec<(String, f32)>,
    slots: HashMap<String, (usize, bool, bool)>,
}

impl FusedScores {
    fn add_once(&mut self, side: Side, chunk_id: &str, value: f32) {
        if !value.is_finite() {
            tracing::warn!(%chunk_id, value, "non-finite retrieval score ignored");
            return;
        }
        let next = self.order.len();
        let slot = self.slots.entry(chunk_id.to_string()).or_insert((next, false, false));
        let seen = match side {
            Side::Semantic => &mut slot.1,
            Side::Lexical => &mut slot.2,
        };
        if *seen {
            return;
        }
        *seen = true;
        if slot.0 == next {
            self.order.push((chunk_id.to_string(), 0.0));
        }
        self.order[slot.0].1 += value;
    }

    /// Non-zero scores, descending; ties keep first-seen order.
    fn ranked(self) -> Vec<(String, f32)> {
        let mut ranked: Vec<(String, f32)> = self.order.into_iter().filter(|(_, s)| *s != 0.0).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::{FusedScores, Side};

    #[test]
    fn each_side_counts_once() {
        let mut fused = FusedScores::default();
        fused.add_once(Side::Semantic, "a", 0.5);
        fused.add_once(Side::Semantic, "a", 0.5);
        fused.add_once(Side::Lexical, "a", 0.25);
        fused.add_once(Side::Lexical, "b", 0.25);
        let ranked = fused.ranked();
        assert_eq!(ranked, vec![("a".to_string(), 0.75), ("b".to_string(), 0.25)]);
    }

    #[test]
    fn non_finite_contributions_are_ignored() {
        let mut fused = FusedScores::default();
        fused.add_once(Side::Semantic, "nan", f32::NAN);
        fused.add_once(Side::Semantic, "inf", f32::INFINITY);
        fused.add_once(Side::Lexical, "ok", 0.3);
        fused.add_once(Side::Lexical, "nan", 0.1);
        let ranked = fused.ranked();
        assert_eq!(ranked, vec![("ok".to_string(), 0.3), ("nan".to_string(), 0.1)]);
    }

    #[test]
    fn zero_scores_are_dropped_and_ties_keep_order() {
        let mut fused = FusedScores::default();
        fused.add_once(Side::Semantic, "z", 0.0);
        fused.add_once(Side::Semantic, "x", 0.3);
        fused.add_once(Side::Lexical, "y", 0.3);
        let ids: Vec<String> = fused.ranked().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["x".to_string(), "y".to_string()]);
    }
}
