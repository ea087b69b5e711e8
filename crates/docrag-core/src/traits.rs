use crate::types::{Chunk, RetrievalResult, SemanticHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Counts tokens for chunk budgeting.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Splits a blob of text into sentences.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Nearest-neighbour index over chunk embeddings.
pub trait SemanticIndex: Send + Sync {
    fn add(&self, chunks: &[Chunk]) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
    /// Up to `n` candidates, closest first.
    fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<SemanticHit>>;
}

/// Term-frequency ranking over chunk text.
pub trait LexicalIndex: Send + Sync {
    /// Replaces the whole index with `chunks`.
    fn build(&self, chunks: &[Chunk]) -> anyhow::Result<()>;
    /// Up to `n` chunk ids, best match first.
    fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<String>>;
}

/// Anything that answers a query with ranked chunks. Never fails: an
/// unavailable backend yields fewer (or no) results.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievalResult>;
}

/// Full question answering: retrieval plus synthesis.
pub trait AnswerPipeline: Send + Sync {
    fn answer(&self, question: &str) -> anyhow::Result<String>;
}

impl<T: Retriever + ?Sized> Retriever for &T {
    fn retrieve(&self, query: &str, k: usize) -> Vec<RetrievalResult> {
        (**self).retrieve(query, k)
    }
}

impl<T: AnswerPipeline + ?Sized> AnswerPipeline for &T {
    fn answer(&self, question: &str) -> anyhow::Result<String> {
        (**self).answer(question)
    }
}
