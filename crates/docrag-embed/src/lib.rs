//! Embedders behind the `docrag_core::traits::Embedder` seam and a
//! `tokenizers`-backed token counter for chunk budgets.

use anyhow::{anyhow, Result};

use docrag_core::config::{AppConfig, EmbeddingProvider};
use docrag_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod hashing;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::HfTokenCounter;

/// Build the embedder selected by `embedding.provider`.
pub fn build_embedder(config: &AppConfig) -> Result<Box<dyn Embedder>> {
    let embedding = &config.embedding;
    match embedding.provider {
        EmbeddingProvider::Hash => {
            tracing::info!(dim = embedding.dim, "using hashing embedder");
            Ok(Box::new(HashingEmbedder::new(embedding.dim)))
        }
        EmbeddingProvider::Bert => {
            let dir = embedding
                .model_dir
                .as_ref()
                .map(|d| config.path(d))
                .ok_or_else(|| anyhow!("embedding.model_dir is required for the bert provider"))?;
            Ok(Box::new(BertEmbedder::load(&dir, embedding.max_len)?))
        }
    }
}
