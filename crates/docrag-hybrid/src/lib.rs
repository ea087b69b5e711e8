//! Hybrid retrieval: a semantic and a lexical index fused into one ranking,
//! plus an extractive answer pipeline on top of any retriever.

pub mod answer;
pub mod engine;

pub use answer::ExtractiveAnswerer;
pub use engine::HybridSearchEngine;
