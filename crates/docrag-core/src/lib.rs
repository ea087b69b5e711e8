//! docrag-core
//!
//! Shared domain types, collaborator traits, the hierarchical chunker, the
//! ingestion run that persists processed documents, and configuration.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
