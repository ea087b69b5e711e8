//! docrag-text
//!
//! Tantivy-backed lexical index (BM25) over chunk text.

pub mod index;
pub mod tantivy_utils;

pub use index::TantivyLexicalIndex;
