//! Semantic indexes: LanceDB on disk and a brute-force in-memory variant.
//! Both embed with an injected `Embedder` and report cosine distance.

pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::LanceSemanticIndex;
pub use memory::InMemorySemanticIndex;
