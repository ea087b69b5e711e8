//! Retrieval and answer-quality evaluation against a golden dataset.

pub mod dataset;
pub mod metrics;
pub mod runner;

pub use dataset::load_dataset;
pub use runner::{EvaluationReport, EvaluationRunner, QaMetrics, QuickMetrics, ScoreWeights};
