use anyhow::Result;

use docrag_core::traits::{AnswerPipeline, Retriever};

/// Answers with the text of the best chunks, no generation involved.
pub struct ExtractiveAnswerer<R: Retriever> {
    retriever: R,
    top_n: usize,
}

impl<R: Retriever> ExtractiveAnswerer<R> {
    pub fn new(retriever: R, top_n: usize) -> Self {
        Self { retriever, top_n: top_n.max(1) }
    }
}

impl<R: Retriever> AnswerPipeline for ExtractiveAnswerer<R> {
    fn answer(&self, question: &str) -> Result<String> {
        let results = self.retriever.retrieve(question, self.top_n);
        if results.is_empty() {
            tracing::debug!(question, "no context retrieved");
        }
        Ok(results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n\n"))
    }
}
