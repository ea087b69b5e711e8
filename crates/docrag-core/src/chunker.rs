//! Token-budgeted hierarchical chunking of parsed documents.
//!
//! Sections are split into sentences, sentences are packed greedily into
//! chunks under `max_tokens`, and with a non-zero overlap the last sentence of
//! a closed multi-sentence chunk opens the next one. Ids run across the whole
//! document (`chunk_0`, `chunk_1`, ...) in section order.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::traits::{SentenceSplitter, TokenCounter};
use crate::types::{Chunk, ChunkMetadata, DocumentMetadata, DocumentStructure, Section};

/// Rough sub-word estimate: ~0.75 words per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f32 / 0.75) as usize
    }
}

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Ends a sentence at `.`, `!` or `?` followed by whitespace and an
/// upper-case letter.
///
/// Heuristic: "Dr. Smith" is split, "e.g. the" is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSentenceSplitter;

impl SentenceSplitter for RegexSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in SENTENCE_END.find_iter(text) {
            let starts_upper = text[m.end()..].chars().next().is_some_and(char::is_uppercase);
            if !starts_upper {
                continue;
            }
            // the terminator is a single ASCII byte
            sentences.push(&text[start..=m.start()]);
            start = m.end();
        }
        sentences.push(&text[start..]);
        sentences
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Default)]
struct Pending {
    sentences: Vec<String>,
    tokens: usize,
}

impl Pending {
    fn push(&mut self, sentence: String, tokens: usize) {
        self.sentences.push(sentence);
        self.tokens += tokens;
    }

    fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

pub struct HierarchicalChunker {
    max_tokens: usize,
    overlap: usize,
    counter: Box<dyn TokenCounter>,
    splitter: Box<dyn SentenceSplitter>,
}

impl HierarchicalChunker {
    /// Fails when `max_tokens` is zero.
    pub fn new(
        max_tokens: usize,
        overlap: usize,
        counter: Box<dyn TokenCounter>,
        splitter: Box<dyn SentenceSplitter>,
    ) -> Result<Self> {
        if max_tokens == 0 {
            return Err(Error::InvalidConfig("max_tokens must be at least 1".into()));
        }
        Ok(Self { max_tokens, overlap, counter, splitter })
    }

    /// Word-heuristic counter and the regex splitter.
    pub fn with_defaults(max_tokens: usize, overlap: usize) -> Result<Self> {
        Self::new(max_tokens, overlap, Box::new(WhitespaceTokenCounter), Box::new(RegexSentenceSplitter))
    }

    pub fn from_config(config: &ChunkingConfig, counter: Box<dyn TokenCounter>) -> Result<Self> {
        Self::new(config.max_tokens, config.overlap, counter, Box::new(RegexSentenceSplitter))
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Chunk one document with ids starting at `chunk_0`.
    pub fn chunk_document(&self, structure: &DocumentStructure, metadata: &DocumentMetadata) -> Vec<Chunk> {
        self.chunk_document_from(structure, metadata, 0)
    }

    /// Chunk one document with ids starting at `chunk_{first_id}`, so an
    /// ingestion run can keep ids unique across documents.
    pub fn chunk_document_from(
        &self,
        structure: &DocumentStructure,
        metadata: &DocumentMetadata,
        first_id: usize,
    ) -> Vec<Chunk> {
        let title = metadata.title_or_unknown();
        let mut next_id = first_id;
        let mut chunks = Vec::new();
        for section in &structure.sections {
            let content = section.content.join("\n");
            if content.trim().is_empty() {
                continue;
            }
            let section_meta = Self::section_metadata(title, section);
            for (text, token_count) in self.pack_sentences(&content) {
                chunks.push(Chunk {
                    chunk_id: format!("chunk_{next_id}"),
                    text,
                    metadata: section_meta.clone(),
                    token_count,
                });
                next_id += 1;
            }
        }
        tracing::debug!(document = title, chunks = chunks.len(), "chunked document");
        chunks
    }

    fn section_metadata(title: &str, section: &Section) -> ChunkMetadata {
        ChunkMetadata {
            document_title: title.to_string(),
            section: section.title.clone(),
            level: section.level(),
            page_start: section.page_start(),
        }
    }

    /// Greedy packing of one section's sentences into `(text, token_count)`.
    fn pack_sentences(&self, text: &str) -> Vec<(String, usize)> {
        let mut packed = Vec::new();
        let mut current = Pending::default();
        for sentence in self.splitter.split(text) {
            let tokens = self.counter.count(&sentence);
            if current.tokens + tokens > self.max_tokens && !current.is_empty() {
                let closed = std::mem::take(&mut current);
                packed.push((closed.sentences.join(" "), closed.tokens));
                if self.overlap > 0 && closed.sentences.len() > 1 {
                    if let Some(last) = closed.sentences.last() {
                        let carried = self.counter.count(last);
                        current.push(last.clone(), carried);
                    }
                }
            }
            current.push(sentence, tokens);
        }
        if !current.is_empty() {
            packed.push((current.sentences.join(" "), current.tokens));
        }
        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitter_requires_capital_after_terminator() {
        let s = RegexSentenceSplitter.split("Returns rose, e.g. in Q3. Volatility fell! Did it? yes.");
        assert_eq!(s, vec!["Returns rose, e.g. in Q3.", "Volatility fell!", "Did it? yes."]);
    }

    #[test]
    fn splitter_treats_newlines_as_whitespace() {
        let s = RegexSentenceSplitter.split("First line.\nSecond line.");
        assert_eq!(s, vec!["First line.", "Second line."]);
    }

    #[test]
    fn splitter_drops_blank_input() {
        assert!(RegexSentenceSplitter.split("   \n ").is_empty());
    }

    #[test]
    fn whitespace_counter_scales_words() {
        assert_eq!(WhitespaceTokenCounter.count("one two three"), 4);
        assert_eq!(WhitespaceTokenCounter.count(""), 0);
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(matches!(HierarchicalChunker::with_defaults(0, 0), Err(Error::InvalidConfig(_))));
    }
}
