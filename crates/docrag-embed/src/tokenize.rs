use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::Tokenizer;

use docrag_core::chunker::WhitespaceTokenCounter;
use docrag_core::traits::TokenCounter;

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

/// Token ids and attention mask for one text, cut to `max_len`.
pub fn encode_truncated(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<(Vec<u32>, Vec<u32>)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    ids.truncate(max_len);
    mask.truncate(max_len);
    Ok((ids, mask))
}

/// Counts chunk budgets with a `tokenizer.json` vocabulary.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Truncation and padding stored in the file are switched off so long
    /// sections report their full length.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut tokenizer = load_tokenizer(path)?;
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow!("Failed to disable truncation for {}: {}", path.display(), e))?;
        tokenizer.with_padding(None);
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(enc) => enc.get_ids().len(),
            Err(e) => {
                tracing::warn!(error = %e, "tokenizer failed, falling back to word estimate");
                WhitespaceTokenCounter.count(text)
            }
        }
    }
}
