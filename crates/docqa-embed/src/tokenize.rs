use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::Tokenizer;

use docqa_core::traits::TokenCounter;

/// XLM-RoBERTa pad token id.
const PAD_ID: u32 = 1;

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))
}

pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    if ids.len() < max_len { let pad = max_len - ids.len(); ids.extend(std::iter::repeat(PAD_ID).take(pad)); mask.extend(std::iter::repeat(0).take(pad)); }
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

/// Token counts from the embedding model's own tokenizer, without special tokens.
pub struct TokenizerCounter { tokenizer: Tokenizer }

impl TokenizerCounter {
    pub fn new(tokenizer: Tokenizer) -> Self { Self { tokenizer } }

    pub fn from_file(path: &Path) -> Result<Self> { Ok(Self::new(load_tokenizer(path)?)) }
}

impl TokenCounter for TokenizerCounter {
    fn count_tokens(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(enc) => enc.get_ids().len(),
            Err(e) => {
                tracing::warn!(error = %e, "tokenizer failed, falling back to word count");
                text.split_whitespace().count()
            }
        }
    }
}
