//! Sentence-window chunking.
//!
//! Text is split on the literal `". "` delimiter (abbreviations and periods
//! without a following space are not sentence boundaries here). Sentences are
//! packed into chunks until the token budget would be exceeded; each new chunk
//! starts with the trailing sentences of the previous one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::TokenCounter;

const SENTENCE_DELIMITER: &str = ". ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_sentences: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 1024, overlap_sentences: 2 }
    }
}

/// Counts whitespace-separated words. Used when no model tokenizer is loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize { text.split_whitespace().count() }
}

#[derive(Clone)]
pub struct Chunker {
    counter: Arc<dyn TokenCounter>,
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(counter: Arc<dyn TokenCounter>, config: ChunkingConfig) -> Self {
        Self { counter, config }
    }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    pub fn count_tokens(&self, text: &str) -> usize { self.counter.count_tokens(text) }

    /// Split `text` into token-bounded chunks with sentence overlap.
    ///
    /// Blank input yields no chunks; anything else yields at least one. Input
    /// made only of delimiters becomes a single chunk of the trimmed text. A
    /// sentence that is over budget on its own becomes an oversized chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            let trimmed = text.trim();
            return if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] };
        }

        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut buffer = String::new();

        for sentence in sentences {
            let rendered = render_sentence(sentence);
            let candidate = format!("{buffer}{rendered}");
            if self.counter.count_tokens(&candidate) > self.config.max_tokens && !buffer.is_empty() {
                chunks.push(buffer.trim_end().to_string());
                let drop = window.len().saturating_sub(self.config.overlap_sentences);
                window.drain(..drop);
                buffer = window.iter().map(|s| render_sentence(s)).collect();
            }
            buffer.push_str(&rendered);
            window.push(sentence);
        }

        if !buffer.trim().is_empty() {
            chunks.push(buffer.trim_end().to_string());
        }
        chunks
    }
}

/// Naive sentence units: pieces between `". "` delimiters, trimmed, blanks dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// A piece that already carries its period (the last one, usually) only gets the space.
fn render_sentence(sentence: &str) -> String {
    if sentence.ends_with('.') {
        format!("{sentence} ")
    } else {
        format!("{sentence}{SENTENCE_DELIMITER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_blank_pieces() {
        assert_eq!(split_sentences("a.  . b. c"), vec!["a", "b", "c"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn delimiter_only_input_is_one_chunk() {
        let chunker = Chunker::new(Arc::new(WhitespaceCounter), ChunkingConfig::default());
        assert_eq!(chunker.chunk(". "), vec!["."]);
        assert_eq!(chunker.chunk(" . . "), vec![". ."]);
        assert!(chunker.chunk(" \n\t ").is_empty());
    }

    #[test]
    fn render_keeps_single_period() {
        assert_eq!(render_sentence("Done."), "Done. ");
        assert_eq!(render_sentence("Done"), "Done. ");
    }
}
