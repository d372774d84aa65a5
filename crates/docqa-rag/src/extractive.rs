//! Extractive question answering used when generation is unavailable.

use std::collections::HashSet;

use anyhow::bail;
use async_trait::async_trait;

use docqa_core::chunker::split_sentences;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSpan {
    pub answer: String,
    /// Model confidence in `[0, 1]`.
    pub score: f32,
}

#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    async fn extract(&self, question: &str, context: &str) -> anyhow::Result<ExtractedSpan>;
}

/// Picks the context sentence covering the largest share of the question's
/// terms. Deterministic; earliest sentence wins ties.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalExtractor;

const MIN_TERM_CHARS: usize = 3;

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

impl LexicalExtractor {
    pub fn best_span(question: &str, context: &str) -> anyhow::Result<ExtractedSpan> {
        let sentences = split_sentences(context);
        if sentences.is_empty() {
            bail!("cannot extract an answer from an empty context");
        }
        let wanted = terms(question);

        let mut best = (sentences[0], 0usize);
        if !wanted.is_empty() {
            for &sentence in &sentences {
                let have = terms(sentence);
                let overlap = wanted.iter().filter(|t| have.contains(*t)).count();
                if overlap > best.1 {
                    best = (sentence, overlap);
                }
            }
        }
        let score = if wanted.is_empty() { 0.0 } else { best.1 as f32 / wanted.len() as f32 };
        Ok(ExtractedSpan { answer: best.0.to_string(), score })
    }
}

#[async_trait]
impl ExtractiveQa for LexicalExtractor {
    async fn extract(&self, question: &str, context: &str) -> anyhow::Result<ExtractedSpan> {
        Self::best_span(question, context)
    }
}
