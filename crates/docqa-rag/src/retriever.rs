//! Context selection for a query vector.
//!
//! Candidates closer than the relevance threshold are accepted in rank order,
//! skipping chunks whose first 100 characters were already accepted. When no
//! candidate is close enough the top-ranked candidates are used regardless of
//! distance, so a non-empty index always yields context.

use std::collections::HashSet;

use docqa_core::config::RetrievalConfig;
use docqa_core::error::{Error, Result};
use docqa_core::types::{Chunk, SearchHit};
use docqa_vector::FlatIndex;

const DEDUP_KEY_CHARS: usize = 100;

/// The first 100 characters of `text` (fewer if shorter).
pub fn dedup_key(text: &str) -> &str {
    match text.char_indices().nth(DEDUP_KEY_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn retrieve(
    question_vector: &[f32],
    chunks: &[Chunk],
    index: &FlatIndex,
    params: &RetrievalConfig,
) -> Result<Vec<String>> {
    if index.len() != chunks.len() {
        return Err(Error::Operation(format!(
            "index has {} vectors for {} chunks",
            index.len(),
            chunks.len()
        )));
    }
    let hits = index.search(question_vector, params.k)?;

    let relevant = hits.iter().filter(|h| h.distance < params.relevance_threshold);
    let accepted = take_unique(relevant, chunks, params.max_results);
    if !accepted.is_empty() {
        return Ok(accepted);
    }

    tracing::debug!(
        candidates = hits.len(),
        threshold = params.relevance_threshold,
        "no candidate under the relevance threshold, using top-ranked chunks"
    );
    Ok(take_unique(hits.iter(), chunks, params.fallback_results))
}

fn take_unique<'a>(hits: impl Iterator<Item = &'a SearchHit>, chunks: &[Chunk], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();
    for hit in hits {
        if accepted.len() >= limit {
            break;
        }
        let Some(chunk) = chunks.get(hit.position) else { continue };
        if seen.insert(dedup_key(&chunk.text)) {
            accepted.push(chunk.text.clone());
        }
    }
    accepted
}
