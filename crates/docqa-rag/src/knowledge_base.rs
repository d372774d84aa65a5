//! Session-scoped knowledge base.
//!
//! A `KnowledgeBase` is built in one go from a batch of documents and is never
//! mutated afterwards; a new ingestion produces a new instance.

use std::collections::BTreeMap;

use docqa_core::chunker::Chunker;
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, Document};
use docqa_vector::FlatIndex;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeState {
    Empty,
    Ready,
}

#[derive(Debug, Default)]
pub struct KnowledgeBase {
    documents: BTreeMap<String, String>,
    chunks: Vec<Chunk>,
    index: Option<FlatIndex>,
    truncated: usize,
}

impl KnowledgeBase {
    pub fn empty() -> Self { Self::default() }

    /// Chunk every document in order, embed all chunks in one batch and build
    /// the index. Zero chunks overall is `IngestError::NoText`.
    pub fn build(documents: Vec<Document>, chunker: &Chunker, embedder: &dyn Embedder) -> Result<Self, IngestError> {
        let mut kb = Self::empty();
        for doc in documents {
            let pieces = chunker.chunk(&doc.text);
            tracing::debug!(filename = doc.filename.as_str(), chunks = pieces.len(), "chunked document");
            kb.chunks.extend(pieces.into_iter().map(Chunk::new));
            kb.documents.insert(doc.filename, doc.text);
        }
        if kb.chunks.is_empty() {
            return Err(IngestError::NoText);
        }

        let window = embedder.max_len();
        kb.truncated = kb.chunks.iter().filter(|c| chunker.count_tokens(&c.text) > window).count();
        if kb.truncated > 0 {
            tracing::warn!(
                truncated = kb.truncated,
                chunks = kb.chunks.len(),
                window,
                "chunks exceed the embedder input window and are embedded from their leading tokens only"
            );
        }

        let texts: Vec<String> = kb.chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).map_err(|e| IngestError::Embedding(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(IngestError::Embedding(format!("expected {} vectors, got {}", texts.len(), vectors.len())));
        }
        let index = FlatIndex::build(&vectors)?;
        debug_assert_eq!(index.len(), kb.chunks.len());
        kb.index = Some(index);
        Ok(kb)
    }

    pub fn state(&self) -> KnowledgeState {
        if self.index.is_some() { KnowledgeState::Ready } else { KnowledgeState::Empty }
    }

    pub fn is_ready(&self) -> bool { self.state() == KnowledgeState::Ready }

    pub fn documents(&self) -> &BTreeMap<String, String> { &self.documents }

    pub fn document(&self, filename: &str) -> Option<&str> { self.documents.get(filename).map(String::as_str) }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn index(&self) -> Option<&FlatIndex> { self.index.as_ref() }

    /// Chunks whose token count exceeds the embedder's `max_len`.
    pub fn truncated_chunks(&self) -> usize { self.truncated }
}
