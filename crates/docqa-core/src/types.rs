//! Domain types shared by the chunker, the vector index and the answer pipeline.

use serde::{Deserialize, Serialize};

/// A source document as it was extracted at ingestion time.
///
/// Documents are immutable once ingested and live only as long as the
/// knowledge base that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub text: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self { filename: filename.into(), text: text.into() }
    }
}

/// The unit of retrieval. Carries no reference back to its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self { Self { text: text.into() } }
}

/// A nearest-neighbour candidate.
///
/// `position` indexes into the chunk sequence the index was built from.
/// `distance` is squared Euclidean; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub distance: f32,
    pub position: usize,
}

/// An uploaded file before text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { filename: filename.into(), bytes: bytes.into() }
    }
}
