use thiserror::Error;

use crate::generator::GenerationError;

/// Ingestion failures. The first three are caller errors and carry the exact
/// message returned to clients.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No files part")]
    NoFilesPart,

    #[error("No selected files")]
    NoSelectedFiles,

    #[error("Could not extract any text from the files.")]
    NoText,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index build failed: {0}")]
    Index(#[from] docqa_core::error::Error),

    #[error("Ingestion task failed: {0}")]
    Task(String),
}

impl IngestError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NoFilesPart | Self::NoSelectedFiles | Self::NoText)
    }
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("generation failed ({primary}) and extractive fallback failed: {fallback}")]
    BothFailed { primary: GenerationError, fallback: String },
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("No question provided")]
    NoQuestion,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] docqa_core::error::Error),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error("Query task failed: {0}")]
    Task(String),
}

impl AskError {
    pub fn is_client_error(&self) -> bool { matches!(self, Self::NoQuestion) }
}
