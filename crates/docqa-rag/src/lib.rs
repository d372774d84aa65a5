//! docqa-rag
//!
//! Retrieval-augmented question answering over a session-scoped knowledge
//! base: ingestion into an immutable snapshot, thresholded deduplicated
//! retrieval, and answer generation with an extractive fallback.

pub mod answer;
pub mod error;
pub mod extractive;
pub mod generator;
pub mod knowledge_base;
pub mod retriever;
pub mod service;

pub use answer::{Answer, AnswerOrchestrator, AnswerSource};
pub use error::{AnswerError, AskError, IngestError};
pub use extractive::{ExtractedSpan, ExtractiveQa, LexicalExtractor};
pub use generator::{GeminiGenerator, GenerationError, Generator};
pub use knowledge_base::{KnowledgeBase, KnowledgeState};
pub use service::{AskResponse, HealthStatus, IngestReport, QaService, NO_DOCUMENTS_ANSWER};
