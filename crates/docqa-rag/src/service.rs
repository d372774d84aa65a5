//! The three external operations: ingest, ask, health.
//!
//! Queries read the currently published knowledge base snapshot. Ingestions
//! are serialized, build a fresh snapshot off the async runtime and publish it
//! with a pointer swap, so a query sees either the old or the new base.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::Mutex;

use docqa_core::chunker::Chunker;
use docqa_core::config::RetrievalConfig;
use docqa_core::extract::ExtractorRegistry;
use docqa_core::traits::Embedder;
use docqa_core::types::{Document, UploadedFile};

use crate::answer::{Answer, AnswerOrchestrator};
use crate::error::{AskError, IngestError};
use crate::knowledge_base::KnowledgeBase;
use crate::retriever::retrieve;

pub const NO_DOCUMENTS_ANSWER: &str = "Please upload some documents first.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files_received: usize,
    pub documents: usize,
    pub chunks: usize,
    /// Chunks longer than the embedder's input window; only their head is embedded.
    pub truncated: usize,
    pub skipped: Vec<String>,
}

impl IngestReport {
    pub fn message(&self) -> String { format!("{} files processed successfully.", self.files_received) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AskResponse {
    Answered(Answer),
    NoDocuments { answer: String },
}

impl AskResponse {
    pub fn answer_text(&self) -> &str {
        match self {
            Self::Answered(a) => &a.text,
            Self::NoDocuments { answer } => answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub struct QaService {
    snapshot: RwLock<Arc<KnowledgeBase>>,
    ingest_guard: Mutex<()>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    extractors: Arc<ExtractorRegistry>,
    orchestrator: AnswerOrchestrator,
    retrieval: RetrievalConfig,
}

impl QaService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chunker: Chunker,
        extractors: ExtractorRegistry,
        orchestrator: AnswerOrchestrator,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(KnowledgeBase::empty())),
            ingest_guard: Mutex::new(()),
            embedder,
            chunker,
            extractors: Arc::new(extractors),
            orchestrator,
            retrieval,
        }
    }

    /// The currently published knowledge base.
    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, kb: KnowledgeBase) {
        let kb = Arc::new(kb);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = kb,
            Err(poisoned) => *poisoned.into_inner() = kb,
        }
    }

    /// Replace the knowledge base with one built from `files`.
    ///
    /// Files without a registered extractor, or whose extraction fails, are
    /// skipped. If nothing usable remains, or embedding fails, an empty base
    /// is published and the error returned.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> Result<IngestReport, IngestError> {
        let Some(first) = files.first() else { return Err(IngestError::NoFilesPart) };
        if first.filename.is_empty() {
            return Err(IngestError::NoSelectedFiles);
        }

        let _guard = self.ingest_guard.lock().await;
        let files_received = files.len();
        let extractors = Arc::clone(&self.extractors);
        let chunker = self.chunker.clone();
        let embedder = Arc::clone(&self.embedder);
        let built = tokio::task::spawn_blocking(move || {
            let (documents, skipped) = extract_all(&extractors, files);
            KnowledgeBase::build(documents, &chunker, embedder.as_ref()).map(|kb| (kb, skipped))
        })
        .await
        .map_err(|e| IngestError::Task(e.to_string()))
        .and_then(|r| r);

        match built {
            Ok((kb, skipped)) => {
                let report = IngestReport {
                    files_received,
                    documents: kb.documents().len(),
                    chunks: kb.chunks().len(),
                    truncated: kb.truncated_chunks(),
                    skipped,
                };
                self.publish(kb);
                tracing::info!(
                    files = report.files_received,
                    documents = report.documents,
                    chunks = report.chunks,
                    truncated = report.truncated,
                    skipped = report.skipped.len(),
                    "knowledge base ready"
                );
                Ok(report)
            }
            Err(e) => {
                self.publish(KnowledgeBase::empty());
                tracing::warn!(error = %e, "ingestion failed, knowledge base is empty");
                Err(e)
            }
        }
    }

    /// Answer `question` from the published knowledge base.
    pub async fn ask(&self, question: Option<&str>) -> Result<AskResponse, AskError> {
        let question = question.map(str::trim).filter(|q| !q.is_empty()).ok_or(AskError::NoQuestion)?;

        let kb = self.snapshot();
        let Some(index) = kb.index() else {
            return Ok(AskResponse::NoDocuments { answer: NO_DOCUMENTS_ANSWER.to_string() });
        };

        let embedder = Arc::clone(&self.embedder);
        let owned = vec![question.to_string()];
        let question_vector = tokio::task::spawn_blocking(move || embedder.embed_batch(&owned))
            .await
            .map_err(|e| AskError::Task(e.to_string()))?
            .map_err(|e| AskError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| AskError::Embedding("embedder returned no vector".into()))?;

        let context = retrieve(&question_vector, kb.chunks(), index, &self.retrieval)?.join(" ");
        let answer = self.orchestrator.answer(question, &context).await?;
        tracing::info!(source = ?answer.source, confidence = answer.confidence, "answered question");
        Ok(AskResponse::Answered(answer))
    }

    pub fn health(&self) -> HealthStatus { HealthStatus { status: "ok" } }
}

/// Extract every file, skipping those with no extractor, no text, or a failure.
fn extract_all(extractors: &ExtractorRegistry, files: Vec<UploadedFile>) -> (Vec<Document>, Vec<String>) {
    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    for file in files {
        match extractors.extract(&file.filename, &file.bytes) {
            Ok(Some(text)) if !text.trim().is_empty() => documents.push(Document::new(file.filename, text)),
            Ok(_) => {
                tracing::debug!(filename = file.filename.as_str(), "no text extracted");
                skipped.push(file.filename);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping file");
                skipped.push(file.filename);
            }
        }
    }
    (documents, skipped)
}
