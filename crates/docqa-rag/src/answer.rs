use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::AnswerError;
use crate::extractive::ExtractiveQa;
use crate::generator::{grounding_prompt, GenerationError, Generator};

const CONFIDENCE_FLOOR: f32 = 0.1;
const CONFIDENCE_CEILING: f32 = 0.95;
const FULL_CONTEXT_CHARS: f32 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Generated,
    Extractive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    pub confidence: f32,
    pub context: String,
    #[serde(skip)]
    pub source: AnswerSource,
}

/// Confidence of a generated answer: proportional to the amount of grounding
/// context, clamped to `[0.1, 0.95]`.
pub fn context_confidence(context: &str) -> f32 {
    (context.chars().count() as f32 / FULL_CONTEXT_CHARS).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

pub struct AnswerOrchestrator {
    generator: Arc<dyn Generator>,
    extractor: Arc<dyn ExtractiveQa>,
    timeout: Duration,
}

impl AnswerOrchestrator {
    pub fn new(generator: Arc<dyn Generator>, extractor: Arc<dyn ExtractiveQa>, timeout: Duration) -> Self {
        Self { generator, extractor, timeout }
    }

    /// Generate a grounded answer, falling back to extraction when the
    /// generator errors or exceeds the timeout. Fails only if both paths fail.
    pub async fn answer(&self, question: &str, context: &str) -> Result<Answer, AnswerError> {
        match self.generate(question, context).await {
            Ok(text) => Ok(Answer {
                text,
                confidence: context_confidence(context),
                context: context.to_string(),
                source: AnswerSource::Generated,
            }),
            Err(primary) => {
                tracing::warn!(error = %primary, "generation failed, falling back to extractive QA");
                let span = self
                    .extractor
                    .extract(question, context)
                    .await
                    .map_err(|e| AnswerError::BothFailed { primary, fallback: e.to_string() })?;
                Ok(Answer {
                    text: span.answer,
                    confidence: span.score.clamp(0.0, 1.0),
                    context: context.to_string(),
                    source: AnswerSource::Extractive,
                })
            }
        }
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError> {
        let prompt = grounding_prompt(question, context);
        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        }
    }
}
