use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use docqa_rag::answer::context_confidence;
use docqa_rag::{
    AnswerError, AnswerOrchestrator, AnswerSource, ExtractedSpan, ExtractiveQa, GenerationError, Generator,
    LexicalExtractor,
};

enum Script {
    Reply(&'static str),
    Fail,
    Hang(Duration),
}

struct ScriptedGenerator(Script);

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        match &self.0 {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Fail => Err(GenerationError::Http { status: 429, body: "quota".into() }),
            Script::Hang(d) => {
                tokio::time::sleep(*d).await;
                Ok("too late".into())
            }
        }
    }
}

struct BrokenExtractor;

#[async_trait]
impl ExtractiveQa for BrokenExtractor {
    async fn extract(&self, _question: &str, _context: &str) -> anyhow::Result<ExtractedSpan> {
        anyhow::bail!("model unavailable")
    }
}

fn orchestrator(script: Script) -> AnswerOrchestrator {
    AnswerOrchestrator::new(Arc::new(ScriptedGenerator(script)), Arc::new(LexicalExtractor), Duration::from_millis(200))
}

#[test]
fn confidence_is_clamped_for_any_context_length() {
    assert_eq!(context_confidence(""), 0.1);
    assert_eq!(context_confidence(&"a".repeat(100)), 0.1);
    assert!((context_confidence(&"a".repeat(1000)) - 0.5).abs() < 1e-6);
    assert_eq!(context_confidence(&"a".repeat(2000)), 0.95);
    assert_eq!(context_confidence(&"a".repeat(50_000)), 0.95);
    for len in [0usize, 1, 199, 200, 201, 1899, 1900, 1901, 4000] {
        let c = context_confidence(&"z".repeat(len));
        assert!((0.1..=0.95).contains(&c), "len {len} gave {c}");
    }
}

#[tokio::test]
async fn generated_answer_uses_context_heuristic() {
    let context = "Lima is the capital of Peru.";
    let answer = orchestrator(Script::Reply("Lima.")).answer("Capital of Peru?", context).await.expect("answer");
    assert_eq!(answer.text, "Lima.");
    assert_eq!(answer.source, AnswerSource::Generated);
    assert_eq!(answer.context, context);
    assert_eq!(answer.confidence, 0.1);
}

#[tokio::test]
async fn generator_error_falls_back_to_extraction() {
    let context = "Lima is the capital of Peru. Cusco was the Inca capital";
    let answer = orchestrator(Script::Fail).answer("What was the Inca capital?", context).await.expect("answer");
    assert_eq!(answer.source, AnswerSource::Extractive);
    assert_eq!(answer.text, "Cusco was the Inca capital");
    // was, the, inca, capital of the five question terms
    assert!((answer.confidence - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn slow_generator_times_out_into_fallback() {
    let answer = orchestrator(Script::Hang(Duration::from_secs(5)))
        .answer("capital?", "Lima is the capital of Peru.")
        .await
        .expect("answer");
    assert_eq!(answer.source, AnswerSource::Extractive);
    assert_eq!(answer.text, "Lima is the capital of Peru.");
}

#[tokio::test]
async fn both_paths_failing_is_an_error() {
    let orchestrator = AnswerOrchestrator::new(
        Arc::new(ScriptedGenerator(Script::Fail)),
        Arc::new(BrokenExtractor),
        Duration::from_millis(200),
    );
    let err = orchestrator.answer("q", "some context").await.unwrap_err();
    let AnswerError::BothFailed { primary, fallback } = err;
    assert!(matches!(primary, GenerationError::Http { status: 429, .. }));
    assert!(fallback.contains("model unavailable"));
}

#[test]
fn answer_serializes_without_source() {
    let answer = docqa_rag::Answer {
        text: "x".into(),
        confidence: 0.5,
        context: "ctx".into(),
        source: AnswerSource::Extractive,
    };
    let json = serde_json::to_value(&answer).expect("json");
    assert_eq!(json, serde_json::json!({"answer": "x", "confidence": 0.5, "context": "ctx"}));
}
