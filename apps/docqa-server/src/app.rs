use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::extract::ExtractorRegistry;
use docqa_rag::{AnswerOrchestrator, GeminiGenerator, LexicalExtractor, QaService};

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// Assemble the QA service from settings: embedder, chunker, extractors and
/// the generate-then-extract answer path.
pub fn build_service(settings: &Settings) -> anyhow::Result<QaService> {
    let embedder = docqa_embed::load_embedder(&settings.embedding)?;
    let chunker = Chunker::new(docqa_embed::load_token_counter(&settings.embedding)?, settings.chunking.clone());

    let generator = GeminiGenerator::new(&settings.generation)?;
    if !generator.has_api_key() {
        tracing::warn!(
            env = settings.generation.api_key_env.as_str(),
            "no generation API key, answers will come from extractive QA"
        );
    }
    let orchestrator = AnswerOrchestrator::new(
        Arc::new(generator),
        Arc::new(LexicalExtractor),
        Duration::from_secs(settings.generation.timeout_secs),
    );

    tracing::info!(dim = embedder.dim(), max_tokens = settings.chunking.max_tokens, "service ready");
    Ok(QaService::new(embedder, chunker, build_extractors(settings), orchestrator, settings.retrieval.clone()))
}

/// Text and PDF always; images when an OCR model can be loaded.
pub fn build_extractors(settings: &Settings) -> ExtractorRegistry {
    #[allow(unused_mut)]
    let mut registry = ExtractorRegistry::with_defaults();
    #[cfg(feature = "ocr")]
    {
        match docqa_embed::ocr::load_ocr_extractor(&settings.ocr) {
            Ok(Some(ocr)) => {
                for ext in docqa_embed::ocr::IMAGE_EXTENSIONS {
                    registry.register(ext, ocr.clone());
                }
            }
            Ok(None) => tracing::info!("OCR disabled, images will be skipped"),
            Err(e) => tracing::warn!(error = %e, "OCR model unavailable, images will be skipped"),
        }
    }
    #[cfg(not(feature = "ocr"))]
    let _ = &settings.ocr;
    registry
}

/// Whether `filename` has an extension some extractor may handle.
pub fn is_candidate_file(filename: &str) -> bool {
    #[cfg(feature = "ocr")]
    {
        let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        if ext.as_deref().is_some_and(|e| docqa_embed::ocr::IMAGE_EXTENSIONS.contains(&e)) {
            return true;
        }
    }
    ExtractorRegistry::with_defaults().supports(filename)
}
