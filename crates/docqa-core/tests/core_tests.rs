use std::sync::Arc;

use figment::providers::{Format, Toml};
use figment::Figment;

use docqa_core::chunker::{split_sentences, Chunker, ChunkingConfig, WhitespaceCounter};
use docqa_core::config::{expand_path, Config, Settings};

fn chunker(max_tokens: usize, overlap_sentences: usize) -> Chunker {
    Chunker::new(Arc::new(WhitespaceCounter), ChunkingConfig { max_tokens, overlap_sentences })
}

#[test]
fn blank_input_has_no_chunks() {
    let c = chunker(16, 2);
    assert!(c.chunk("").is_empty());
    assert!(c.chunk("  \n\t ").is_empty());
}

#[test]
fn short_text_is_one_normalized_chunk() {
    let c = chunker(1024, 2);
    let chunks = c.chunk("  The sky is blue. Grass is green.\n");
    assert_eq!(chunks, vec!["The sky is blue. Grass is green.".to_string()]);

    let chunks = c.chunk("No trailing period here");
    assert_eq!(chunks, vec!["No trailing period here.".to_string()]);
}

#[test]
fn single_sentence_document_is_one_chunk() {
    let c = ChunkingConfig::default();
    let chunks = Chunker::new(Arc::new(WhitespaceCounter), c).chunk("Water boils at one hundred degrees.");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], "Water boils at one hundred degrees.");
}

#[test]
fn consecutive_chunks_share_overlap_prefix() {
    // Each sentence is four words; a budget of ten words fits two sentences.
    let text = (0..12)
        .map(|i| format!("sentence number {i} here"))
        .collect::<Vec<_>>()
        .join(". ");
    let overlap = 1;
    let chunks = chunker(10, overlap).chunk(&text);
    assert!(chunks.len() > 2, "expected several chunks, got {chunks:?}");

    for pair in chunks.windows(2) {
        let earlier = split_sentences(&pair[0]);
        let tail = &earlier[earlier.len() - overlap..];
        let prefix = tail.iter().map(|s| format!("{}. ", s.trim_end_matches('.'))).collect::<String>();
        assert!(
            pair[1].starts_with(prefix.trim_end()),
            "chunk {:?} does not start with overlap {:?}",
            pair[1],
            prefix
        );
    }
}

#[test]
fn chunks_respect_budget_except_oversized_sentences() {
    let text = "one two three. four five six. seven eight nine. ten eleven twelve";
    let chunks = chunker(7, 1).chunk(text);
    for chunk in &chunks {
        assert!(chunk.split_whitespace().count() <= 7, "over budget: {chunk:?}");
    }
    assert_eq!(chunks.first().map(String::as_str), Some("one two three. four five six."));
    assert!(chunks.last().is_some_and(|c| c.ends_with("ten eleven twelve.")));
}

#[test]
fn oversized_sentence_becomes_its_own_chunk() {
    let long = (0..50).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let text = format!("short start. {long}. short end");
    let chunks = chunker(10, 0).chunk(&text);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], "short start.");
    assert_eq!(chunks[1], format!("{long}."));
    assert_eq!(chunks[2], "short end.");
}

#[test]
fn settings_defaults_without_sources() {
    let config = Config::from_figment(Figment::new());
    let settings = config.settings().expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.chunking.max_tokens, 1024);
    assert_eq!(settings.chunking.overlap_sentences, 2);
    assert_eq!(settings.retrieval.k, 8);
    assert_eq!(settings.retrieval.max_results, 5);
    assert!((settings.retrieval.relevance_threshold - 1.5).abs() < f32::EPSILON);
    assert_eq!(settings.server.port, 5001);
    assert_eq!(settings.generation.model, "gemini-1.5-flash");
}

#[test]
fn settings_merge_toml_overrides() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [retrieval]
        k = 4
        relevance_threshold = 0.75

        [chunking]
        max_tokens = 256
        "#,
    ));
    let config = Config::from_figment(figment);
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.k, 4);
    assert_eq!(settings.retrieval.max_results, 5, "unset keys keep defaults");
    assert_eq!(settings.chunking.max_tokens, 256);
    let k: usize = config.get("retrieval.k").expect("get");
    assert_eq!(k, 4);
}

#[test]
fn invalid_settings_are_rejected() {
    let figment = Figment::new().merge(Toml::string("[chunking]\nmax_tokens = 0\n"));
    assert!(Config::from_figment(figment).settings().is_err());

    let figment = Figment::new().merge(Toml::string("[retrieval]\nrelevance_threshold = -1.0\n"));
    assert!(Config::from_figment(figment).settings().is_err());
}

#[test]
fn expand_path_handles_env_vars() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::set_var("DOCQA_TEST_MODEL_ROOT", tmp.path());
    let p = expand_path("${DOCQA_TEST_MODEL_ROOT}/bge-m3");
    assert_eq!(p, tmp.path().join("bge-m3"));
}
