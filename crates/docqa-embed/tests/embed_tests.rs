use docqa_core::config::EmbeddingSettings;
use docqa_embed::{load_embedder, load_token_counter, FakeEmbedder};
use docqa_core::traits::Embedder;

fn fake_settings() -> EmbeddingSettings { EmbeddingSettings { model_dir: None, fake: true } }

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = load_embedder(&fake_settings()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string(), "unrelated words".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 3, "one vector per input");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), embedder.dim());

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
    assert!(embs[2].iter().zip(v1.iter()).any(|(a, b)| (a - b).abs() > 1e-6));
}

#[test]
fn fake_embedder_keeps_input_order() {
    let embedder = FakeEmbedder::new(64);
    let single_a = embedder.embed_batch(&["alpha".to_string()]).expect("a");
    let single_b = embedder.embed_batch(&["bravo".to_string()]).expect("b");
    let both = embedder.embed_batch(&["alpha".to_string(), "bravo".to_string()]).expect("both");
    assert_eq!(both[0], single_a[0]);
    assert_eq!(both[1], single_b[0]);
}

#[test]
fn fake_mode_counts_words() {
    let counter = load_token_counter(&fake_settings()).expect("counter");
    assert_eq!(counter.count_tokens("one two  three"), 3);
    assert_eq!(counter.count_tokens(""), 0);
}

#[test]
fn missing_model_dir_is_reported() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    std::env::remove_var("APP_MODEL_DIR");
    std::env::remove_var("MODEL_DIR");
    let settings = EmbeddingSettings { model_dir: Some(tmp.path().join("absent").display().to_string()), fake: false };
    let err = load_token_counter(&settings).err().expect("should fail");
    assert!(err.to_string().contains("model directory for embedding.model_dir"), "{err}");
}
