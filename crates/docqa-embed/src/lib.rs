//! docqa-embed
//!
//! Sentence embeddings with a local XLM-RoBERTa encoder (candle), a hashing
//! embedder for tests and development, and a tokenizer-backed token counter
//! for the chunker.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docqa_core::chunker::WhitespaceCounter;
use docqa_core::config::EmbeddingSettings;
use docqa_core::error::Error;
use docqa_core::traits::{Embedder, TokenCounter};

#[cfg(feature = "ocr")]
pub mod ocr;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;
pub use tokenize::TokenizerCounter;

const MAX_LEN: usize = 256;
const FAKE_DIM: usize = 1024;

pub(crate) fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => { tracing::info!(device = "metal", "embedding device selected"); return dev; }
        Err(e) => tracing::warn!(error = %e, "metal unavailable, using CPU"),
    }
    tracing::info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

pub struct EmbeddingModel { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize }

impl EmbeddingModel {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = tokenize::load_tokenizer(&model_dir.join("tokenizer.json"))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?["hidden_size"]
            .as_u64()
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device)?;
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: emb.len() }.into());
        }
        if start.elapsed().as_millis() > 100 { tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { MAX_LEN }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { texts.iter().map(|t| self.embed_text(t)).collect() }
}

/// Deterministic bag-of-words hashing embedder. Identical text always maps to
/// the identical unit vector; texts sharing no words are roughly orthogonal.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim } } }

impl FakeEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() { let mut hasher = XxHash64::with_seed(0); token.to_lowercase().hash(&mut hasher); let h = hasher.finish(); let idx = (h as usize) % self.dim; let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32); v[idx] += val + (i as f32 % 3.0) * 0.01; }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { MAX_LEN }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_one(t)).collect()) }
}

fn use_fake(settings: &EmbeddingSettings) -> bool {
    settings.fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake(settings) { tracing::info!("using FakeEmbedder"); return Ok(Arc::new(FakeEmbedder::new(FAKE_DIM))); }
    Ok(Arc::new(EmbeddingModel::load(&resolve_model_dir(settings)?)?))
}

/// The chunker budgets in the embedding model's tokens; the fake embedder
/// pairs with a word counter.
pub fn load_token_counter(settings: &EmbeddingSettings) -> Result<Arc<dyn TokenCounter>> {
    if use_fake(settings) { return Ok(Arc::new(WhitespaceCounter)); }
    let path = resolve_model_dir(settings)?.join("tokenizer.json");
    Ok(Arc::new(TokenizerCounter::from_file(&path)?))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    find_model_dir("embedding.model_dir", settings.model_dir(), &["APP_MODEL_DIR", "MODEL_DIR"], "models/bge-m3")
}

/// First existing directory among the configured path, the env vars, and `local`.
pub(crate) fn find_model_dir(key: &str, configured: Option<PathBuf>, env_vars: &[&str], local: &str) -> Result<PathBuf> {
    if let Some(p) = configured { if p.exists() { return Ok(p); } tracing::warn!(dir = %p.display(), "configured {key} does not exist"); }
    for var in env_vars {
        if let Ok(dir) = std::env::var(var) { let p = PathBuf::from(&dir); if p.exists() { tracing::info!(dir = %p.display(), "using {var}"); return Ok(p); } }
    }
    let local = Path::new(local); if local.exists() { return Ok(local.to_path_buf()); }
    Err(Error::NotFound(format!("model directory for {key} (set {key} or {})", env_vars.join("/"))).into())
}
