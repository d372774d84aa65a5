//! Printed-text OCR for uploaded images: a TrOCR vision encoder-decoder on candle.
//!
//! The model directory holds `config.json` (with `encoder` and `decoder`
//! sections), `model.safetensors` and `tokenizer.json`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::{trocr, vit};
use image::imageops::FilterType;
use tokenizers::Tokenizer;

use docqa_core::config::OcrSettings;
use docqa_core::extract::ExtractError;
use docqa_core::traits::TextExtractor;

use crate::{find_model_dir, select_device, tokenize};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const MAX_DECODE_TOKENS: usize = 256;

pub struct OcrExtractor {
    weights: HashMap<String, Tensor>,
    encoder: vit::Config,
    decoder: trocr::TrOCRConfig,
    tokenizer: Tokenizer,
    device: Device,
}

impl OcrExtractor {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading OCR model");
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let encoder: vit::Config = serde_json::from_value(raw["encoder"].clone())?;
        let decoder: trocr::TrOCRConfig = serde_json::from_value(raw["decoder"].clone())?;
        let weights = candle_core::safetensors::load(model_dir.join("model.safetensors"), &device)?;
        let tokenizer = tokenize::load_tokenizer(&model_dir.join("tokenizer.json"))?;
        // Surface missing or misnamed tensors at startup rather than on the first upload.
        trocr::TrOCRModel::new(&encoder, &decoder, VarBuilder::from_tensors(weights.clone(), DType::F32, &device))?;
        tracing::info!(image_size = encoder.image_size, "OCR model loaded");
        Ok(Self { weights, encoder, decoder, tokenizer, device })
    }

    /// Greedy decode of the text in one image.
    pub fn recognize(&self, bytes: &[u8]) -> Result<String> {
        let pixels = preprocess(bytes, self.encoder.image_size, &self.device)?;
        // Fresh model per image: the decoder keeps a KV cache between calls.
        let vb = VarBuilder::from_tensors(self.weights.clone(), DType::F32, &self.device);
        let mut model = trocr::TrOCRModel::new(&self.encoder, &self.decoder, vb)?;
        let encoded = model.encoder().forward(&pixels)?;

        let mut tokens = vec![self.decoder.decoder_start_token_id];
        for step in 0..MAX_DECODE_TOKENS {
            let start = if step == 0 { 0 } else { tokens.len() - 1 };
            let input = Tensor::new(&tokens[start..], &self.device)?.unsqueeze(0)?;
            let logits = model.decode(&input, &encoded, start)?.squeeze(0)?;
            let next = logits.get(logits.dim(0)? - 1)?.argmax(D::Minus1)?.to_scalar::<u32>()?;
            if next == self.decoder.eos_token_id {
                break;
            }
            tokens.push(next);
        }
        let text = self.tokenizer.decode(&tokens[1..], true).map_err(|e| anyhow!("OCR decode failed: {e}"))?;
        Ok(text.trim().to_string())
    }
}

impl TextExtractor for OcrExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        self.recognize(bytes)
            .map_err(|e| ExtractError::Failed { filename: filename.to_string(), message: e.to_string() })
    }
}

/// Decode, resize to `size`x`size` RGB and normalise to `[-1, 1]`: `[1, 3, size, size]`.
pub fn preprocess(bytes: &[u8], size: usize, device: &Device) -> Result<Tensor> {
    let side = u32::try_from(size)?;
    let rgb = image::load_from_memory(bytes)?.resize_exact(side, side, FilterType::Triangle).to_rgb8();
    let pixels = Tensor::from_vec(rgb.into_raw(), (size, size, 3), device)?
        .permute((2, 0, 1))?
        .to_dtype(DType::F32)?;
    Ok(pixels.affine(2.0 / 255.0, -1.0)?.unsqueeze(0)?)
}

/// `Ok(None)` when OCR is switched off in settings.
pub fn load_ocr_extractor(settings: &OcrSettings) -> Result<Option<Arc<OcrExtractor>>> {
    if !settings.enabled {
        return Ok(None);
    }
    let dir = find_model_dir("ocr.model_dir", settings.model_dir(), &["APP_OCR_MODEL_DIR"], "models/trocr-base-printed")?;
    Ok(Some(Arc::new(OcrExtractor::load(&dir)?)))
}
