//! Per-extension text extraction.
//!
//! The registry maps lower-cased file extensions to extractors. Files whose
//! extension has no extractor produce `Ok(None)` and are skipped by callers.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::traits::TextExtractor;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{filename}: content is not valid UTF-8")]
    InvalidUtf8 { filename: String },

    #[error("{filename}: {message}")]
    Failed { filename: String, message: String },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ExtractError::InvalidUtf8 { filename: filename.to_string() })
    }
}

#[cfg(feature = "pdf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Failed { filename: filename.to_string(), message: e.to_string() })
    }
}

#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self { Self::default() }

    /// Plain text always; PDF when the `pdf` feature is enabled. Images have
    /// no built-in extractor and are reported as unsupported.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("txt", Arc::new(PlainTextExtractor));
        #[cfg(feature = "pdf")]
        registry.register("pdf", Arc::new(PdfExtractor));
        registry
    }

    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) -> &mut Self {
        self.by_extension.insert(extension.trim_start_matches('.').to_ascii_lowercase(), extractor);
        self
    }

    pub fn supports(&self, filename: &str) -> bool {
        extension_of(filename).is_some_and(|ext| self.by_extension.contains_key(&ext))
    }

    /// `Ok(None)` for unsupported extensions; `Err` when a supported file is
    /// unreadable. A panicking extractor is reported as `ExtractError::Failed`.
    pub fn extract(&self, filename: &str, bytes: &[u8]) -> Result<Option<String>, ExtractError> {
        let Some(extractor) = extension_of(filename).and_then(|ext| self.by_extension.get(&ext)) else {
            tracing::debug!(filename, "no extractor registered, skipping");
            return Ok(None);
        };
        match catch_unwind(AssertUnwindSafe(|| extractor.extract(filename, bytes))) {
            Ok(result) => result.map(Some),
            Err(panic) => Err(ExtractError::Failed { filename: filename.to_string(), message: panic_message(panic.as_ref()) }),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("extractor panicked: {detail}")
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
