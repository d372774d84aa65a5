//! Generative answer service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use docqa_core::config::GenerationSettings;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured ({0} is unset)")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Prompt that pins the model to the retrieved context.
pub fn grounding_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following document context, please answer the user's question accurately and concisely.\n\n\
         Context from documents:\n{context}\n\n\
         User Question: {question}\n\n\
         Please provide a clear, informative answer based on the context provided. \
         If the context doesn't contain enough information to answer the question, please say so clearly."
    )
}

/// Gemini `generateContent` client (API-key auth).
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl GeminiGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key(),
            api_key_env: settings.api_key_env.clone(),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn has_api_key(&self) -> bool { self.api_key.is_some() }

    fn endpoint_url(&self, api_key: &str) -> String {
        format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, api_key)
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        })
    }

    /// Concatenate the text parts of the first candidate.
    fn parse_response(body: &Value) -> Result<String, GenerationError> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| GenerationError::MalformedResponse("missing 'candidates'".into()))?;
        let parts = candidate["content"]["parts"]
            .as_array()
            .ok_or_else(|| GenerationError::MalformedResponse("missing 'parts' in candidate content".into()))?;
        let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        if text.trim().is_empty() {
            return Err(GenerationError::MalformedResponse("candidate has no text".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(self.api_key_env.clone()))?;

        tracing::debug!(model = self.model.as_str(), "sending generateContent request");
        let response = self
            .client
            .post(self.endpoint_url(api_key))
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| GenerationError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Http { status: status.as_u16(), body: body_text });
        }
        let body: Value = serde_json::from_str(&body_text)
            .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON: {e}")))?;
        Self::parse_response(&body)
    }
}
