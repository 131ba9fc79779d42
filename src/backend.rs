//! Generative-backend abstraction and the two shipping implementations.
//!
//! The orchestrator is implementation-agnostic: it assembles an ordered
//! list of [`PromptPart`]s (text segments and inline image payloads) and
//! asks the backend for raw text. Everything else — prompt engineering,
//! JSON parsing and repair, logo reconciliation — lives outside the
//! backend so new providers need only translate the part list into their
//! wire format.
//!
//! One capability difference is surfaced explicitly:
//! [`GenerativeBackend::supports_image_scoring`]. Logo detection and
//! thumbnail ranking send images and expect a bare index back; backends
//! that cannot do this reliably return `false` and the orchestrator
//! degrades to "no logos found" / "first image". That is a documented
//! degenerate implementation, not an error.

use crate::error::Paper2BlogError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// One ordered element of a multimodal request.
#[derive(Debug, Clone)]
pub enum PromptPart {
    /// A text segment.
    Text(String),
    /// An inline image payload.
    InlineImage {
        /// Base64-encoded image bytes.
        data: String,
        /// e.g. "image/png".
        mime_type: String,
    },
}

impl PromptPart {
    /// Convenience constructor for text parts.
    pub fn text(s: impl Into<String>) -> Self {
        PromptPart::Text(s.into())
    }

    /// Convenience constructor for PNG image parts.
    pub fn png(data: impl Into<String>) -> Self {
        PromptPart::InlineImage {
            data: data.into(),
            mime_type: "image/png".to_string(),
        }
    }
}

/// A vision-capable generative model the pipeline can call.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently; call spacing is the caller's job via
/// [`crate::ratelimit::RateLimiter`].
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send the ordered part list and return the raw text response.
    ///
    /// `json_output` asks the backend for structured/JSON-leaning output
    /// where the provider supports forcing it; providers that cannot force
    /// it simply ignore the flag and the caller's repair logic compensates.
    async fn generate(
        &self,
        parts: &[PromptPart],
        json_output: bool,
    ) -> Result<String, Paper2BlogError>;

    /// Whether this backend can score images (logo detection, thumbnail
    /// ranking) by returning a bare index token.
    fn supports_image_scoring(&self) -> bool;

    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;
}

// ── Gemini ───────────────────────────────────────────────────────────────

/// Google Gemini REST backend (`generateContent`, inline data parts).
///
/// Supports forced JSON output via `responseMimeType` and image scoring.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a backend for the given API key and model
    /// (e.g. "gemini-2.0-flash").
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_timeout: Duration,
    ) -> Result<Self, Paper2BlogError> {
        let client = reqwest::Client::builder()
            .timeout(api_timeout)
            .build()
            .map_err(|e| Paper2BlogError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }

    fn transport_err(&self, detail: impl Into<String>) -> Paper2BlogError {
        Paper2BlogError::AiTransport {
            backend: self.name().to_string(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        parts: &[PromptPart],
        json_output: bool,
    ) -> Result<String, Paper2BlogError> {
        let wire_parts: Vec<Value> = parts
            .iter()
            .map(|p| match p {
                PromptPart::Text(t) => json!({ "text": t }),
                PromptPart::InlineImage { data, mime_type } => json!({
                    "inline_data": { "mime_type": mime_type, "data": data }
                }),
            })
            .collect();

        let mut body = json!({
            "contents": [{ "role": "user", "parts": wire_parts }]
        });
        if json_output {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        debug!("gemini: {} parts, json_output={}", parts.len(), json_output);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.transport_err(format!("HTTP {status}: {body}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| self.transport_err(format!("response body: {e}")))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.transport_err("response contained no candidate text"))
    }

    fn supports_image_scoring(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ── OpenRouter ───────────────────────────────────────────────────────────

/// OpenRouter backend (OpenAI-style `chat/completions`, data-URI images).
///
/// Accepts images in the main conversion call, but index-scoring prompts
/// are unreliable across the heterogeneous models it fronts, so
/// [`GenerativeBackend::supports_image_scoring`] returns `false` and the
/// orchestrator skips logo detection and AI thumbnail ranking.
pub struct OpenRouterBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterBackend {
    /// Create a backend for the given API key and model
    /// (e.g. "meta-llama/llama-3.2-90b-vision-instruct").
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_timeout: Duration,
    ) -> Result<Self, Paper2BlogError> {
        let client = reqwest::Client::builder()
            .timeout(api_timeout)
            .build()
            .map_err(|e| Paper2BlogError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn transport_err(&self, detail: impl Into<String>) -> Paper2BlogError {
        Paper2BlogError::AiTransport {
            backend: self.name().to_string(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for OpenRouterBackend {
    async fn generate(
        &self,
        parts: &[PromptPart],
        json_output: bool,
    ) -> Result<String, Paper2BlogError> {
        let content: Vec<Value> = parts
            .iter()
            .map(|p| match p {
                PromptPart::Text(t) => json!({ "type": "text", "text": t }),
                PromptPart::InlineImage { data, mime_type } => json!({
                    "type": "image_url",
                    "image_url": { "url": format!("data:{mime_type};base64,{data}") }
                }),
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }]
        });
        if json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!("openrouter: {} parts, json_output={}", parts.len(), json_output);

        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.transport_err(format!("HTTP {status}: {body}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| self.transport_err(format!("response body: {e}")))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.transport_err("response contained no message content"))
    }

    fn supports_image_scoring(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}
