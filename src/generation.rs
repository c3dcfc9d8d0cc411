//! Text-generation backends.
//!
//! Implements [`TextGenerator`] for:
//! - **[`GeminiGenerator`]** — Google Gemini `generateContent`.
//! - **[`OpenAIGenerator`]** — OpenAI-compatible chat completions.
//! - **[`OllamaGenerator`]** — a local Ollama instance's `/api/generate`.
//! - **[`DisabledGenerator`]** — always fails; useful for retrieval-only runs.
//!
//! Every backend issues exactly one HTTP request per call. There is no
//! retry: a failed call surfaces as [`PipelineError::Generation`] and is
//! shown to the user as-is.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use arshidni_core::error::{PipelineError, Result as PipelineResult};
use arshidni_core::generation::TextGenerator;

use crate::config::GenerationConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Build the generator named by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiGenerator::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

fn http_client(config: &GenerationConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

fn base_url(config: &GenerationConfig, default: &str) -> String {
    config
        .url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Send `request`; return the JSON body or a generation error carrying the
/// HTTP status and response text.
async fn send_json(
    backend: &str,
    request: reqwest::RequestBuilder,
) -> PipelineResult<serde_json::Value> {
    let response = request.send().await.map_err(PipelineError::generation)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PipelineError::generation(format!(
            "{} API error {}: {}",
            backend, status, body
        )));
    }
    response.json().await.map_err(PipelineError::generation)
}

/// Missing keys fail the call, not construction.
fn require_key<'a>(key: Option<&'a str>, var: &str) -> PipelineResult<&'a str> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| PipelineError::generation(format!("{} environment variable not set", var)))
}

// ============ Disabled ============

/// A generator that always fails. Used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _model: &str, _prompt: &str) -> PipelineResult<String> {
        Err(PipelineError::generation("generation provider is disabled"))
    }
}

// ============ Gemini ============

/// Google Gemini backend. Calls fail until `GEMINI_API_KEY` is set.
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        Ok(Self {
            client: http_client(config)?,
            base_url: base_url(config, GEMINI_BASE_URL),
            api_key,
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> PipelineResult<String> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| PipelineError::generation("Invalid Gemini response: missing candidate parts"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(PipelineError::generation("Gemini returned an empty answer"));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> PipelineResult<String> {
        let api_key = require_key(self.api_key.as_deref(), "GEMINI_API_KEY")?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body);
        let json = send_json("Gemini", request).await?;
        parse_gemini_response(&json)
    }
}

// ============ OpenAI ============

/// OpenAI chat-completions backend. Calls fail until `OPENAI_API_KEY` is set.
pub struct OpenAIGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        Ok(Self {
            client: http_client(config)?,
            base_url: base_url(config, OPENAI_BASE_URL),
            api_key,
        })
    }
}

fn parse_openai_response(json: &serde_json::Value) -> PipelineResult<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::generation("Invalid OpenAI response: missing message content"))
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, model: &str, prompt: &str) -> PipelineResult<String> {
        let api_key = require_key(self.api_key.as_deref(), "OPENAI_API_KEY")?;
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body);
        let json = send_json("OpenAI", request).await?;
        parse_openai_response(&json)
    }
}

// ============ Ollama ============

/// Local Ollama backend (default `http://localhost:11434`).
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: base_url(config, OLLAMA_BASE_URL),
        })
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> PipelineResult<String> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::generation("Invalid Ollama response: missing response"))
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, model: &str, prompt: &str) -> PipelineResult<String> {
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body);
        let json = send_json("Ollama", request).await?;
        parse_ollama_response(&json)
    }
}
