//! OpenAI-compatible generative client.
//!
//! Works with OpenAI, Gemini (through its OpenAI-compatible endpoint),
//! OpenRouter, Ollama and any other `/chat/completions` server.
//!
//! Each call sends a single user message holding the fully assembled prompt.
//! There is no streaming and no tool use; the answer is one short reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use vesta_core::error::GenerativeError;
use vesta_core::generative::{GenerativeClient, Generation};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// An OpenAI-compatible generative client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client for `model` at `base_url`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 80,
            client: reqwest::Client::new(),
        }
    }

    /// Gemini through its OpenAI-compatible endpoint (convenience constructor).
    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("gemini", GEMINI_BASE_URL, api_key, model)
    }

    /// OpenAI (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", OPENAI_BASE_URL, api_key, model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl GenerativeClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> std::result::Result<Generation, GenerativeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let started = Instant::now();

        debug!(
            client = %self.name,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerativeError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                } else {
                    GenerativeError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(GenerativeError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(GenerativeError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Generative endpoint returned error");
            return Err(GenerativeError::Rejected {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GenerativeError::Rejected {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(GenerativeError::EmptyResponse)?;

        Ok(Generation {
            text,
            model_id: api_response.model.unwrap_or_else(|| self.model.clone()),
            latency_ms: started.elapsed().as_millis() as u64,
            tokens_used: api_response.usage.map(|u| u.total_tokens),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, GenerativeError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| GenerativeError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Chat completions API types ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReply,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    total_tokens: u32,
}
