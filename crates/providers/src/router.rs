//! Client selection — builds the configured generative client.

use crate::openai_compat::{GEMINI_BASE_URL, OPENAI_BASE_URL, OpenAiCompatClient};
use std::sync::Arc;
use tracing::info;
use vesta_config::AppConfig;
use vesta_core::generative::GenerativeClient;

/// Build the generative client described by `config.generative`.
///
/// Returns `None` when generative routing is disabled or no API key is
/// available; the router then treats the generative branch as unavailable.
pub fn build_from_config(config: &AppConfig) -> Option<Arc<dyn GenerativeClient>> {
    let generative = &config.generative;
    if !generative.enabled {
        info!("Generative routing disabled by configuration");
        return None;
    }

    let provider = generative.provider.as_str();
    // Local servers (ollama, vllm) accept any key
    let api_key = match (&generative.api_key, provider) {
        (Some(key), _) => key.clone(),
        (None, "ollama" | "vllm") => provider.to_string(),
        (None, _) => {
            info!(provider, "No API key configured; generative routing unavailable");
            return None;
        }
    };

    let base_url = generative
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(provider));

    let client = OpenAiCompatClient::new(provider, base_url, api_key, &generative.model)
        .with_temperature(generative.temperature)
        .with_max_tokens(generative.max_output_tokens);

    info!(provider, model = %generative.model, "Generative client ready");
    Some(Arc::new(client))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" => GEMINI_BASE_URL.into(),
        "openai" => OPENAI_BASE_URL.into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
