//! GenerativeClient trait — the abstraction over remote language models.
//!
//! A client knows how to turn one assembled prompt into one completion within
//! a caller-supplied time budget. The engine never depends on a concrete
//! vendor; implementations live in `vesta-providers`.

use crate::error::GenerativeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A successful completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text
    pub text: String,

    /// Which model actually responded
    pub model_id: String,

    /// Wall-clock time spent by the client
    pub latency_ms: u64,

    /// Total tokens billed, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// The core GenerativeClient trait.
///
/// `timeout` is advisory for the implementation; the router enforces its own
/// hard ceiling and drops the future when it expires.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// A human-readable name for this client (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Generate a completion for the prompt.
    async fn generate(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> std::result::Result<Generation, GenerativeError>;

    /// Health check — can we reach the model endpoint?
    async fn health_check(&self) -> std::result::Result<bool, GenerativeError> {
        Ok(true)
    }
}
