//! Error types for the Vesta domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. A cache miss is not an
//! error and is modelled as `Option::None` by the cache itself.

use thiserror::Error;

/// The top-level error type for all Vesta operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generative client errors ---
    #[error("Generative error: {0}")]
    Generative(#[from] GenerativeError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Classification errors ---
    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    // --- Preference errors ---
    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum GenerativeError {
    #[error("Generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Generation rejected: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Generative client not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

impl GenerativeError {
    /// Stable short name used in response metadata and decision logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::NotConfigured(_) => "not_configured",
            Self::Network(_) => "network",
            Self::EmptyResponse => "empty_response",
        }
    }

    /// Whether this failure came from the hard ceiling rather than the provider.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory store unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    #[error("Degenerate input: {0}")]
    Degenerate(String),
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("No profile for user '{0}'")]
    NotFound(String),

    #[error("Profile source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed profile data: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generative_error_displays_correctly() {
        let err = Error::Generative(GenerativeError::Rejected {
            status_code: 400,
            message: "Bad prompt".into(),
        });
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Bad prompt"));
    }

    #[test]
    fn generative_error_kinds_are_stable() {
        assert_eq!(GenerativeError::Timeout { timeout_ms: 3000 }.kind(), "timeout");
        assert_eq!(GenerativeError::EmptyResponse.kind(), "empty_response");
        assert!(GenerativeError::Timeout { timeout_ms: 1 }.is_timeout());
        assert!(!GenerativeError::Network("reset".into()).is_timeout());
    }

    #[test]
    fn memory_error_converts_to_top_level() {
        let err: Error = MemoryError::Unavailable("locked".into()).into();
        assert!(err.to_string().contains("locked"));
    }
}
