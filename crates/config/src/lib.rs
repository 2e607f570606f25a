//! Configuration loading, validation, and management for Vesta.
//!
//! Loads configuration from `~/.vesta/config.toml` with environment
//! variable overrides. Validates all settings at startup; there is no
//! hot-reload, a restart picks up changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vesta_core::Intent;

/// The root configuration structure.
///
/// Maps directly to `~/.vesta/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote generative model settings
    #[serde(default)]
    pub generative: GenerativeConfig,

    /// Classic/generative routing policy
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Persistent response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Conversation memory
    #[serde(default)]
    pub memory: MemoryConfig,

    /// User profile source
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Assistant persona
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Decision log
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

// ── Generative ──────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    /// Master switch for the generative branch
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// "gemini" or "openai" (any OpenAI-compatible endpoint)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Hard ceiling on a single generative call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    80
}
fn default_timeout_ms() -> u64 {
    3000
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            api_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for GenerativeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

// ── Routing ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Classic confidence at or above this answers without the model
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,

    /// Intents that always answer from the classic path
    #[serde(default = "default_always_classic")]
    pub always_classic: Vec<String>,

    /// Intents that must never reach the generative model
    #[serde(default = "default_never_generative")]
    pub never_generative: Vec<String>,

    /// Words that keep an utterance off the model when no intent matched
    #[serde(default = "default_critical_keywords")]
    pub critical_keywords: Vec<String>,
}

fn default_threshold() -> f32 {
    0.85
}
fn default_always_classic() -> Vec<String> {
    [
        "CREATE_DAILY_REMINDER",
        "CREATE_REMINDER",
        "LIST_REMINDERS",
        "DELETE_REMINDER",
        "CONTACT_PERSON",
        "GET_DATE",
        "GET_TIME",
        "PLUG_ON",
        "PLUG_OFF",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_never_generative() -> Vec<String> {
    ["EMERGENCY_ALERT", "SHUTDOWN_DEVICE", "READ_MESSAGES", "SEND_MESSAGE"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_critical_keywords() -> Vec<String> {
    [
        "emergencia",
        "socorro",
        "urgente",
        "auxilio",
        "medicación",
        "medicina",
        "pastilla",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            always_classic: default_always_classic(),
            never_generative: default_never_generative(),
            critical_keywords: default_critical_keywords(),
        }
    }
}

impl RoutingConfig {
    /// Parsed `always_classic` list. Invalid names are skipped (validation rejects them earlier).
    pub fn always_classic_intents(&self) -> Vec<Intent> {
        parse_intents(&self.always_classic)
    }

    pub fn never_generative_intents(&self) -> Vec<Intent> {
        parse_intents(&self.never_generative)
    }
}

fn parse_intents(names: &[String]) -> Vec<Intent> {
    names
        .iter()
        .filter_map(|n| Intent::from_str(n).ok())
        .collect()
}

// ── Cache ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_capacity() -> usize {
    50
}
fn default_cache_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

// ── Memory ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite", "in_memory" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite database file
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    #[serde(default = "default_window")]
    pub window_minutes: i64,

    #[serde(default = "default_strict_window")]
    pub strict_window_minutes: i64,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
}

pub const MEMORY_BACKENDS: &[&str] = &["sqlite", "in_memory", "none"];

fn default_memory_backend() -> String {
    "sqlite".into()
}
fn default_memory_path() -> PathBuf {
    AppConfig::config_dir().join("memory.db")
}
fn default_window() -> i64 {
    10
}
fn default_strict_window() -> i64 {
    2
}
fn default_retention_days() -> i64 {
    7
}
fn default_max_query_chars() -> usize {
    200
}
fn default_max_response_chars() -> usize {
    300
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_memory_path(),
            window_minutes: default_window(),
            strict_window_minutes: default_strict_window(),
            retention_days: default_retention_days(),
            max_query_chars: default_max_query_chars(),
            max_response_chars: default_max_response_chars(),
        }
    }
}

// ── Preferences / assistant / gateway / telemetry ───────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// JSON profile file; a built-in default profile is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Word ceiling stated in the persona block
    #[serde(default = "default_max_words")]
    pub max_words: u32,
}

fn default_assistant_name() -> String {
    "Vesta".into()
}
fn default_max_words() -> u32 {
    40
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            max_words: default_max_words(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42680
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Decision records kept in memory before the oldest is dropped
    #[serde(default = "default_max_decisions")]
    pub max_decisions: usize,
}

fn default_max_decisions() -> usize {
    1000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_decisions: default_max_decisions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vesta/config.toml).
    ///
    /// Environment overrides, highest priority:
    /// - `VESTA_API_KEY`, then `GEMINI_API_KEY` (only when no key is configured)
    /// - `VESTA_GENERATIVE_ENABLED`
    /// - `VESTA_CONFIDENCE_THRESHOLD`
    /// - `VESTA_GENERATIVE_TIMEOUT_MS`
    /// - `VESTA_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `VESTA_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.generative.api_key.is_none() {
            self.generative.api_key = var("VESTA_API_KEY").or_else(|| var("GEMINI_API_KEY"));
        }

        if let Some(raw) = var("VESTA_GENERATIVE_ENABLED") {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.generative.enabled = true,
                "0" | "false" | "no" | "off" => self.generative.enabled = false,
                other => tracing::warn!(value = other, "Ignoring VESTA_GENERATIVE_ENABLED"),
            }
        }

        if let Some(raw) = var("VESTA_CONFIDENCE_THRESHOLD") {
            match raw.trim().parse::<f32>() {
                Ok(v) => self.routing.confidence_threshold = v,
                Err(_) => tracing::warn!(value = %raw, "Ignoring VESTA_CONFIDENCE_THRESHOLD"),
            }
        }

        if let Some(raw) = var("VESTA_GENERATIVE_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(v) => self.generative.timeout_ms = v,
                Err(_) => tracing::warn!(value = %raw, "Ignoring VESTA_GENERATIVE_TIMEOUT_MS"),
            }
        }

        if let Some(model) = var("VESTA_MODEL") {
            self.generative.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vesta")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.routing.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(
                "routing.confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(1..=60_000).contains(&self.generative.timeout_ms) {
            return Err(ConfigError::ValidationError(
                "generative.timeout_ms must be between 1 and 60000".into(),
            ));
        }

        if self.generative.temperature < 0.0 || self.generative.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generative.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.cache.capacity == 0 || self.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.capacity and cache.ttl_secs must be > 0".into(),
            ));
        }

        if self.memory.window_minutes <= 0
            || self.memory.strict_window_minutes < 0
            || self.memory.strict_window_minutes > self.memory.window_minutes
        {
            return Err(ConfigError::ValidationError(
                "memory.strict_window_minutes must be within 0..=memory.window_minutes".into(),
            ));
        }

        if !MEMORY_BACKENDS.contains(&self.memory.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be one of {MEMORY_BACKENDS:?}, got '{}'",
                self.memory.backend
            )));
        }

        for name in self
            .routing
            .always_classic
            .iter()
            .chain(self.routing.never_generative.iter())
        {
            if Intent::from_str(name).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "unknown intent '{name}' in routing lists"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.generative.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors. Fatal at startup only.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generative.provider, "gemini");
        assert_eq!(config.routing.confidence_threshold, 0.85);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.memory.window_minutes, 10);
        assert_eq!(config.memory.strict_window_minutes, 2);
        assert_eq!(config.gateway.port, 42680);
    }

    #[test]
    fn default_lists_parse_as_intents() {
        let routing = RoutingConfig::default();
        assert_eq!(
            routing.always_classic_intents().len(),
            routing.always_classic.len()
        );
        assert!(routing
            .never_generative_intents()
            .contains(&Intent::EmergencyAlert));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generative.model, config.generative.model);
        assert_eq!(parsed.routing.never_generative, config.routing.never_generative);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let mut config = AppConfig::default();
        config.routing.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.generative.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn strict_window_larger_than_window_rejected() {
        let mut config = AppConfig::default();
        config.memory.strict_window_minutes = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_intent_name_rejected() {
        let mut config = AppConfig::default();
        config.routing.never_generative.push("ORDER_PIZZA".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ORDER_PIZZA"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.memory.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.generative.model, "gemini-2.0-flash");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[routing]\nconfidence_threshold = 0.9\n\n[cache]\nttl_secs = 60"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.routing.confidence_threshold, 0.9);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.capacity, 50);
        assert!(config.generative.enabled);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[routing\nconfidence_threshold = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "gk-test"),
            ("VESTA_GENERATIVE_ENABLED", "false"),
            ("VESTA_CONFIDENCE_THRESHOLD", "0.7"),
            ("VESTA_GENERATIVE_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.generative.api_key.as_deref(), Some("gk-test"));
        assert!(!config.generative.enabled);
        assert_eq!(config.routing.confidence_threshold, 0.7);
        assert_eq!(config.generative.timeout_ms, 3000);
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.generative.api_key = Some("super-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.0-flash"));
        assert!(toml_str.contains("42680"));
    }
}
