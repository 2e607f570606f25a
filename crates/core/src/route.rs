//! Routing outcome types.
//!
//! Exactly one [`RouteDecision`] is computed per utterance, and every call to
//! the router yields a [`RouteResponse`] with user-facing text, even when the
//! generative branch fails.

use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// The branch chosen to produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Hand-authored zero-latency answer
    InstantCache,
    /// Previously generated answer still within its TTL
    PersistentCache,
    /// Deterministic phrase-table intent
    ClassicRule,
    /// Remote generative model
    Generative,
    /// Canned keyword reply or apology after the generative branch failed
    SmartFallback,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::InstantCache,
        Route::PersistentCache,
        Route::ClassicRule,
        Route::Generative,
        Route::SmartFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstantCache => "instant_cache",
            Self::PersistentCache => "persistent_cache",
            Self::ClassicRule => "classic_rule",
            Self::Generative => "generative",
            Self::SmartFallback => "smart_fallback",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a route was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: Route,

    /// Stable snake_case reason (e.g. "instant_hit", "never_generative")
    pub reason: String,

    /// Intent resolved by the classic matcher, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classic_intent: Option<Intent>,

    /// Binary classic confidence (0.95 on a match, 0.1 otherwise)
    pub classic_confidence: f32,
}

impl RouteDecision {
    pub fn new(route: Route, reason: impl Into<String>) -> Self {
        Self {
            route,
            reason: reason.into(),
            classic_intent: None,
            classic_confidence: 0.0,
        }
    }

    pub fn with_classic(mut self, intent: Option<Intent>, confidence: f32) -> Self {
        self.classic_intent = intent;
        self.classic_confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// The router's answer for one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    /// False only when the input could not be routed at all
    pub success: bool,

    pub route: Route,

    pub response_text: String,

    /// Route-specific details (intent, model, fallback_reason, memory usage...)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RouteResponse {
    pub fn new(route: Route, response_text: impl Into<String>) -> Self {
        Self {
            success: true,
            route,
            response_text: response_text.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    /// Attach one metadata field.
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Read back a string metadata field.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}
