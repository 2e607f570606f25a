//! Data model for routing decisions and their aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use vesta_core::{Intent, Route};

// ── DecisionRecord ────────────────────────────────────────────────────────

/// One routed utterance, as recorded for offline analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique identifier.
    pub id: String,
    /// Session the utterance belonged to.
    pub session_id: String,
    /// Utterance length in characters (the text itself is not kept).
    pub input_chars: usize,
    /// Branch that produced the response.
    pub route: Route,
    /// Why the router chose that branch.
    pub reason: String,
    /// Intent matched by the classic path, if any.
    pub classic_intent: Option<Intent>,
    /// Wall time from entry to response.
    pub latency_ms: u64,
    /// Whether the response was a real answer.
    pub success: bool,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        session_id: impl Into<String>,
        input_chars: usize,
        route: Route,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            input_chars,
            route,
            reason: reason.into(),
            classic_intent: None,
            latency_ms: 0,
            success: true,
            timestamp: Utc::now(),
        }
    }

    pub fn with_intent(mut self, intent: Option<Intent>) -> Self {
        self.classic_intent = intent;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

// ── DecisionStats ─────────────────────────────────────────────────────────

/// Aggregate view over the retained decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionStats {
    /// Decisions currently retained.
    pub total: u64,
    /// Count per route name.
    pub by_route: BTreeMap<String, u64>,
    /// Decisions with `success == false`.
    pub errors: u64,
    /// Mean latency over retained decisions.
    pub avg_latency_ms: f64,
    /// Fraction of retained decisions answered by the generative model.
    pub generative_share: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder() {
        let rec = DecisionRecord::new("s1", 12, Route::ClassicRule, "confidence_above_threshold")
            .with_intent(Some(Intent::GetTime))
            .with_latency(3)
            .with_success(true);
        assert_eq!(rec.classic_intent, Some(Intent::GetTime));
        assert_eq!(rec.latency_ms, 3);
        assert!(!rec.id.is_empty());
    }

    #[test]
    fn record_serializes_route_snake_case() {
        let rec = DecisionRecord::new("s1", 4, Route::InstantCache, "instant_hit");
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("instant_cache"));
        assert!(!json.contains("hola"));
    }
}
