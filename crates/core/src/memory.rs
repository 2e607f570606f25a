//! Memory trait — append-only storage of completed generative exchanges.
//!
//! The decision path only ever issues two operations against a store:
//! an insert after a successful generation, and a single-row "most recent
//! record for this session" read. Counting and purging exist for the
//! background cleanup task and for diagnostics.

use crate::domain::Domain;
use crate::error::MemoryError;
use crate::utterance::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Session that produced the exchange; lookups never cross sessions
    pub session_id: SessionId,

    /// What the user asked (already truncated by the caller)
    pub user_query: String,

    /// What the assistant answered (already truncated by the caller)
    pub assistant_response: String,

    /// Domain detected for the query
    pub domain: Domain,

    /// Classifier confidence for that domain
    pub confidence: f32,

    /// When the exchange completed
    pub timestamp: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(
        session_id: SessionId,
        user_query: impl Into<String>,
        assistant_response: impl Into<String>,
        domain: Domain,
        confidence: f32,
    ) -> Self {
        Self {
            session_id,
            user_query: user_query.into(),
            assistant_response: assistant_response.into(),
            domain,
            confidence,
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (imports, tests).
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whole minutes elapsed between the record and `now`.
    pub fn minutes_before(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp).num_minutes().max(0)
    }
}

/// The core MemoryStore trait.
///
/// Implementations: SQLite, in-memory (for testing), none (no-op).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory", "none").
    fn name(&self) -> &str;

    /// Append a record.
    async fn append(&self, record: MemoryRecord) -> std::result::Result<(), MemoryError>;

    /// The newest record for `session` with a timestamp strictly after `since`.
    async fn latest(
        &self,
        session: &SessionId,
        since: DateTime<Utc>,
    ) -> std::result::Result<Option<MemoryRecord>, MemoryError>;

    /// Delete every record older than `cutoff`, returning how many were removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> std::result::Result<usize, MemoryError>;

    /// Total record count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;

    /// Record count for one session.
    async fn count_for_session(&self, session: &SessionId)
    -> std::result::Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn minutes_before_never_goes_negative() {
        let now = Utc::now();
        let rec = MemoryRecord::new(SessionId::from("s"), "q", "r", Domain::Plants, 0.5)
            .at(now - Duration::seconds(150));
        assert_eq!(rec.minutes_before(now), 2);

        let future = rec.clone().at(now + Duration::minutes(5));
        assert_eq!(future.minutes_before(now), 0);
    }

    #[test]
    fn record_serialization() {
        let rec = MemoryRecord::new(SessionId::from("s1"), "¿cómo riego la sábila?", "Poca agua", Domain::Plants, 0.7);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("plants"));
        assert!(json.contains("sábila"));
    }
}
