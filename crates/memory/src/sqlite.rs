//! SQLite conversation store.
//!
//! One table, `conversation_memory`, indexed on `(session_id, timestamp)` so
//! the "most recent record for this session" read is a single index seek.
//! Timestamps are stored as RFC 3339 text in UTC, which sorts
//! lexicographically in time order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};
use vesta_core::domain::Domain;
use vesta_core::error::MemoryError;
use vesta_core::memory::{MemoryRecord, MemoryStore};
use vesta_core::utterance::SessionId;

/// Fixed-width UTC text so string order matches time order.
fn sortable(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A SQLite-backed conversation store.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to ":memory:" is a separate database
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        info!("SQLite conversation store initialized at {path}");
        Ok(backend)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let backend = Self { pool };
        backend.run_migrations().await?;
        Ok(backend)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_memory (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id         TEXT NOT NULL,
                user_query         TEXT NOT NULL,
                assistant_response TEXT NOT NULL,
                domain             TEXT NOT NULL,
                confidence         REAL NOT NULL,
                timestamp          TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("conversation_memory table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversation_session_ts \
             ON conversation_memory(session_id, timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("session index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversation_ts ON conversation_memory(timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("timestamp index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, MemoryError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| MemoryError::QueryFailed(format!("session_id column: {e}")))?;
        let user_query: String = row
            .try_get("user_query")
            .map_err(|e| MemoryError::QueryFailed(format!("user_query column: {e}")))?;
        let assistant_response: String = row
            .try_get("assistant_response")
            .map_err(|e| MemoryError::QueryFailed(format!("assistant_response column: {e}")))?;
        let domain_str: String = row
            .try_get("domain")
            .map_err(|e| MemoryError::QueryFailed(format!("domain column: {e}")))?;
        let confidence: f64 = row
            .try_get("confidence")
            .map_err(|e| MemoryError::QueryFailed(format!("confidence column: {e}")))?;
        let timestamp_str: String = row
            .try_get("timestamp")
            .map_err(|e| MemoryError::QueryFailed(format!("timestamp column: {e}")))?;

        let domain = Domain::from_str(&domain_str).unwrap_or_else(|_| {
            warn!(domain = %domain_str, "Unknown domain in stored record");
            Domain::General
        });

        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("timestamp parse: {e}")))?;

        Ok(MemoryRecord {
            session_id: SessionId(session_id),
            user_query,
            assistant_response,
            domain,
            confidence: confidence as f32,
            timestamp,
        })
    }
}

#[async_trait]
impl MemoryStore for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_memory
                (session_id, user_query, assistant_response, domain, confidence, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(record.session_id.as_str())
        .bind(&record.user_query)
        .bind(&record.assistant_response)
        .bind(record.domain.as_str())
        .bind(f64::from(record.confidence))
        .bind(sortable(record.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        debug!(session = %record.session_id, domain = %record.domain, "Stored exchange");
        Ok(())
    }

    async fn latest(
        &self,
        session: &SessionId,
        since: DateTime<Utc>,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM conversation_memory
            WHERE session_id = ?1 AND timestamp > ?2
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(session.as_str())
        .bind(sortable(since))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("latest: {e}")))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, MemoryError> {
        let result = sqlx::query("DELETE FROM conversation_memory WHERE timestamp < ?1")
            .bind(sortable(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() as usize)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM conversation_memory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("COUNT failed: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("count column: {e}")))?;
        Ok(count as usize)
    }

    async fn count_for_session(&self, session: &SessionId) -> Result<usize, MemoryError> {
        let row =
            sqlx::query("SELECT COUNT(*) AS cnt FROM conversation_memory WHERE session_id = ?1")
                .bind(session.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| MemoryError::QueryFailed(format!("COUNT failed: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("count column: {e}")))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_backend() -> SqliteBackend {
        SqliteBackend::new("sqlite::memory:").await.unwrap()
    }

    fn record(session: &str, query: &str, domain: Domain, minutes_ago: i64) -> MemoryRecord {
        MemoryRecord::new(SessionId::from(session), query, "respuesta", domain, 0.6)
            .at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn append_and_read_latest() {
        let db = test_backend().await;
        db.append(record("s1", "primera", Domain::Plants, 5)).await.unwrap();
        db.append(record("s1", "segunda", Domain::Cooking, 1)).await.unwrap();

        let since = Utc::now() - Duration::minutes(10);
        let latest = db.latest(&SessionId::from("s1"), since).await.unwrap().unwrap();
        assert_eq!(latest.user_query, "segunda");
        assert_eq!(latest.domain, Domain::Cooking);
        assert!((latest.confidence - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn latest_never_crosses_sessions() {
        let db = test_backend().await;
        db.append(record("s1", "de s1", Domain::Plants, 1)).await.unwrap();

        let since = Utc::now() - Duration::minutes(10);
        assert!(db.latest(&SessionId::from("s2"), since).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_respects_window() {
        let db = test_backend().await;
        db.append(record("s1", "vieja", Domain::Plants, 30)).await.unwrap();

        let since = Utc::now() - Duration::minutes(10);
        assert!(db.latest(&SessionId::from("s1"), since).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_removes_only_old_records() {
        let db = test_backend().await;
        db.append(record("s1", "hace días", Domain::Pets, 60 * 24 * 8)).await.unwrap();
        db.append(record("s1", "reciente", Domain::Pets, 1)).await.unwrap();
        db.append(record("s2", "reciente", Domain::Pets, 2)).await.unwrap();

        let removed = db
            .purge_before(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.count().await.unwrap(), 2);
        assert_eq!(db.count_for_session(&SessionId::from("s1")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopening_file_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let path = path.to_string_lossy().to_string();

        {
            let db = SqliteBackend::new(&path).await.unwrap();
            db.append(record("s1", "persistente", Domain::Religion, 1)).await.unwrap();
        }

        let db = SqliteBackend::new(&path).await.unwrap();
        assert_eq!(db.count().await.unwrap(), 1);
    }
}
