//! No-op store — disables conversation memory entirely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vesta_core::error::MemoryError;
use vesta_core::memory::{MemoryRecord, MemoryStore};
use vesta_core::utterance::SessionId;

/// Stores nothing and never finds a prior exchange.
pub struct NoopMemory;

#[async_trait]
impl MemoryStore for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    async fn append(&self, _record: MemoryRecord) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn latest(
        &self,
        _session: &SessionId,
        _since: DateTime<Utc>,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        Ok(None)
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn count_for_session(&self, _session: &SessionId) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
