//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use vesta_core::error::MemoryError;
use vesta_core::memory::{MemoryRecord, MemoryStore};
use vesta_core::utterance::SessionId;

/// One session's records, in append order.
type Bucket = Arc<Mutex<Vec<MemoryRecord>>>;

/// Records bucketed per session. The session map lock is only held to find
/// or create a bucket, so cleanup of one session never stalls another.
pub struct InMemoryBackend {
    sessions: RwLock<HashMap<SessionId, Bucket>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn bucket(&self, session: &SessionId) -> Option<Bucket> {
        self.sessions.read().await.get(session).cloned()
    }

    async fn buckets(&self) -> Vec<Bucket> {
        self.sessions.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        let bucket = match self.bucket(&record.session_id).await {
            Some(bucket) => bucket,
            None => self
                .sessions
                .write()
                .await
                .entry(record.session_id.clone())
                .or_default()
                .clone(),
        };
        bucket.lock().await.push(record);
        Ok(())
    }

    async fn latest(
        &self,
        session: &SessionId,
        since: DateTime<Utc>,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        let Some(bucket) = self.bucket(session).await else {
            return Ok(None);
        };
        let records = bucket.lock().await;
        // Later appends win ties on timestamp
        Ok(records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.timestamp > since)
            .max_by_key(|(i, r)| (r.timestamp, *i))
            .map(|(_, r)| r.clone()))
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, MemoryError> {
        let mut removed = 0;
        let mut emptied = false;
        for bucket in self.buckets().await {
            {
                let mut records = bucket.lock().await;
                let before = records.len();
                records.retain(|r| r.timestamp >= cutoff);
                removed += before - records.len();
                emptied |= records.is_empty();
            }
            tokio::task::yield_now().await;
        }

        if emptied {
            // A bucket someone else holds may be about to receive a record
            self.sessions.write().await.retain(|_, bucket| {
                Arc::strong_count(bucket) > 1 || bucket.try_lock().map_or(true, |r| !r.is_empty())
            });
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let mut total = 0;
        for bucket in self.buckets().await {
            total += bucket.lock().await.len();
        }
        Ok(total)
    }

    async fn count_for_session(&self, session: &SessionId) -> Result<usize, MemoryError> {
        Ok(match self.bucket(session).await {
            Some(bucket) => bucket.lock().await.len(),
            None => 0,
        })
    }
}
