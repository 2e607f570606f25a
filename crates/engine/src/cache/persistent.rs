//! Persistent tier: bounded TTL map of previously generated answers.
//!
//! Lookups use `peek`, so recency order is insertion order and capacity
//! pressure always evicts the oldest entry. Entries are replaced on write and
//! never mutated in place.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    inserted_at: Instant,
}

/// A served entry and how long ago it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentHit {
    pub payload: String,
    pub age: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

pub struct PersistentTier {
    entries: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    counters: Counters,
}

impl PersistentTier {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
            counters: Counters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }

    /// Serve `key` if it was stored less than the TTL ago; expired entries are removed.
    pub fn get(&self, key: &str) -> Option<PersistentHit> {
        let expired = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.peek(key) {
                Some(entry) => {
                    let age = entry.inserted_at.elapsed();
                    if age < self.ttl {
                        self.counters.hits.fetch_add(1, Ordering::Relaxed);
                        return Some(PersistentHit {
                            payload: entry.payload.clone(),
                            age,
                        });
                    }
                    true
                }
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            // Re-check: a writer may have replaced it between the locks
            let still_expired = entries
                .peek(key)
                .is_some_and(|e| e.inserted_at.elapsed() >= self.ttl);
            if still_expired {
                entries.pop(key);
                self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `payload` under `key`, evicting the oldest entry when full.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<String>) {
        let key = key.into();
        let entry = CacheEntry {
            payload: payload.into(),
            inserted_at: Instant::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((old_key, _)) = entries.push(key.clone(), entry)
            && old_key != key
        {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.inserted_at.elapsed() >= self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        self.counters
            .expirations
            .fetch_add(stale.len() as u64, Ordering::Relaxed);
        stale.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.counters.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.counters.evictions.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> u64 {
        self.counters.expirations.load(Ordering::Relaxed)
    }
}
