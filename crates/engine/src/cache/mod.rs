//! Two-tier response cache consulted before any heavier work.
//!
//! - **Instant**: hand-authored answers, immutable at runtime
//! - **Persistent**: bounded TTL map of generated answers that pass [`CachePolicy`]
//!
//! Both tiers share one key: the output of [`normalize_query`].

pub mod instant;
pub mod persistent;
pub mod policy;

pub use instant::{InstantResponse, InstantTier};
pub use persistent::{PersistentHit, PersistentTier};
pub use policy::{CachePolicy, Verdict};

use crate::text;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vesta_core::domain::Domain;

/// Courtesy words removed before keying.
const COURTESY: &[&str] = &["por favor", "gracias", "disculpe", "perdon", "please", "thanks"];

/// Cache key for `query`: folded, punctuation removed, courtesy words
/// stripped, whitespace collapsed. Idempotent.
pub fn normalize_query(query: &str) -> String {
    let folded = text::fold(query);
    let courtesy: Vec<Vec<&str>> = COURTESY.iter().map(|c| text::words(c)).collect();

    // Dropping a phrase can join its neighbours into another one
    let mut words = text::words(&folded);
    loop {
        let kept = strip_courtesy(&words, &courtesy);
        if kept.len() == words.len() {
            return kept.join(" ");
        }
        words = kept;
    }
}

fn strip_courtesy<'a>(words: &[&'a str], courtesy: &[Vec<&str>]) -> Vec<&'a str> {
    let mut kept = Vec::with_capacity(words.len());
    let mut i = 0;
    'outer: while i < words.len() {
        for phrase in courtesy {
            if words[i..].starts_with(phrase) {
                i += phrase.len();
                continue 'outer;
            }
        }
        kept.push(words[i]);
        i += 1;
    }
    kept
}

/// Cache counters for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub instant_entries: usize,
    pub entries: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

pub struct ResponseCache {
    instant: InstantTier,
    persistent: PersistentTier,
    policy: CachePolicy,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            instant: InstantTier::new(),
            persistent: PersistentTier::new(capacity, ttl),
            policy: CachePolicy,
        }
    }

    /// Instant answer for a normalized key.
    pub fn instant(&self, key: &str) -> Option<String> {
        self.instant.get(key)
    }

    /// Persistent answer for a normalized key, if still fresh.
    pub fn persistent(&self, key: &str) -> Option<PersistentHit> {
        self.persistent.get(key)
    }

    /// Store a generated answer if the policy allows it. Returns the verdict.
    pub fn store(&self, query: &str, response: &str, domain: Domain) -> Verdict {
        let verdict = self.policy.evaluate(query, response, domain);
        let key = normalize_query(query);
        if verdict.is_cacheable() && !key.is_empty() {
            self.persistent.insert(key, response);
        } else {
            debug!(verdict = verdict.as_str(), "Response not cached");
        }
        verdict
    }

    pub fn purge_expired(&self) -> usize {
        self.persistent.purge_expired()
    }

    pub fn clear(&self) {
        self.persistent.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            instant_entries: self.instant.len(),
            entries: self.persistent.len(),
            capacity: self.persistent.capacity(),
            ttl_secs: self.persistent.ttl().as_secs(),
            hits: self.persistent.hits(),
            misses: self.persistent.misses(),
            evictions: self.persistent.evictions(),
            expirations: self.persistent.expirations(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(50, Duration::from_secs(300))
    }
}
