//! Thread-safe decision log — a bounded ring of recent routing decisions.

use crate::model::{DecisionRecord, DecisionStats};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use vesta_core::Route;

/// The decision log.
///
/// Thread-safe via `RwLock`. Appends are O(1); once `capacity` records are
/// held the oldest is dropped. Nothing in the request path reads it back.
pub struct DecisionLog {
    capacity: usize,
    records: RwLock<VecDeque<DecisionRecord>>,
}

impl DecisionLog {
    /// Create a log keeping at most `capacity` decisions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a decision, dropping the oldest when full.
    pub fn record(&self, record: DecisionRecord) {
        tracing::debug!(
            route = %record.route,
            reason = %record.reason,
            latency_ms = record.latency_ms,
            success = record.success,
            "Decision recorded"
        );

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Most recent decisions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DecisionRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.iter().rev().take(limit).cloned().collect()
    }

    /// Decisions for one session, newest first.
    pub fn for_session(&self, session_id: &str, limit: usize) -> Vec<DecisionRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .rev()
            .filter(|r| r.session_id == session_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate statistics over the retained decisions.
    pub fn stats(&self) -> DecisionStats {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        if records.is_empty() {
            return DecisionStats::default();
        }

        let mut by_route: BTreeMap<String, u64> = BTreeMap::new();
        let mut errors = 0u64;
        let mut latency_sum = 0u64;
        let mut generative = 0u64;

        for r in records.iter() {
            *by_route.entry(r.route.as_str().to_string()).or_default() += 1;
            if !r.success {
                errors += 1;
            }
            if r.route == Route::Generative {
                generative += 1;
            }
            latency_sum += r.latency_ms;
        }

        let total = records.len() as u64;
        DecisionStats {
            total,
            by_route,
            errors,
            avg_latency_ms: latency_sum as f64 / total as f64,
            generative_share: generative as f64 / total as f64,
        }
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(session: &str, route: Route, latency_ms: u64) -> DecisionRecord {
        DecisionRecord::new(session, 10, route, "test").with_latency(latency_ms)
    }

    #[test]
    fn recent_is_newest_first() {
        let log = DecisionLog::new(10);
        log.record(decision("s", Route::InstantCache, 0));
        log.record(decision("s", Route::ClassicRule, 1));
        log.record(decision("s", Route::Generative, 900));

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].route, Route::Generative);
        assert_eq!(recent[1].route, Route::ClassicRule);
    }

    #[test]
    fn oldest_dropped_at_capacity() {
        let log = DecisionLog::new(3);
        for i in 0..5 {
            log.record(decision(&format!("s{i}"), Route::ClassicRule, i));
        }
        assert_eq!(log.len(), 3);
        let sessions: Vec<_> = log.recent(10).into_iter().map(|r| r.session_id).collect();
        assert_eq!(sessions, vec!["s4", "s3", "s2"]);
    }

    #[test]
    fn stats_aggregate() {
        let log = DecisionLog::new(10);
        log.record(decision("a", Route::InstantCache, 0));
        log.record(decision("a", Route::Generative, 800));
        log.record(
            decision("b", Route::SmartFallback, 400).with_success(false),
        );
        log.record(decision("b", Route::Generative, 1200));

        let stats = log.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.by_route.get("generative"), Some(&2));
        assert_eq!(stats.by_route.get("instant_cache"), Some(&1));
        assert!((stats.avg_latency_ms - 600.0).abs() < f64::EPSILON);
        assert!((stats.generative_share - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn for_session_filters() {
        let log = DecisionLog::new(10);
        log.record(decision("a", Route::InstantCache, 0));
        log.record(decision("b", Route::ClassicRule, 0));
        log.record(decision("a", Route::Generative, 0));
        assert_eq!(log.for_session("a", 10).len(), 2);
        assert_eq!(log.for_session("c", 10).len(), 0);
    }

    #[test]
    fn empty_log_stats_are_zero() {
        let log = DecisionLog::default();
        assert!(log.is_empty());
        let stats = log.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }

    #[test]
    fn clear_empties() {
        let log = DecisionLog::new(2);
        log.record(decision("a", Route::InstantCache, 0));
        log.clear();
        assert!(log.is_empty());
    }
}
