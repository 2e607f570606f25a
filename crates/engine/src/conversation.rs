//! Short-term conversation memory.
//!
//! Only the most recent exchange of a session is ever consulted. Whether it
//! is folded into the next prompt is decided by a prioritized cascade; the
//! first rule that fires wins:
//!
//! 1. nothing within the memory window → no
//! 2. explicit topic change → no (overrides everything below)
//! 3. explicit backreference → yes
//! 4. continuation request → yes
//! 5. strong domain contrast → no
//! 6. inside the strict window → yes
//! 7. short query, same domain, within 5 minutes → yes
//! 8. looks incomplete on its own, within 3 minutes → yes
//! 9. otherwise → no

use crate::classifier::DomainClassifier;
use crate::text;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex_lite::Regex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vesta_core::domain::{Domain, DomainClassification};
use vesta_core::error::MemoryError;
use vesta_core::memory::{MemoryRecord, MemoryStore};
use vesta_core::utterance::SessionId;

const REFERENCE: &[&str] = &[
    "eso", "esto", "también", "además", "igual", "parecido", "lo mismo", "otra vez", "de nuevo",
    "como antes", "lo anterior", "lo que dijiste", "that", "same",
];

const CONTINUATION: &[&str] = &[
    "más información", "más detalles", "cuéntame más", "explica mejor", "dime más",
    "otro ejemplo", "otra forma", "alternativa", "diferente manera", "tell me more",
];

const TOPIC_CHANGE: &[&str] = &[
    "cambiando de tema", "otra cosa", "ahora pregunto", "por cierto", "y otra pregunta",
    "algo diferente", "cambiemos", "dejemos eso", "otra consulta", "ahora quiero saber",
    "pregunta diferente",
];

/// Shapes that rarely stand on their own, over folded text.
const INCOMPLETE: &[&str] = &[
    r"^(y|pero|entonces|asi|por eso)\b",
    r"^(como|cuando|donde|que)\s+[^\s?]{1,3}\s*\?*$",
    r"^(si|no|tal vez|puede ser)\b",
    r"^(otra|otro|mas|menos)\s+[^\s?]*\s*\?*$",
];

const SHORT_QUERY_WORDS: usize = 5;
const SAME_DOMAIN_MINUTES: i64 = 5;
const INCOMPLETE_MINUTES: i64 = 3;
const EXCERPT_CHARS: usize = 100;

/// Why memory was or was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryReason {
    NoPreviousInteraction,
    ExplicitTopicChange,
    ExplicitReference,
    ContinuationRequest,
    StrongDomainChange,
    ActiveConversationWindow,
    SameDomainShortQuery,
    IncompleteWithoutContext,
    NoMemoryNeeded,
    MemoryUnavailable,
}

impl MemoryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPreviousInteraction => "no_previous_interaction",
            Self::ExplicitTopicChange => "explicit_topic_change",
            Self::ExplicitReference => "explicit_reference",
            Self::ContinuationRequest => "continuation_request",
            Self::StrongDomainChange => "strong_domain_change",
            Self::ActiveConversationWindow => "active_conversation_window",
            Self::SameDomainShortQuery => "same_domain_short_query",
            Self::IncompleteWithoutContext => "incomplete_without_context",
            Self::NoMemoryNeeded => "no_memory_needed",
            Self::MemoryUnavailable => "memory_unavailable",
        }
    }
}

impl std::fmt::Display for MemoryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryDecision {
    pub use_memory: bool,
    pub reason: MemoryReason,
}

impl MemoryDecision {
    fn yes(reason: MemoryReason) -> Self {
        Self {
            use_memory: true,
            reason,
        }
    }

    fn no(reason: MemoryReason) -> Self {
        Self {
            use_memory: false,
            reason,
        }
    }
}

/// Bounded excerpt of the previous exchange handed to the prompt builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryContext {
    pub minutes_ago: i64,
    pub last_query: String,
    /// Cut to 97 chars + "..." when longer than 100
    pub last_response: String,
    pub domain: Domain,
    pub reason: MemoryReason,
}

/// Decision plus the excerpt when the decision was positive.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLookup {
    pub decision: MemoryDecision,
    pub context: Option<MemoryContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub backend: String,
    pub total_records: usize,
    pub session_records: usize,
    pub has_recent_memory: bool,
    pub window_minutes: i64,
    pub last_interaction_minutes_ago: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub window_minutes: i64,
    pub strict_window_minutes: i64,
    pub max_query_chars: usize,
    pub max_response_chars: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            window_minutes: 10,
            strict_window_minutes: 2,
            max_query_chars: 200,
            max_response_chars: 300,
        }
    }
}

impl From<&vesta_config::MemoryConfig> for MemorySettings {
    fn from(c: &vesta_config::MemoryConfig) -> Self {
        Self {
            window_minutes: c.window_minutes,
            strict_window_minutes: c.strict_window_minutes,
            max_query_chars: c.max_query_chars,
            max_response_chars: c.max_response_chars,
        }
    }
}

pub struct ConversationMemory {
    store: Arc<dyn MemoryStore>,
    classifier: Arc<DomainClassifier>,
    settings: MemorySettings,
    incomplete: Vec<Regex>,
}

impl ConversationMemory {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        classifier: Arc<DomainClassifier>,
        settings: MemorySettings,
    ) -> Self {
        let incomplete = INCOMPLETE
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            store,
            classifier,
            settings,
            incomplete,
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn backend(&self) -> &str {
        self.store.name()
    }

    /// Persist one completed generative exchange.
    pub async fn save(
        &self,
        session: &SessionId,
        query: &str,
        response: &str,
        classification: DomainClassification,
    ) -> Result<(), MemoryError> {
        let record = MemoryRecord::new(
            session.clone(),
            text::truncate_chars(query, self.settings.max_query_chars),
            text::truncate_chars(response, self.settings.max_response_chars),
            classification.domain,
            classification.confidence,
        );
        self.store.append(record).await?;
        debug!(session = %session, domain = %classification.domain, "Exchange saved to memory");
        Ok(())
    }

    async fn last_record(
        &self,
        session: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<MemoryRecord>, MemoryError> {
        let since = now - ChronoDuration::minutes(self.settings.window_minutes);
        self.store.latest(session, since).await
    }

    /// Run the cascade for `query` against the session's last exchange.
    pub async fn should_use_memory(&self, session: &SessionId, query: &str) -> MemoryDecision {
        self.lookup(session, query).await.decision
    }

    /// Decision and, when positive, the excerpt. Store failures yield
    /// `memory_unavailable` and never propagate.
    pub async fn lookup(&self, session: &SessionId, query: &str) -> MemoryLookup {
        self.lookup_with_classification(session, query).await.0
    }

    /// [`lookup`](Self::lookup), also returning the classification the
    /// cascade used so callers need not classify the query again.
    pub async fn lookup_with_classification(
        &self,
        session: &SessionId,
        query: &str,
    ) -> (MemoryLookup, DomainClassification) {
        let now = Utc::now();
        // Store read first so an I/O-bound backend is in flight while classifying
        let (last, classification) = tokio::join!(
            self.last_record(session, now),
            async { self.classifier.classify(query) },
        );

        let last = match last {
            Ok(last) => last,
            Err(e) => {
                warn!(session = %session, error = %e, "Memory lookup failed, continuing without it");
                let lookup = MemoryLookup {
                    decision: MemoryDecision::no(MemoryReason::MemoryUnavailable),
                    context: None,
                };
                return (lookup, classification);
            }
        };

        let decision = self.evaluate(last.as_ref(), query, classification.domain, now);
        let context = match (&last, decision.use_memory) {
            (Some(record), true) => {
                let minutes_ago = record.minutes_before(now);
                info!(reason = %decision.reason, minutes_ago, "Using conversation memory");
                Some(MemoryContext {
                    minutes_ago,
                    last_query: record.user_query.clone(),
                    last_response: text::excerpt(&record.assistant_response, EXCERPT_CHARS),
                    domain: record.domain,
                    reason: decision.reason,
                })
            }
            _ => None,
        };
        (MemoryLookup { decision, context }, classification)
    }

    /// Excerpt of the previous exchange, only when the cascade says so.
    pub async fn get_context(&self, session: &SessionId, query: &str) -> Option<MemoryContext> {
        self.lookup(session, query).await.context
    }

    /// The cascade itself, over an already-fetched record and the query's
    /// already-classified domain.
    pub fn evaluate(
        &self,
        last: Option<&MemoryRecord>,
        query: &str,
        current: Domain,
        now: DateTime<Utc>,
    ) -> MemoryDecision {
        let window_start = now - ChronoDuration::minutes(self.settings.window_minutes);
        let Some(last) = last.filter(|r| r.timestamp > window_start) else {
            return MemoryDecision::no(MemoryReason::NoPreviousInteraction);
        };
        let minutes = last.minutes_before(now);

        let folded = text::fold(query.trim());
        let tokens = text::words(&folded);

        if text::find_term(&tokens, TOPIC_CHANGE).is_some() {
            return MemoryDecision::no(MemoryReason::ExplicitTopicChange);
        }
        if text::find_term(&tokens, REFERENCE).is_some() {
            return MemoryDecision::yes(MemoryReason::ExplicitReference);
        }
        if text::find_term(&tokens, CONTINUATION).is_some() {
            return MemoryDecision::yes(MemoryReason::ContinuationRequest);
        }

        if last.domain.contrasts_strongly_with(current) {
            return MemoryDecision::no(MemoryReason::StrongDomainChange);
        }

        if minutes <= self.settings.strict_window_minutes {
            return MemoryDecision::yes(MemoryReason::ActiveConversationWindow);
        }

        if tokens.len() <= SHORT_QUERY_WORDS
            && current == last.domain
            && !current.is_neutral()
            && minutes <= SAME_DOMAIN_MINUTES
        {
            return MemoryDecision::yes(MemoryReason::SameDomainShortQuery);
        }

        if minutes <= INCOMPLETE_MINUTES && self.seems_incomplete(&folded) {
            return MemoryDecision::yes(MemoryReason::IncompleteWithoutContext);
        }

        MemoryDecision::no(MemoryReason::NoMemoryNeeded)
    }

    fn seems_incomplete(&self, folded: &str) -> bool {
        let shaped = folded.trim_start_matches(['¿', '¡', ' ']).trim_end();
        self.incomplete.iter().any(|re| re.is_match(shaped))
    }

    /// Delete records older than `retention_days`.
    pub async fn cleanup(&self, retention_days: i64) -> Result<usize, MemoryError> {
        let cutoff = Utc::now() - ChronoDuration::days(retention_days);
        let removed = self.store.purge_before(cutoff).await?;
        if removed > 0 {
            info!(removed, retention_days, "Old conversation records purged");
        }
        Ok(removed)
    }

    pub async fn stats(&self, session: &SessionId) -> Result<MemoryStats, MemoryError> {
        let now = Utc::now();
        let total_records = self.store.count().await?;
        let session_records = self.store.count_for_session(session).await?;
        let last = self.last_record(session, now).await?;
        Ok(MemoryStats {
            backend: self.store.name().to_string(),
            total_records,
            session_records,
            has_recent_memory: last.is_some(),
            window_minutes: self.settings.window_minutes,
            last_interaction_minutes_ago: last.map(|r| r.minutes_before(now)),
        })
    }

    /// Run [`cleanup`](Self::cleanup) every `every` until the handle is aborted.
    pub fn spawn_cleanup(
        self: Arc<Self>,
        every: Duration,
        retention_days: i64,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.cleanup(retention_days).await {
                    warn!(error = %e, "Memory cleanup failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vesta_memory::InMemoryBackend;

    fn memory() -> (ConversationMemory, Arc<InMemoryBackend>) {
        let store = Arc::new(InMemoryBackend::new());
        let mem = ConversationMemory::new(
            store.clone(),
            Arc::new(DomainClassifier::new()),
            MemorySettings::default(),
        );
        (mem, store)
    }

    fn eval(
        mem: &ConversationMemory,
        last: Option<&MemoryRecord>,
        query: &str,
        now: DateTime<Utc>,
    ) -> MemoryDecision {
        let current = mem.classifier.classify(query).domain;
        mem.evaluate(last, query, current, now)
    }

    fn record(domain: Domain, minutes_ago: i64, now: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord::new(
            SessionId::from("s1"),
            "¿Cómo riego la sábila?",
            "Riéguela poco, cada dos semanas.",
            domain,
            0.7,
        )
        .at(now - ChronoDuration::minutes(minutes_ago))
    }

    #[test]
    fn nothing_recent_means_no_memory() {
        let (mem, _) = memory();
        let now = Utc::now();
        let d = eval(&mem, None, "¿y eso?", now);
        assert_eq!(d, MemoryDecision::no(MemoryReason::NoPreviousInteraction));

        let old = record(Domain::Plants, 11, now);
        let d = eval(&mem, Some(&old), "¿y eso?", now);
        assert_eq!(d.reason, MemoryReason::NoPreviousInteraction);
    }

    #[test]
    fn backreference_wins_across_domains() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Plants, 1, now);
        let d = eval(&mem, Some(&last), "¿y eso sirve para el perro también?", now);
        assert_eq!(d, MemoryDecision::yes(MemoryReason::ExplicitReference));
    }

    #[test]
    fn topic_change_overrides_backreference() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Plants, 1, now);
        let d = eval(&mem, Some(&last), "cambiando de tema, ¿eso del clima?", now);
        assert_eq!(d, MemoryDecision::no(MemoryReason::ExplicitTopicChange));
    }

    #[test]
    fn continuation_request() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Cooking, 6, now);
        let d = eval(&mem, Some(&last), "Dime más", now);
        assert_eq!(d, MemoryDecision::yes(MemoryReason::ContinuationRequest));
    }

    #[test]
    fn strong_contrast_resets() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Devices, 1, now);
        let d = eval(&mem, Some(&last), "¿Cómo preparo un locro de papa?", now);
        assert_eq!(d, MemoryDecision::no(MemoryReason::StrongDomainChange));
    }

    #[test]
    fn strict_window_uses_whole_minutes() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Plants, 0, now).at(now - ChronoDuration::seconds(170));
        let d = eval(&mem, Some(&last), "cuéntame un chiste", now);
        assert_eq!(d, MemoryDecision::yes(MemoryReason::ActiveConversationWindow));
    }

    #[test]
    fn same_domain_short_query() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Plants, 4, now);
        let d = eval(&mem, Some(&last), "¿y las orquídeas?", now);
        assert_eq!(d, MemoryDecision::yes(MemoryReason::SameDomainShortQuery));

        let late = record(Domain::Plants, 6, now);
        let d = eval(&mem, Some(&late), "¿y las orquídeas?", now);
        assert_eq!(d, MemoryDecision::no(MemoryReason::NoMemoryNeeded));
    }

    #[test]
    fn cascade_uses_the_supplied_domain() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::Plants, 4, now);
        // Text alone reads as plants; the caller's classification decides
        let d = mem.evaluate(Some(&last), "¿y las orquídeas?", Domain::Devices, now);
        assert_eq!(d, MemoryDecision::no(MemoryReason::StrongDomainChange));
    }

    #[tokio::test]
    async fn lookup_returns_the_classification_it_used() {
        let (mem, _) = memory();
        let session = SessionId::from("s1");
        mem.save(
            &session,
            "¿cómo riego la sábila?",
            "Poca agua.",
            DomainClassification::new(Domain::Plants, 0.5),
        )
        .await
        .unwrap();

        let (lookup, classification) = mem
            .lookup_with_classification(&session, "¿y las orquídeas?")
            .await;
        assert_eq!(classification.domain, Domain::Plants);
        assert!(lookup.decision.use_memory);
        assert_eq!(mem.classifier.memo_len(), 1);
    }

    #[test]
    fn incomplete_queries() {
        let (mem, _) = memory();
        let now = Utc::now();
        let last = record(Domain::General, 3, now);
        for q in ["¿Cómo así?", "Pero no quiero", "Tal vez mañana", "otro más"] {
            let d = eval(&mem, Some(&last), q, now);
            assert_eq!(d.reason, MemoryReason::IncompleteWithoutContext, "{q}");
        }
        let stale = record(Domain::General, 4, now);
        let d = eval(&mem, Some(&stale), "¿Cómo así?", now);
        assert_eq!(d.reason, MemoryReason::NoMemoryNeeded);
    }

    #[tokio::test]
    async fn save_truncates_and_context_excerpts() {
        let (mem, store) = memory();
        let session = SessionId::from("s1");
        let long_query = "q".repeat(250);
        let long_reply = "r".repeat(400);
        mem.save(
            &session,
            &long_query,
            &long_reply,
            DomainClassification::new(Domain::Plants, 0.6),
        )
        .await
        .unwrap();

        let saved = store
            .latest(&session, Utc::now() - ChronoDuration::minutes(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.user_query.chars().count(), 200);
        assert_eq!(saved.assistant_response.chars().count(), 300);

        let ctx = mem.get_context(&session, "¿y eso?").await.unwrap();
        assert_eq!(ctx.reason, MemoryReason::ExplicitReference);
        assert_eq!(ctx.minutes_ago, 0);
        assert_eq!(ctx.last_response.chars().count(), 100);
        assert!(ctx.last_response.ends_with("..."));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (mem, _) = memory();
        mem.save(
            &SessionId::from("a"),
            "¿cómo riego?",
            "Poca agua.",
            DomainClassification::new(Domain::Plants, 0.5),
        )
        .await
        .unwrap();
        let d = mem.should_use_memory(&SessionId::from("b"), "¿y eso?").await;
        assert_eq!(d.reason, MemoryReason::NoPreviousInteraction);
    }

    struct BrokenStore;

    #[async_trait]
    impl MemoryStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn append(&self, _: MemoryRecord) -> Result<(), MemoryError> {
            Err(MemoryError::Unavailable("disk gone".into()))
        }
        async fn latest(
            &self,
            _: &SessionId,
            _: DateTime<Utc>,
        ) -> Result<Option<MemoryRecord>, MemoryError> {
            Err(MemoryError::Unavailable("disk gone".into()))
        }
        async fn purge_before(&self, _: DateTime<Utc>) -> Result<usize, MemoryError> {
            Err(MemoryError::Unavailable("disk gone".into()))
        }
        async fn count(&self) -> Result<usize, MemoryError> {
            Ok(0)
        }
        async fn count_for_session(&self, _: &SessionId) -> Result<usize, MemoryError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn store_failure_is_memory_unavailable() {
        let mem = ConversationMemory::new(
            Arc::new(BrokenStore),
            Arc::new(DomainClassifier::new()),
            MemorySettings::default(),
        );
        let lookup = mem.lookup(&SessionId::from("s"), "¿y eso?").await;
        assert_eq!(lookup.decision.reason, MemoryReason::MemoryUnavailable);
        assert!(lookup.context.is_none());
        assert!(mem.cleanup(7).await.is_err());
    }

    #[tokio::test]
    async fn cleanup_and_stats() {
        let (mem, store) = memory();
        let now = Utc::now();
        store
            .append(
                MemoryRecord::new(SessionId::from("s1"), "viejo", "viejo", Domain::General, 0.1)
                    .at(now - ChronoDuration::days(8)),
            )
            .await
            .unwrap();
        store.append(record(Domain::Plants, 1, now)).await.unwrap();

        let stats = mem.stats(&SessionId::from("s1")).await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert!(stats.has_recent_memory);
        assert_eq!(stats.last_interaction_minutes_ago, Some(1));

        assert_eq!(mem.cleanup(7).await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
