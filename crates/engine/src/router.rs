//! The decision router.
//!
//! One call to [`DecisionRouter::route`] yields exactly one decision and
//! always a response with user-facing text. Routes are tried in order and
//! the first that applies answers:
//!
//! 1. instant cache
//! 2. persistent cache
//! 3. classic rule (block-listed intent, or confidence at threshold)
//! 4. generative, under a hard timeout
//! 5. smart fallback when generation is unavailable or fails

use crate::analysis;
use crate::cache::{self, ResponseCache};
use crate::classic::{BasicIntentHandler, ClassicMatch, ClassicMatcher, IntentHandler};
use crate::conversation::ConversationMemory;
use crate::fallback::{FallbackReason, REPEAT_REQUEST, SmartFallback};
use crate::prompt::{PromptBuilder, PromptInput};
use crate::temporal::TemporalContext;
use crate::text;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vesta_core::domain::DomainClassification;
use vesta_core::error::{GenerativeError, PreferenceError};
use vesta_core::event::{DomainEvent, EventBus};
use vesta_core::generative::GenerativeClient;
use vesta_core::intent::Intent;
use vesta_core::preferences::{PreferenceProvider, UserPreferenceSnapshot};
use vesta_core::route::{Route, RouteDecision, RouteResponse};
use vesta_core::utterance::{SessionId, Utterance};
use vesta_telemetry::{DecisionLog, DecisionRecord};

/// Routing knobs, read once at startup.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub confidence_threshold: f32,
    /// Intents always answered by the classic path
    pub always_classic: Vec<Intent>,
    /// Intents that must never reach the generative model
    pub never_generative: Vec<Intent>,
    /// Folded keywords that keep unmatched utterances away from the model
    pub critical_keywords: Vec<String>,
    pub generative_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from(&vesta_config::RoutingConfig::default())
    }
}

impl From<&vesta_config::RoutingConfig> for RouterSettings {
    fn from(c: &vesta_config::RoutingConfig) -> Self {
        Self {
            confidence_threshold: c.confidence_threshold,
            always_classic: c.always_classic_intents(),
            never_generative: c.never_generative_intents(),
            critical_keywords: c.critical_keywords.iter().map(|k| text::fold(k)).collect(),
            generative_timeout: Duration::from_millis(3000),
        }
    }
}

impl RouterSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.generative_timeout = timeout;
        self
    }
}

pub struct DecisionRouter {
    settings: RouterSettings,
    cache: Arc<ResponseCache>,
    classic: ClassicMatcher,
    intents: Arc<dyn IntentHandler>,
    memory: Arc<ConversationMemory>,
    prompts: PromptBuilder,
    fallback: SmartFallback,
    generative: Option<Arc<dyn GenerativeClient>>,
    preference_provider: Arc<dyn PreferenceProvider>,
    preferences: RwLock<Arc<UserPreferenceSnapshot>>,
    decisions: Arc<DecisionLog>,
    events: Arc<EventBus>,
}

impl DecisionRouter {
    /// Create a router with default settings, cache, prompt persona and
    /// intent handler. `generative` is `None` when generation is disabled.
    pub fn new(
        memory: Arc<ConversationMemory>,
        generative: Option<Arc<dyn GenerativeClient>>,
        preference_provider: Arc<dyn PreferenceProvider>,
    ) -> Self {
        Self {
            settings: RouterSettings::default(),
            cache: Arc::new(ResponseCache::default()),
            classic: ClassicMatcher::new(),
            intents: Arc::new(BasicIntentHandler),
            memory,
            prompts: PromptBuilder::new("Vesta", 40),
            fallback: SmartFallback,
            generative,
            preference_provider,
            preferences: RwLock::new(Arc::new(UserPreferenceSnapshot::default())),
            decisions: Arc::new(DecisionLog::default()),
            events: Arc::new(EventBus::default()),
        }
    }

    pub fn with_settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_intent_handler(mut self, handler: Arc<dyn IntentHandler>) -> Self {
        self.intents = handler;
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_decision_log(mut self, log: Arc<DecisionLog>) -> Self {
        self.decisions = log;
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_preferences(self, snapshot: UserPreferenceSnapshot) -> Self {
        *self
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        self
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    pub fn decisions(&self) -> &Arc<DecisionLog> {
        &self.decisions
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn generative_enabled(&self) -> bool {
        self.generative.is_some()
    }

    /// Snapshot for the current request; later switches do not affect it.
    pub fn preferences(&self) -> Arc<UserPreferenceSnapshot> {
        self.preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load the provider's default profile.
    pub async fn load_default_preferences(&self) -> Result<(), PreferenceError> {
        let snapshot = self.preference_provider.get_preferences(None).await?;
        self.swap_preferences(snapshot);
        Ok(())
    }

    /// Re-query the provider for `user_id` and swap the snapshot. On failure
    /// the previous snapshot stays active.
    pub async fn on_user_switch(
        &self,
        user_id: &str,
    ) -> Result<Arc<UserPreferenceSnapshot>, PreferenceError> {
        let result = self.preference_provider.get_preferences(Some(user_id)).await;
        let reloaded = result.is_ok();
        self.events.publish(DomainEvent::UserSwitched {
            user_id: user_id.to_string(),
            reloaded,
            timestamp: Utc::now(),
        });
        match result {
            Ok(snapshot) => {
                info!(user = %user_id, provider = self.preference_provider.name(), "Preferences reloaded");
                Ok(self.swap_preferences(snapshot))
            }
            Err(e) => {
                warn!(user = %user_id, error = %e, "Preference reload failed, keeping previous profile");
                Err(e)
            }
        }
    }

    fn swap_preferences(&self, snapshot: UserPreferenceSnapshot) -> Arc<UserPreferenceSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }

    // ── Entry point ───────────────────────────────────────────────────────

    /// Route one utterance for `session`.
    pub async fn route(&self, text: &str, session: &SessionId) -> RouteResponse {
        let started = Instant::now();
        let utterance = Utterance::new(text);
        debug!(session = %session, chars = utterance.char_len(), preview = %utterance.preview(40), "Routing utterance");

        let (decision, response) = self.decide_and_respond(&utterance, session).await;
        self.finish(&utterance, session, decision, response, started)
    }

    async fn decide_and_respond(
        &self,
        utterance: &Utterance,
        session: &SessionId,
    ) -> (RouteDecision, RouteResponse) {
        if utterance.is_blank() {
            let decision = RouteDecision::new(Route::SmartFallback, "blank_input");
            let response = RouteResponse::new(Route::SmartFallback, REPEAT_REQUEST).failed();
            return (decision, response);
        }
        let text = utterance.text.as_str();

        // 1 + 2: cache tiers share the normalized key
        let key = cache::normalize_query(text);
        if let Some(answer) = self.cache.instant(&key) {
            let decision = RouteDecision::new(Route::InstantCache, "instant_hit");
            let response = RouteResponse::new(Route::InstantCache, answer)
                .with_meta("confidence", 1.0)
                .with_meta("cache_key", key);
            return (decision, response);
        }
        if let Some(hit) = self.cache.persistent(&key) {
            let decision = RouteDecision::new(Route::PersistentCache, "persistent_hit");
            let response = RouteResponse::new(Route::PersistentCache, hit.payload)
                .with_meta("cache_key", key)
                .with_meta("cache_age_secs", hit.age.as_secs());
            return (decision, response);
        }

        // 3: classic rules
        let matched = self.classic.match_intent(text);
        if let Some(reason) = self.classic_reason(&matched) {
            return self.respond_classic(&matched, reason).await;
        }
        if !matched.is_match() && self.has_critical_keyword(text) {
            return self.respond_fallback(text, &matched, FallbackReason::CriticalKeyword);
        }

        // 4: generative, or what is left when it is off
        let Some(client) = self.generative.clone() else {
            if matched.is_match() {
                return self.respond_classic(&matched, "generative_unavailable").await;
            }
            return self.respond_fallback(text, &matched, FallbackReason::GenerativeUnavailable);
        };
        self.respond_generative(client, text, session, &matched).await
    }

    /// Why the classic path must answer, if it must.
    fn classic_reason(&self, matched: &ClassicMatch) -> Option<&'static str> {
        let intent = matched.intent?;
        if self.settings.never_generative.contains(&intent) {
            return Some("never_generative");
        }
        if self.settings.always_classic.contains(&intent) {
            return Some("always_classic");
        }
        if matched.confidence >= self.settings.confidence_threshold {
            return Some("confidence_above_threshold");
        }
        None
    }

    fn has_critical_keyword(&self, text: &str) -> bool {
        let folded = text::fold(text);
        let words = text::words(&folded);
        self.settings
            .critical_keywords
            .iter()
            .any(|k| text::contains_term(&words, k))
    }

    async fn respond_classic(
        &self,
        matched: &ClassicMatch,
        reason: &str,
    ) -> (RouteDecision, RouteResponse) {
        let decision = RouteDecision::new(Route::ClassicRule, reason)
            .with_classic(matched.intent, matched.confidence);
        let Some(intent) = matched.intent else {
            let response = RouteResponse::new(Route::ClassicRule, REPEAT_REQUEST).failed();
            return (decision, response);
        };

        let preferences = self.preferences();
        let mut response = match self.intents.handle(intent, matched, &preferences).await {
            Ok(reply) => RouteResponse::new(Route::ClassicRule, reply),
            Err(e) => {
                warn!(intent = %intent, handler = self.intents.name(), error = %e, "Intent handler failed");
                RouteResponse::new(Route::ClassicRule, SmartFallback::apology(intent.as_str())).failed()
            }
        };
        response = response
            .with_meta("intent", intent.as_str())
            .with_meta("command", intent.command())
            .with_meta("confidence", f64::from(matched.confidence));
        if let Some(parts) = &matched.message {
            response = response
                .with_meta("contact", parts.contact.clone())
                .with_meta("message", parts.body.clone());
        }
        (decision, response)
    }

    fn respond_fallback(
        &self,
        text: &str,
        matched: &ClassicMatch,
        reason: FallbackReason,
    ) -> (RouteDecision, RouteResponse) {
        let reply = self.fallback.reply(text);
        let decision = RouteDecision::new(Route::SmartFallback, reason.as_str())
            .with_classic(matched.intent, matched.confidence);
        let response = RouteResponse::new(Route::SmartFallback, reply.text)
            .with_meta("fallback_reason", reason.as_str())
            .with_meta("fallback_kind", reply.kind.as_str());
        (decision, response)
    }

    async fn respond_generative(
        &self,
        client: Arc<dyn GenerativeClient>,
        text: &str,
        session: &SessionId,
        matched: &ClassicMatch,
    ) -> (RouteDecision, RouteResponse) {
        let preferences = self.preferences();

        let (lookup, classification) = self.memory.lookup_with_classification(session, text).await;

        let characteristics = analysis::analyze(text);
        let temporal = TemporalContext::now();
        let prompt = self.prompts.build(&PromptInput {
            utterance: text,
            classification,
            characteristics: &characteristics,
            temporal: &temporal,
            preferences: &preferences,
            memory: lookup.context.as_ref(),
        });

        let timeout = self.settings.generative_timeout;
        let outcome = match tokio::time::timeout(timeout, client.generate(&prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(GenerativeError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(generation) => {
                info!(
                    client = client.name(),
                    model = %generation.model_id,
                    domain = %classification.domain,
                    latency_ms = generation.latency_ms,
                    "Generative route answered"
                );
                self.remember(session, text, &generation.text, classification).await;

                let decision = RouteDecision::new(Route::Generative, "generative")
                    .with_classic(matched.intent, matched.confidence);
                let mut response = RouteResponse::new(Route::Generative, generation.text)
                    .with_meta("model", generation.model_id)
                    .with_meta("generation_ms", generation.latency_ms)
                    .with_meta("domain", classification.domain.as_str())
                    .with_meta("domain_confidence", f64::from(classification.confidence))
                    .with_meta("memory_used", lookup.context.is_some())
                    .with_meta("memory_reason", lookup.decision.reason.as_str());
                if let Some(tokens) = generation.tokens_used {
                    response = response.with_meta("tokens_used", tokens);
                }
                (decision, response)
            }
            Err(e) => {
                warn!(client = client.name(), error = %e, kind = e.kind(), "Generative route failed, falling back");
                self.events.publish(DomainEvent::GenerativeFailed {
                    error_kind: e.kind().to_string(),
                    timestamp: Utc::now(),
                });
                let (decision, response) =
                    self.respond_fallback(text, matched, FallbackReason::from(&e));
                (decision, response.with_meta("error_kind", e.kind()))
            }
        }
    }

    /// Persist a successful exchange to memory and, when eligible, the cache.
    /// Failures are logged and never affect the response.
    async fn remember(
        &self,
        session: &SessionId,
        text: &str,
        reply: &str,
        classification: DomainClassification,
    ) {
        match self.memory.save(session, text, reply, classification).await {
            Ok(()) => self.events.publish(DomainEvent::MemorySaved {
                session_id: session.to_string(),
                domain: classification.domain.to_string(),
                timestamp: Utc::now(),
            }),
            Err(e) => warn!(session = %session, error = %e, "Could not save exchange to memory"),
        }
        let verdict = self.cache.store(text, reply, classification.domain);
        debug!(verdict = verdict.as_str(), "Cache policy applied");
    }

    fn finish(
        &self,
        utterance: &Utterance,
        session: &SessionId,
        decision: RouteDecision,
        response: RouteResponse,
        started: Instant,
    ) -> RouteResponse {
        let latency_ms = started.elapsed().as_millis() as u64;

        info!(
            session = %session,
            route = %decision.route,
            reason = %decision.reason,
            latency_ms,
            success = response.success,
            "Utterance routed"
        );

        self.decisions.record(
            DecisionRecord::new(
                session.as_str(),
                utterance.char_len(),
                decision.route,
                decision.reason.clone(),
            )
            .with_intent(decision.classic_intent)
            .with_latency(latency_ms)
            .with_success(response.success),
        );
        self.events.publish(DomainEvent::UtteranceRouted {
            session_id: session.to_string(),
            route: decision.route,
            reason: decision.reason.clone(),
            latency_ms,
            timestamp: Utc::now(),
        });

        response
            .with_meta("reason", decision.reason)
            .with_meta("latency_ms", latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DomainClassifier;
    use crate::conversation::MemorySettings;
    use crate::preferences::StaticPreferences;
    use vesta_memory::InMemoryBackend;

    fn router(generative: Option<Arc<dyn GenerativeClient>>) -> DecisionRouter {
        let memory = Arc::new(ConversationMemory::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(DomainClassifier::new()),
            MemorySettings::default(),
        ));
        DecisionRouter::new(
            memory,
            generative,
            Arc::new(StaticPreferences::default()),
        )
    }

    #[tokio::test]
    async fn blank_input_asks_to_repeat() {
        let r = router(None);
        let resp = r.route("   ", &SessionId::from("s")).await;
        assert!(!resp.success);
        assert_eq!(resp.route, Route::SmartFallback);
        assert_eq!(resp.response_text, REPEAT_REQUEST);
        assert_eq!(r.decisions().len(), 1);
    }

    #[tokio::test]
    async fn instant_hit() {
        let r = router(None);
        let resp = r.route("¡Hola!", &SessionId::from("s")).await;
        assert_eq!(resp.route, Route::InstantCache);
        assert_eq!(resp.metadata["confidence"], 1.0);
        assert_eq!(resp.meta_str("reason"), Some("instant_hit"));
    }

    #[tokio::test]
    async fn block_listed_intent_stays_classic_even_below_threshold() {
        let settings = RouterSettings {
            confidence_threshold: 0.99,
            ..RouterSettings::default()
        };
        let r = router(None).with_settings(settings);
        let resp = r.route("enciende el enchufe", &SessionId::from("s")).await;
        assert_eq!(resp.route, Route::ClassicRule);
        assert_eq!(resp.meta_str("intent"), Some("PLUG_ON"));
        assert_eq!(resp.meta_str("command"), Some("enchufe"));
        assert_eq!(resp.meta_str("reason"), Some("always_classic"));
    }

    #[tokio::test]
    async fn unmatched_without_generative_is_smart_fallback() {
        let r = router(None);
        let resp = r.route("¿Cómo cuido mis plantas en invierno?", &SessionId::from("s")).await;
        assert_eq!(resp.route, Route::SmartFallback);
        assert!(resp.success);
        assert_eq!(resp.meta_str("fallback_reason"), Some("generative_unavailable"));
        assert_eq!(resp.meta_str("fallback_kind"), Some("keyword"));
    }

    #[tokio::test]
    async fn critical_keyword_without_intent_never_generates() {
        let r = router(None);
        let resp = r.route("se me acabó la medicina", &SessionId::from("s")).await;
        assert_eq!(resp.route, Route::SmartFallback);
        assert_eq!(resp.meta_str("fallback_reason"), Some("critical_keyword"));
        assert!(resp.response_text.contains("médico"));
    }

    #[tokio::test]
    async fn user_switch_keeps_previous_on_failure() {
        struct Flaky;
        #[async_trait::async_trait]
        impl PreferenceProvider for Flaky {
            fn name(&self) -> &str {
                "flaky"
            }
            async fn get_preferences(
                &self,
                user_id: Option<&str>,
            ) -> Result<UserPreferenceSnapshot, PreferenceError> {
                match user_id {
                    Some("ana") => Ok(UserPreferenceSnapshot {
                        name: "Ana".into(),
                        ..Default::default()
                    }),
                    other => Err(PreferenceError::NotFound(other.unwrap_or("").into())),
                }
            }
        }

        let memory = Arc::new(ConversationMemory::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(DomainClassifier::new()),
            MemorySettings::default(),
        ));
        let r = DecisionRouter::new(memory, None, Arc::new(Flaky));
        let mut events = r.events().subscribe();

        let before = r.preferences();
        assert_eq!(r.on_user_switch("ana").await.unwrap().name, "Ana");
        assert_eq!(before.name, "Usuario");
        assert!(r.on_user_switch("pedro").await.is_err());
        assert_eq!(r.preferences().name, "Ana");

        let first = events.recv().await.unwrap();
        assert!(matches!(&*first, DomainEvent::UserSwitched { reloaded: true, .. }));
    }
}
