//! Assemble a [`DecisionRouter`] from configuration.

use crate::cache::ResponseCache;
use crate::classifier::DomainClassifier;
use crate::conversation::{ConversationMemory, MemorySettings};
use crate::preferences::{FilePreferences, StaticPreferences};
use crate::prompt::PromptBuilder;
use crate::router::{DecisionRouter, RouterSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vesta_config::AppConfig;
use vesta_core::memory::MemoryStore;
use vesta_core::preferences::PreferenceProvider;
use vesta_memory::NoopMemory;
use vesta_telemetry::DecisionLog;

/// Build the router described by `config`.
///
/// Degrades instead of failing: a memory store that cannot be opened is
/// replaced by a no-op store, and an unreadable profile leaves the default
/// preferences in place.
pub async fn build_router(config: &AppConfig) -> DecisionRouter {
    let store: Arc<dyn MemoryStore> =
        match vesta_memory::open_store(&config.memory.backend, &config.memory.path).await {
            Ok(store) => store,
            Err(e) => {
                warn!(backend = %config.memory.backend, error = %e, "Memory store unavailable, continuing without memory");
                Arc::new(NoopMemory)
            }
        };

    let memory = Arc::new(ConversationMemory::new(
        store,
        Arc::new(DomainClassifier::new()),
        MemorySettings::from(&config.memory),
    ));

    let provider: Arc<dyn PreferenceProvider> = match &config.preferences.path {
        Some(path) => Arc::new(FilePreferences::new(path)),
        None => Arc::new(StaticPreferences::default()),
    };

    let generative = vesta_providers::build_from_config(config);
    let settings = RouterSettings::from(&config.routing)
        .with_timeout(Duration::from_millis(config.generative.timeout_ms));

    let router = DecisionRouter::new(memory, generative, provider)
        .with_settings(settings)
        .with_cache(Arc::new(ResponseCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        )))
        .with_prompt_builder(PromptBuilder::new(
            &config.assistant.name,
            config.assistant.max_words,
        ))
        .with_decision_log(Arc::new(DecisionLog::new(config.telemetry.max_decisions)));

    let loaded = match &config.preferences.default_user {
        Some(user) => router.on_user_switch(user).await.map(|_| ()),
        None => router.load_default_preferences().await,
    };
    if let Err(e) = loaded {
        warn!(error = %e, "Could not load user preferences, using defaults");
    }

    info!(
        memory = router.memory().backend(),
        generative = router.generative_enabled(),
        threshold = router.settings().confidence_threshold,
        "Decision router ready"
    );
    router
}
