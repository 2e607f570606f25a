//! Domain event system — decoupled notification of routing activity.
//!
//! The router publishes events as it works; the gateway and diagnostics can
//! subscribe without the router knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::route::Route;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// An utterance received its response
    UtteranceRouted {
        session_id: String,
        route: Route,
        reason: String,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A generative exchange was appended to conversation memory
    MemorySaved {
        session_id: String,
        domain: String,
        timestamp: DateTime<Utc>,
    },

    /// The generative branch failed and fell back
    GenerativeFailed {
        error_kind: String,
        timestamp: DateTime<Utc>,
    },

    /// The active user changed and preferences were reloaded
    UserSwitched {
        user_id: String,
        reloaded: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::UtteranceRouted {
            session_id: "s1".into(),
            route: Route::InstantCache,
            reason: "instant_hit".into(),
            latency_ms: 0,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::UtteranceRouted { route, reason, .. } => {
                assert_eq!(*route, Route::InstantCache);
                assert_eq!(reason, "instant_hit");
            }
            _ => panic!("Expected UtteranceRouted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::GenerativeFailed {
            error_kind: "timeout".into(),
            timestamp: Utc::now(),
        });
    }
}
