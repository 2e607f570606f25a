//! Utterance and session identity.
//!
//! An utterance is one unit of user input for a single turn. It is produced
//! by a front-end (voice transcription, text command) and consumed once by the
//! decision router.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a conversational session.
///
/// Scoped to a process or front-end session, never to a user identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single immutable unit of user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Raw text as delivered by the front-end
    pub text: String,

    /// When the front-end received it
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// True when there is nothing to route (empty or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Short prefix for debug logging.
    pub fn preview(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_utterances_are_detected() {
        assert!(Utterance::new("   ").is_blank());
        assert!(Utterance::new("").is_blank());
        assert!(!Utterance::new("hola").is_blank());
    }

    #[test]
    fn char_len_counts_accented_letters_once() {
        let u = Utterance::new("¿qué día es?");
        assert_eq!(u.char_len(), 12);
        assert_eq!(u.preview(4), "¿qué");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(SessionId::from("kitchen").to_string(), "kitchen");
    }
}
