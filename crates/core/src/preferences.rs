//! User preference snapshot and the provider that supplies it.
//!
//! A snapshot is a read-only projection of an external user profile. The
//! engine holds one snapshot at a time, treats it as immutable for the
//! duration of a request, and asks the provider again when it is told the
//! active user changed.

use crate::error::PreferenceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conversational register the assistant should adopt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneStyle {
    /// Close but respectful, like a good friendship
    #[default]
    CloseRespectful,
    /// Formal and professional
    Formal,
    /// Familiar and affectionate
    Affectionate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferenceSnapshot {
    /// Profile identifier (None for the anonymous default profile)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// How the assistant addresses the user
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub tone: ToneStyle,

    /// Topics the user enjoys, keyed by domain name (e.g. "plants" → ["sábila"])
    #[serde(default)]
    pub interests: BTreeMap<String, Vec<String>>,

    /// BCP-47 style locale tag
    #[serde(default = "default_locale")]
    pub locale: String,

    /// What the surrounding device can do ("control de enchufes", ...)
    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default = "default_true")]
    pub short_answers: bool,

    #[serde(default)]
    pub use_emojis: bool,

    #[serde(default = "default_true")]
    pub personal_references: bool,

    /// Device actions must be confirmed before execution
    #[serde(default = "default_true")]
    pub confirm_actions: bool,
}

fn default_name() -> String {
    "Usuario".into()
}
fn default_locale() -> String {
    "es-EC".into()
}
fn default_true() -> bool {
    true
}

impl Default for UserPreferenceSnapshot {
    fn default() -> Self {
        Self {
            user_id: None,
            name: default_name(),
            tone: ToneStyle::default(),
            interests: BTreeMap::new(),
            locale: default_locale(),
            capabilities: Vec::new(),
            city: None,
            age: None,
            short_answers: true,
            use_emojis: false,
            personal_references: true,
            confirm_actions: true,
        }
    }
}

impl UserPreferenceSnapshot {
    /// Interests recorded for one domain, joined for prompt templates.
    pub fn interests_for(&self, key: &str) -> String {
        self.interests
            .get(key)
            .map(|items| items.join(", "))
            .unwrap_or_default()
    }
}

/// Source of user profiles.
#[async_trait]
pub trait PreferenceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the profile for `user_id`, or the default profile when `None`.
    async fn get_preferences(
        &self,
        user_id: Option<&str>,
    ) -> std::result::Result<UserPreferenceSnapshot, PreferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_profile_fills_defaults() {
        let snap: UserPreferenceSnapshot =
            serde_json::from_str(r#"{"name": "Francisca", "tone": "affectionate"}"#).unwrap();
        assert_eq!(snap.name, "Francisca");
        assert_eq!(snap.tone, ToneStyle::Affectionate);
        assert!(snap.short_answers);
        assert!(!snap.use_emojis);
        assert_eq!(snap.locale, "es-EC");
    }

    #[test]
    fn interests_for_joins_values() {
        let mut snap = UserPreferenceSnapshot::default();
        snap.interests
            .insert("plants".into(), vec!["sábila".into(), "orégano".into()]);
        assert_eq!(snap.interests_for("plants"), "sábila, orégano");
        assert_eq!(snap.interests_for("pets"), "");
    }
}
