//! Preference providers.
//!
//! [`StaticPreferences`] serves one fixed snapshot. [`FilePreferences`] reads
//! a JSON profile file on every query, so edits are picked up on the next
//! user switch without a restart:
//!
//! ```json
//! {
//!   "default_user": "francisca",
//!   "users": {
//!     "francisca": { "name": "Francisca", "city": "Cuenca", "tone": "affectionate" }
//!   }
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use vesta_core::error::PreferenceError;
use vesta_core::preferences::{PreferenceProvider, UserPreferenceSnapshot};

pub struct StaticPreferences {
    snapshot: UserPreferenceSnapshot,
}

impl StaticPreferences {
    pub fn new(snapshot: UserPreferenceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl Default for StaticPreferences {
    fn default() -> Self {
        Self::new(UserPreferenceSnapshot::default())
    }
}

#[async_trait]
impl PreferenceProvider for StaticPreferences {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_preferences(
        &self,
        user_id: Option<&str>,
    ) -> Result<UserPreferenceSnapshot, PreferenceError> {
        let mut snapshot = self.snapshot.clone();
        if let Some(id) = user_id {
            snapshot.user_id = Some(id.to_string());
        }
        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    default_user: Option<String>,
    #[serde(default)]
    users: HashMap<String, UserPreferenceSnapshot>,
}

pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<ProfileFile, PreferenceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PreferenceError::Unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw).map_err(|e| PreferenceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PreferenceProvider for FilePreferences {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_preferences(
        &self,
        user_id: Option<&str>,
    ) -> Result<UserPreferenceSnapshot, PreferenceError> {
        let mut file = self.read().await?;

        let Some(id) = user_id.map(str::to_string).or(file.default_user.take()) else {
            return Ok(UserPreferenceSnapshot::default());
        };

        let mut snapshot = file
            .users
            .remove(&id)
            .ok_or_else(|| PreferenceError::NotFound(id.clone()))?;
        snapshot.user_id = Some(id);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::preferences::ToneStyle;

    const PROFILES: &str = r#"{
        "default_user": "francisca",
        "users": {
            "francisca": {"name": "Francisca", "city": "Cuenca", "tone": "affectionate",
                          "interests": {"plants": ["sábila"]}},
            "jorge": {"name": "Jorge", "tone": "formal"}
        }
    }"#;

    fn profile_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn static_provider_tags_user() {
        let p = StaticPreferences::default();
        let snap = p.get_preferences(Some("ana")).await.unwrap();
        assert_eq!(snap.user_id.as_deref(), Some("ana"));
        assert_eq!(snap.name, "Usuario");
    }

    #[tokio::test]
    async fn file_provider_default_and_named_users() {
        let (_dir, path) = profile_file(PROFILES);
        let p = FilePreferences::new(&path);

        let default = p.get_preferences(None).await.unwrap();
        assert_eq!(default.name, "Francisca");
        assert_eq!(default.tone, ToneStyle::Affectionate);
        assert_eq!(default.interests_for("plants"), "sábila");

        let jorge = p.get_preferences(Some("jorge")).await.unwrap();
        assert_eq!(jorge.user_id.as_deref(), Some("jorge"));
        assert_eq!(jorge.tone, ToneStyle::Formal);
    }

    #[tokio::test]
    async fn file_provider_errors() {
        let (_dir, path) = profile_file(PROFILES);
        let p = FilePreferences::new(&path);
        assert!(matches!(
            p.get_preferences(Some("nadie")).await,
            Err(PreferenceError::NotFound(_))
        ));

        let (_dir2, bad) = profile_file("{ not json");
        assert!(matches!(
            FilePreferences::new(&bad).get_preferences(None).await,
            Err(PreferenceError::Malformed(_))
        ));

        let missing = FilePreferences::new("/nonexistent/profiles.json");
        assert!(matches!(
            missing.get_preferences(None).await,
            Err(PreferenceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn file_without_default_user_yields_default_snapshot() {
        let (_dir, path) = profile_file(r#"{"users": {}}"#);
        let snap = FilePreferences::new(&path).get_preferences(None).await.unwrap();
        assert_eq!(snap, UserPreferenceSnapshot::default());
    }
}
