//! Conversation store implementations for Vesta.

pub mod in_memory;
pub mod noop;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryBackend;
pub use noop::NoopMemory;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

use std::path::Path;
use std::sync::Arc;
use vesta_core::error::MemoryError;
use vesta_core::memory::MemoryStore;

/// Open the store named by `backend` ("sqlite", "in_memory" or "none").
pub async fn open_store(
    backend: &str,
    path: &Path,
) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    match backend {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MemoryError::Unavailable(format!("{}: {e}", parent.display()))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteBackend::new(&url).await?))
        }
        "in_memory" => Ok(Arc::new(InMemoryBackend::new())),
        "none" => Ok(Arc::new(NoopMemory)),
        other => Err(MemoryError::Unavailable(format!(
            "unknown memory backend '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_named_backends() {
        let tmp = Path::new("/nonexistent/unused.db");
        assert_eq!(open_store("in_memory", tmp).await.unwrap().name(), "in_memory");
        assert_eq!(open_store("none", tmp).await.unwrap().name(), "none");
        assert!(open_store("redis", tmp).await.is_err());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn open_sqlite_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.db");
        let store = open_store("sqlite", &path).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(path.exists());
    }
}
