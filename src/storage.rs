use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Process-local durable key/value surface the conversation store writes to.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory storage, lost on exit. Used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key under a data directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the data directory if it does not exist yet
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // Write then rename so a crash never leaves a half-written file behind
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);

        storage.set("k", "one").await.unwrap();
        storage.set("k", "two").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn file_storage_persists_between_instances() {
        let dir = tempfile::TempDir::new().unwrap();

        let first = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(first.get("mindmate_conversations_v1").await.unwrap(), None);
        first.set("mindmate_conversations_v1", "[]").await.unwrap();

        let second = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(
            second.get("mindmate_conversations_v1").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn file_storage_sanitizes_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).await.unwrap();

        storage.set("../escape/me", "v").await.unwrap();
        assert!(storage.dir().join("___escape_me.json").exists());
        assert_eq!(storage.get("../escape/me").await.unwrap().as_deref(), Some("v"));
    }
}
