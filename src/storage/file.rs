//! JSON-file storage surviving restarts.
//!
//! The whole key/value map lives in one JSON object on disk. Every write
//! rewrites the file through a temporary sibling and an atomic rename.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::KeyValueStorage;
use crate::error::StoreError;

/// [`KeyValueStorage`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage file, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the file cannot be read or is not
    /// a JSON object of strings.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let items = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                StoreError::Storage(format!("unreadable storage file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        tracing::debug!(path = %path.display(), keys = items.len(), "opened file storage");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(items)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Storage(format!("cannot create {}: {e}", parent.display())))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Storage(format!("cannot replace {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut items = self.items.lock().await;
        let mut next = items.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().await;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let items = self.items.lock().await;
        self.persist(&items).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir should be available");
        };
        let path = dir.path().join("nested").join("storage.json");

        let Ok(storage) = FileStorage::open(&path).await else {
            panic!("missing file should open empty");
        };
        let Ok(()) = storage.set_item("auth_token", "abc".to_string()).await else {
            panic!("write should succeed");
        };
        let Ok(()) = storage.set_item("events", "[]".to_string()).await else {
            panic!("write should succeed");
        };
        let _ = storage.remove_item("events").await;
        drop(storage);

        let Ok(reopened) = FileStorage::open(&path).await else {
            panic!("existing file should reopen");
        };
        assert_eq!(
            reopened.get_item("auth_token").await.unwrap_or_default().as_deref(),
            Some("abc")
        );
        assert!(reopened.get_item("events").await.unwrap_or_default().is_none());
    }

    #[tokio::test]
    async fn failed_write_leaves_previous_value() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir should be available");
        };
        let path = dir.path().join("storage.json");
        let Ok(storage) = FileStorage::open(&path).await else {
            panic!("missing file should open empty");
        };
        let Ok(()) = storage.set_item("auth_token", "abc".to_string()).await else {
            panic!("write should succeed");
        };

        // A directory where the temporary file goes makes the write fail.
        let Ok(()) = tokio::fs::create_dir(path.with_extension("tmp")).await else {
            panic!("blocking directory should be created");
        };
        assert!(storage.set_item("auth_token", "xyz".to_string()).await.is_err());
        assert_eq!(
            storage.get_item("auth_token").await.unwrap_or_default().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir should be available");
        };
        let path = dir.path().join("storage.json");
        let _ = tokio::fs::write(&path, "[1,2,3]").await;
        assert!(matches!(
            FileStorage::open(&path).await,
            Err(StoreError::Storage(_))
        ));
    }
}
