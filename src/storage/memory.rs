//! In-memory storage, lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStorage;
use crate::error::StoreError;

/// Process-local [`KeyValueStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        tokio_test::block_on(async {
            let storage = MemoryStorage::new();
            assert!(storage.get_item("k").await.unwrap_or_default().is_none());
            let _ = storage.set_item("k", "v".to_string()).await;
            assert_eq!(
                storage.get_item("k").await.unwrap_or_default().as_deref(),
                Some("v")
            );
            let _ = storage.remove_item("k").await;
            let _ = storage.remove_item("k").await;
            assert!(storage.get_item("k").await.unwrap_or_default().is_none());
        });
    }
}
