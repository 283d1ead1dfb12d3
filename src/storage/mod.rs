//! Local key/value storage.
//!
//! Mirrors browser local storage: string keys mapping to string values.
//! Collections are stored as one JSON array per key and rewritten wholesale
//! on every mutation.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StoreError;

/// Storage keys used by the stores and local backends.
pub mod keys {
    /// Credential token of the current session.
    pub const AUTH_TOKEN: &str = "auth_token";
    /// Event catalog (local backend).
    pub const EVENTS: &str = "events";
    /// Purchases.
    pub const PURCHASES: &str = "purchases";
    /// Notifications.
    pub const NOTIFICATIONS: &str = "notifications";
    /// Accounts of the local identity backend.
    pub const ACCOUNTS: &str = "accounts";
}

/// String key/value storage.
#[async_trait]
pub trait KeyValueStorage: Debug + Send + Sync {
    /// Returns the value stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Makes all writes durable.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Opens file storage at `path`, or in-memory storage when `path` is `None`.
///
/// # Errors
///
/// Returns [`StoreError::Storage`] if the file exists but cannot be read or
/// parsed.
pub async fn open(path: Option<&Path>) -> Result<Arc<dyn KeyValueStorage>, StoreError> {
    match path {
        Some(path) => Ok(Arc::new(FileStorage::open(path).await?)),
        None => Ok(Arc::new(MemoryStorage::new())),
    }
}

/// Loads the JSON array stored under `key`; a missing key is an empty list.
///
/// # Errors
///
/// Returns [`StoreError::Storage`] if the stored value is not a valid array
/// of `T`.
pub async fn load_collection<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    match storage.get_item(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Storage(format!("corrupt `{key}` collection: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Serializes `items` and stores them under `key`.
///
/// # Errors
///
/// Returns [`StoreError::Storage`] on serialization or write failure.
pub async fn save_collection<T: Serialize + Sync>(
    storage: &dyn KeyValueStorage,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(items)?;
    storage.set_item(key, raw).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::local::sample_events;
    use crate::domain::{Event, EventId, Purchase, PurchaseId, UserId};
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn missing_collection_loads_empty() {
        let storage = MemoryStorage::new();
        let Ok(items) = load_collection::<Purchase>(&storage, keys::PURCHASES).await else {
            panic!("missing key should load as empty");
        };
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn saved_collection_reloads_identically() {
        let storage = MemoryStorage::new();
        let purchases = vec![
            Purchase::pending(
                PurchaseId::new("a"),
                UserId::new("u"),
                EventId::new("1"),
                "Tech Conference".to_string(),
                1,
                Decimal::new(14999, 2),
            ),
            Purchase::pending(
                PurchaseId::new("b"),
                UserId::new("u"),
                EventId::new("2"),
                "Comedy Night".to_string(),
                3,
                Decimal::new(10500, 2),
            ),
        ];
        let Ok(()) = save_collection(&storage, keys::PURCHASES, &purchases).await else {
            panic!("save should succeed");
        };
        let Ok(reloaded) = load_collection::<Purchase>(&storage, keys::PURCHASES).await else {
            panic!("load should succeed");
        };
        assert_eq!(reloaded, purchases);
    }

    #[tokio::test]
    async fn saved_events_reload_identically() {
        let storage = MemoryStorage::new();
        let mut events = sample_events();
        events.push(Event {
            id: EventId::new("4"),
            name: "Late Set".to_string(),
            date: Utc::now(),
            location: "Rooftop".to_string(),
            description: "Sub-second start".to_string(),
            image_url: String::new(),
            capacity: 40,
            ticket_price: Decimal::new(19_995, 3),
            tickets_sold: 7,
        });
        let Ok(()) = save_collection(&storage, keys::EVENTS, &events).await else {
            panic!("save should succeed");
        };
        let Ok(reloaded) = load_collection::<Event>(&storage, keys::EVENTS).await else {
            panic!("load should succeed");
        };
        assert_eq!(reloaded, events);
    }

    #[tokio::test]
    async fn corrupt_collection_is_a_storage_error() {
        let storage = MemoryStorage::new();
        let _ = storage.set_item(keys::EVENTS, "{nope".to_string()).await;
        let result = load_collection::<Purchase>(&storage, keys::EVENTS).await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
    }
}
