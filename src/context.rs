//! Storefront context: owns every store for the lifetime of the process.
//!
//! Created once by [`StorefrontContext::start`] and flushed by
//! [`StorefrontContext::shutdown`]. Handlers reach it through
//! [`crate::app_state::AppState`].

use std::sync::Arc;

use crate::auth::{CredentialCell, TokenCodec};
use crate::backend::Backends;
use crate::config::StorefrontConfig;
use crate::domain::EventBus;
use crate::error::StoreError;
use crate::service::{CatalogStore, NotificationStore, OrderStore, SessionStore};
use crate::storage::{self, KeyValueStorage};

/// The four stores plus the storage and event bus they share.
#[derive(Debug)]
pub struct StorefrontContext {
    /// Current identity.
    pub session: Arc<SessionStore>,
    /// Event catalog.
    pub catalog: Arc<CatalogStore>,
    /// Purchases.
    pub orders: Arc<OrderStore>,
    /// Notifications.
    pub notifications: Arc<NotificationStore>,
    /// Broadcast channel every store publishes to.
    pub event_bus: EventBus,
    storage: Arc<dyn KeyValueStorage>,
}

impl StorefrontContext {
    /// Opens storage, builds the configured backends and loads every store.
    ///
    /// A catalog that cannot be loaded is logged and left empty; the other
    /// stores read local storage only and fail the start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] for unreadable storage and
    /// [`StoreError::Network`] if the HTTP client cannot be built.
    pub async fn start(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let storage = storage::open(config.storage_path.as_deref()).await?;
        let codec = TokenCodec::new(&config.token_secret);
        let credential = CredentialCell::new();
        let backends =
            Backends::build(config, Arc::clone(&storage), codec.clone(), credential.clone())
                .await?;
        let context = Self::assemble(
            backends,
            storage,
            codec,
            credential,
            EventBus::new(config.event_bus_capacity),
        );

        if let Some(session) = context.session.restore().await? {
            tracing::info!(user_id = %session.user_id, "resuming session");
        }
        if let Err(err) = context.catalog.load().await {
            tracing::warn!(error = %err, "catalog unavailable at startup");
        }
        let purchases = context.orders.load().await?;
        let notifications = context.notifications.load().await?;
        tracing::info!(
            backend = %config.backend_mode,
            purchases,
            notifications,
            "storefront started"
        );
        Ok(context)
    }

    /// Wires the stores over already-built backends without loading them.
    #[must_use]
    pub fn assemble(
        backends: Backends,
        storage: Arc<dyn KeyValueStorage>,
        codec: TokenCodec,
        credential: CredentialCell,
        event_bus: EventBus,
    ) -> Self {
        let session = Arc::new(SessionStore::new(
            backends.identity,
            Arc::clone(&storage),
            codec,
            credential,
            event_bus.clone(),
        ));
        let catalog = Arc::new(CatalogStore::new(backends.catalog, event_bus.clone()));
        let notifications = Arc::new(NotificationStore::new(
            Arc::clone(&storage),
            event_bus.clone(),
        ));
        let orders = Arc::new(OrderStore::new(
            backends.purchases,
            Arc::clone(&storage),
            Arc::clone(&session),
            Arc::clone(&catalog),
            Arc::clone(&notifications),
            event_bus.clone(),
        ));
        Self {
            session,
            catalog,
            orders,
            notifications,
            event_bus,
            storage,
        }
    }

    /// Flushes storage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the final write fails.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.storage.flush().await?;
        tracing::info!("storefront stopped");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::BackendMode;

    fn local_config(path: Option<std::path::PathBuf>) -> StorefrontConfig {
        StorefrontConfig {
            backend_mode: BackendMode::Local,
            storage_path: path,
            ..StorefrontConfig::default()
        }
    }

    #[tokio::test]
    async fn start_seeds_and_loads_local_catalog() {
        let Ok(context) = StorefrontContext::start(&local_config(None)).await else {
            panic!("local start should succeed");
        };
        assert_eq!(context.catalog.list().await.len(), 3);
        assert!(context.session.current().await.is_none());
        assert!(context.orders.all().await.is_empty());
        assert!(context.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn session_survives_restart_on_file_storage() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir");
        };
        let config = local_config(Some(dir.path().join("store.json")));
        let profile = crate::backend::SignUpProfile {
            given_names: "Lea".to_string(),
            family_names: "Mamani".to_string(),
            national_id: String::new(),
            address: String::new(),
            phone: String::new(),
            email: "lea@example.com".to_string(),
            password: "secret1".to_string(),
        };

        let Ok(first) = StorefrontContext::start(&config).await else {
            panic!("first start should succeed");
        };
        let Ok(session) = first.session.sign_up(&profile).await else {
            panic!("sign-up should succeed");
        };
        assert!(first.shutdown().await.is_ok());

        let Ok(second) = StorefrontContext::start(&config).await else {
            panic!("second start should succeed");
        };
        assert_eq!(second.session.current().await, Some(session));
    }
}
