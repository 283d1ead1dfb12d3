//! Backend seam between the stores and their data source.
//!
//! Each concern (identity, catalog, purchases) is a trait with two
//! implementations: [`remote`] calls the storefront's HTTP services and
//! [`local`] simulates them against [`crate::storage`]. [`Backends::build`]
//! picks one set according to [`BackendMode`].

pub mod local;
pub mod remote;

use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{CredentialCell, TokenCodec};
use crate::config::{BackendMode, StorefrontConfig};
use crate::domain::{Event, EventId, EventPatch, NewEvent, PurchaseId, UserId};
use crate::error::StoreError;
use crate::storage::KeyValueStorage;

/// Registration form of a new account.
#[derive(Clone, Deserialize, ToSchema)]
pub struct SignUpProfile {
    /// Given names.
    pub given_names: String,
    /// Family names.
    pub family_names: String,
    /// National identity document number.
    #[serde(default)]
    pub national_id: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Email address, used to sign in.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl fmt::Debug for SignUpProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpProfile")
            .field("given_names", &self.given_names)
            .field("family_names", &self.family_names)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl SignUpProfile {
    /// Display name built from given and family names.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_names.trim(), self.family_names.trim())
            .trim()
            .to_string()
    }

    /// Checks the required registration fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank names, a malformed
    /// email or a password shorter than 6 characters.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.given_names.trim().is_empty() || self.family_names.trim().is_empty() {
            return Err(StoreError::Validation("name is required".to_string()));
        }
        validate_email(&self.email)?;
        if self.password.chars().count() < 6 {
            return Err(StoreError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects an email without a local part and a domain.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for a malformed email.
pub fn validate_email(email: &str) -> Result<(), StoreError> {
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(StoreError::Validation(format!("invalid email: {email}"))),
    }
}

/// Result of creating a purchase on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Identifier assigned by the backend.
    pub id: PurchaseId,
    /// Creation time reported by the backend, if any.
    pub purchase_date: Option<DateTime<Utc>>,
}

/// Result of paying a purchase on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Payment reference.
    pub payment_id: String,
}

/// Authenticates users and returns credential tokens.
#[async_trait]
pub trait IdentityBackend: Debug + Send + Sync {
    /// Exchanges email and password for a credential token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, StoreError>;

    /// Registers an account with role `user` and returns its token.
    async fn sign_up(&self, profile: &SignUpProfile) -> Result<String, StoreError>;
}

/// Source of truth for catalog events.
#[async_trait]
pub trait CatalogBackend: Debug + Send + Sync {
    /// Lists every event.
    async fn list(&self) -> Result<Vec<Event>, StoreError>;

    /// Fetches one event.
    async fn get(&self, id: &EventId) -> Result<Event, StoreError>;

    /// Creates an event and returns it with its assigned id.
    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError>;

    /// Applies a partial update and returns the updated event.
    async fn update(&self, id: &EventId, patch: &EventPatch) -> Result<Event, StoreError>;

    /// Deletes an event.
    async fn delete(&self, id: &EventId) -> Result<(), StoreError>;

    /// Consumes `quantity` tickets from the backend's current record of the
    /// event and returns the updated event.
    async fn record_sale(&self, id: &EventId, quantity: u32) -> Result<Event, StoreError>;
}

/// Creates and pays purchases.
#[async_trait]
pub trait PurchaseBackend: Debug + Send + Sync {
    /// Registers a purchase of `quantity` tickets for `user`.
    async fn create(
        &self,
        user: &UserId,
        event_id: &EventId,
        quantity: u32,
    ) -> Result<PurchaseReceipt, StoreError>;

    /// Pays a previously created purchase.
    async fn pay(&self, purchase_id: &PurchaseId) -> Result<PaymentReceipt, StoreError>;
}

/// The backend set used by the stores.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Identity backend.
    pub identity: Arc<dyn IdentityBackend>,
    /// Catalog backend.
    pub catalog: Arc<dyn CatalogBackend>,
    /// Purchases backend.
    pub purchases: Arc<dyn PurchaseBackend>,
}

impl Backends {
    /// Builds the backends selected by `config.backend_mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, or if the local
    /// backends fail to read or seed storage.
    pub async fn build(
        config: &StorefrontConfig,
        storage: Arc<dyn KeyValueStorage>,
        codec: TokenCodec,
        credential: CredentialCell,
    ) -> Result<Self, StoreError> {
        match config.backend_mode {
            BackendMode::Remote => {
                let client = remote::RemoteClient::new(
                    Duration::from_secs(config.request_timeout_secs),
                    credential,
                )?;
                Ok(Self {
                    identity: Arc::new(remote::RemoteIdentity::new(
                        client.clone(),
                        &config.identity_api_url,
                    )),
                    catalog: Arc::new(remote::RemoteCatalog::new(
                        client.clone(),
                        &config.events_api_url,
                    )),
                    purchases: Arc::new(remote::RemotePurchases::new(
                        client,
                        &config.purchases_api_url,
                    )),
                })
            }
            BackendMode::Local => {
                let latency = local::SimulatedLatency::from_millis(config.simulated_latency_ms);
                let identity = local::LocalIdentity::new(
                    Arc::clone(&storage),
                    codec,
                    config.token_ttl_secs,
                    latency,
                );
                if let (Some(email), Some(password)) =
                    (&config.local_admin_email, &config.local_admin_password)
                {
                    use secrecy::ExposeSecret;
                    identity
                        .ensure_admin(email, password.expose_secret())
                        .await?;
                }
                let catalog = local::LocalCatalog::new(Arc::clone(&storage), latency);
                if config.seed_sample_events {
                    catalog.seed_if_absent().await?;
                }
                Ok(Self {
                    identity: Arc::new(identity),
                    catalog: Arc::new(catalog),
                    purchases: Arc::new(local::LocalPurchases::new(latency)),
                })
            }
        }
    }
}
