//! Session store: the signed-in identity and its persisted token.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{StatusSnapshot, StoreStatus};
use crate::auth::{CredentialCell, TokenCodec};
use crate::backend::{IdentityBackend, SignUpProfile, validate_email};
use crate::domain::{EventBus, Session, StoreEvent};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, keys};

/// Holds the current session.
///
/// The credential token is persisted under [`keys::AUTH_TOKEN`] and mirrored
/// into the [`CredentialCell`] read by the remote backends. The session
/// itself is always derived from a verified token.
#[derive(Debug)]
pub struct SessionStore {
    identity: Arc<dyn IdentityBackend>,
    storage: Arc<dyn KeyValueStorage>,
    codec: TokenCodec,
    credential: CredentialCell,
    current: RwLock<Option<Session>>,
    event_bus: EventBus,
    status: StoreStatus,
}

impl SessionStore {
    /// Creates a signed-out store.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityBackend>,
        storage: Arc<dyn KeyValueStorage>,
        codec: TokenCodec,
        credential: CredentialCell,
        event_bus: EventBus,
    ) -> Self {
        Self {
            identity,
            storage,
            codec,
            credential,
            current: RwLock::new(None),
            event_bus,
            status: StoreStatus::default(),
        }
    }

    /// Restores the session from the persisted token.
    ///
    /// A token that fails verification is removed and the store stays
    /// signed out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if storage cannot be read.
    pub async fn restore(&self) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.storage.get_item(keys::AUTH_TOKEN).await? else {
            return Ok(None);
        };
        match self.codec.session(&token) {
            Ok(session) => {
                self.credential.set(Some(token)).await;
                *self.current.write().await = Some(session.clone());
                tracing::info!(user_id = %session.user_id, role = ?session.role, "session restored");
                Ok(Some(session))
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding stored credential token");
                self.storage.remove_item(keys::AUTH_TOKEN).await?;
                Ok(None)
            }
        }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a malformed email, the
    /// backend's error for rejected credentials, or
    /// [`StoreError::InvalidCredential`] if the returned token does not
    /// verify. No token is persisted on failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        self.status
            .track("sign in", async {
                validate_email(email)?;
                let token = self.identity.sign_in(email.trim(), password).await?;
                self.adopt(token).await
            })
            .await
    }

    /// Registers an account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an incomplete profile and the
    /// backend's error otherwise.
    pub async fn sign_up(&self, profile: &SignUpProfile) -> Result<Session, StoreError> {
        self.status
            .track("sign up", async {
                profile.validate()?;
                let token = self.identity.sign_up(profile).await?;
                self.adopt(token).await
            })
            .await
    }

    /// Clears the persisted token and the session.
    ///
    /// Returns `false` if nobody was signed in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the token cannot be removed.
    pub async fn sign_out(&self) -> Result<bool, StoreError> {
        self.status
            .track("sign out", async {
                self.storage.remove_item(keys::AUTH_TOKEN).await?;
                self.credential.set(None).await;
                let previous = self.current.write().await.take();
                let Some(previous) = previous else {
                    return Ok(false);
                };
                let _ = self.event_bus.publish(StoreEvent::SessionEnded {
                    user_id: previous.user_id.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(user_id = %previous.user_id, "signed out");
                Ok(true)
            })
            .await
    }

    /// Verifies `token`, then persists it and makes it the current session.
    async fn adopt(&self, token: String) -> Result<Session, StoreError> {
        let session = self.codec.session(&token)?;
        self.storage
            .set_item(keys::AUTH_TOKEN, token.clone())
            .await?;
        self.credential.set(Some(token)).await;
        *self.current.write().await = Some(session.clone());

        let _ = self.event_bus.publish(StoreEvent::SessionStarted {
            user_id: session.user_id.clone(),
            role: session.role,
            timestamp: Utc::now(),
        });
        tracing::info!(user_id = %session.user_id, role = ?session.role, "signed in");
        Ok(session)
    }

    /// The current session, if signed in.
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// The current credential token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.credential.get().await
    }

    /// Returns the session, or an error naming what `action` requires.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unauthenticated`] when signed out.
    pub async fn require_session(&self, action: &'static str) -> Result<Session, StoreError> {
        self.current()
            .await
            .ok_or(StoreError::Unauthenticated(action))
    }

    /// Returns the session of a signed-in administrator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unauthenticated`] when signed out and
    /// [`StoreError::Forbidden`] for non-admin sessions.
    pub async fn require_admin(&self) -> Result<Session, StoreError> {
        let session = self.require_session("manage events").await?;
        if !session.is_admin() {
            return Err(StoreError::Forbidden(
                "administrator role required".to_string(),
            ));
        }
        Ok(session)
    }

    /// Loading flag and last error.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }
}
