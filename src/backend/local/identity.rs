use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::SimulatedLatency;
use crate::auth::TokenCodec;
use crate::auth::password::{hash_password, verify_password};
use crate::backend::{IdentityBackend, SignUpProfile, validate_email};
use crate::domain::{Role, Session, UserId};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, keys, load_collection, save_collection};

/// A locally registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id; the token subject.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
    /// Given names.
    pub given_names: String,
    /// Family names.
    pub family_names: String,
    /// National id.
    #[serde(default)]
    pub national_id: String,
    /// Address.
    #[serde(default)]
    pub address: String,
    /// Phone.
    #[serde(default)]
    pub phone: String,
    /// Role.
    pub role: Role,
}

impl Account {
    fn session(&self) -> Session {
        Session {
            user_id: self.id.clone(),
            name: format!("{} {}", self.given_names, self.family_names)
                .trim()
                .to_string(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Identity fixture backed by the `accounts` storage key.
#[derive(Debug)]
pub struct LocalIdentity {
    storage: Arc<dyn KeyValueStorage>,
    codec: TokenCodec,
    token_ttl_secs: u64,
    latency: SimulatedLatency,
    write_lock: Mutex<()>,
}

impl LocalIdentity {
    /// Creates the fixture; issued tokens live for `token_ttl_secs`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        codec: TokenCodec,
        token_ttl_secs: u64,
        latency: SimulatedLatency,
    ) -> Self {
        Self {
            storage,
            codec,
            token_ttl_secs,
            latency,
            write_lock: Mutex::new(()),
        }
    }

    async fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        load_collection(self.storage.as_ref(), keys::ACCOUNTS).await
    }

    fn issue(&self, account: &Account) -> Result<String, StoreError> {
        self.codec.issue(&account.session(), self.token_ttl_secs)
    }

    /// Makes sure an administrator account exists for `email`.
    ///
    /// An existing account with that email is promoted and keeps its
    /// password.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] on storage failure.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.accounts().await?;
        match accounts.iter_mut().find(|a| a.matches_email(email)) {
            Some(existing) if existing.role == Role::Admin => return Ok(()),
            Some(existing) => existing.role = Role::Admin,
            None => {
                let password_hash = hash_password(password).await?;
                accounts.push(Account {
                    id: UserId::generate(),
                    email: email.trim().to_string(),
                    password_hash,
                    given_names: "Administrator".to_string(),
                    family_names: String::new(),
                    national_id: String::new(),
                    address: String::new(),
                    phone: String::new(),
                    role: Role::Admin,
                });
            }
        }
        save_collection(self.storage.as_ref(), keys::ACCOUNTS, &accounts).await?;
        tracing::info!(email, "local administrator account ready");
        Ok(())
    }
}

#[async_trait]
impl IdentityBackend for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, StoreError> {
        self.latency.pause().await;
        let accounts = self.accounts().await?;
        let account = accounts
            .iter()
            .find(|a| a.matches_email(email))
            .ok_or(StoreError::InvalidCredentials)?;
        verify_password(password, &account.password_hash).await?;
        self.issue(account)
    }

    async fn sign_up(&self, profile: &SignUpProfile) -> Result<String, StoreError> {
        self.latency.pause().await;
        validate_email(&profile.email)?;
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.accounts().await?;
        if accounts.iter().any(|a| a.matches_email(&profile.email)) {
            return Err(StoreError::Conflict(format!(
                "an account already exists for {}",
                profile.email.trim()
            )));
        }
        let account = Account {
            id: UserId::generate(),
            email: profile.email.trim().to_string(),
            password_hash: hash_password(&profile.password).await?,
            given_names: profile.given_names.trim().to_string(),
            family_names: profile.family_names.trim().to_string(),
            national_id: profile.national_id.clone(),
            address: profile.address.clone(),
            phone: profile.phone.clone(),
            role: Role::User,
        };
        let token = self.issue(&account)?;
        accounts.push(account);
        save_collection(self.storage.as_ref(), keys::ACCOUNTS, &accounts).await?;
        Ok(token)
    }
}
