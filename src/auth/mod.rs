//! Credential handling: token codec, password hashing and the shared
//! credential cell.

pub mod password;
pub mod token;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use token::{TokenClaims, TokenCodec};

/// The credential token of the current session.
///
/// Written by the session store on sign-in/sign-out and read by the remote
/// backends to attach `Authorization: Bearer` headers. Cloning shares the
/// same cell.
#[derive(Debug, Clone, Default)]
pub struct CredentialCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl CredentialCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current token, if any.
    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    /// Replaces the current token.
    pub async fn set(&self, token: Option<String>) {
        *self.inner.write().await = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_token() {
        let cell = CredentialCell::new();
        let reader = cell.clone();
        assert!(reader.get().await.is_none());
        cell.set(Some("abc".to_string())).await;
        assert_eq!(reader.get().await.as_deref(), Some("abc"));
        cell.set(None).await;
        assert!(reader.get().await.is_none());
    }
}
