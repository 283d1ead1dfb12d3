use async_trait::async_trait;
use reqwest::Method;

use super::wire::{Envelope, SignInBody, SignUpBody, TokenData};
use super::{RemoteClient, join};
use crate::backend::{IdentityBackend, SignUpProfile};
use crate::error::StoreError;

/// Identity service client (`/auth/SignIn`, `/users`).
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    client: RemoteClient,
    base_url: String,
}

impl RemoteIdentity {
    /// Creates a client for the identity service at `base_url`.
    #[must_use]
    pub fn new(client: RemoteClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Sends an identity request and unwraps the token envelope.
    ///
    /// Failure envelopes arrive with non-2xx statuses too, so the body is
    /// read regardless of status.
    async fn token_call<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, StoreError> {
        let url = join(&self.base_url, path);
        let response = self
            .client
            .request(Method::POST, &url)
            .await
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let envelope: Envelope<TokenData> =
            serde_json::from_str(&text).map_err(|_| StoreError::Http {
                status: status.as_u16(),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("unexpected status").to_string()
                } else {
                    text.clone()
                },
            })?;
        if !status.is_success() {
            return Err(StoreError::Http {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("identity service answered {status}")),
            });
        }
        envelope.into_data(status.as_u16()).map(|data| data.token)
    }
}

#[async_trait]
impl IdentityBackend for RemoteIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, StoreError> {
        let body = SignInBody {
            email,
            contrasenia: password,
        };
        self.token_call("auth/SignIn", &body).await
    }

    async fn sign_up(&self, profile: &SignUpProfile) -> Result<String, StoreError> {
        self.token_call("users", &SignUpBody::from(profile)).await
    }
}
