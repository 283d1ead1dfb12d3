//! HTTP backends talking to the storefront's remote services.
//!
//! All three share one [`RemoteClient`]: a `reqwest` client with the
//! configured request timeout that attaches the current credential token as
//! a bearer header.

mod catalog;
mod identity;
mod purchases;
pub mod wire;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

pub use catalog::RemoteCatalog;
pub use identity::RemoteIdentity;
pub use purchases::RemotePurchases;

use crate::auth::CredentialCell;
use crate::error::StoreError;

/// Shared HTTP client of the remote backends.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    credential: CredentialCell,
}

impl RemoteClient {
    /// Builds a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, credential: CredentialCell) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Internal(format!("cannot build http client: {e}")))?;
        Ok(Self { http, credential })
    }

    /// Starts a request, attaching the bearer token when signed in.
    pub async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.credential.get().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends `builder`, requiring a success status (or exactly `expected`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Network`] on transport failure and
    /// [`StoreError::Http`] carrying the response text on any other status.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        expected: Option<StatusCode>,
    ) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        let accepted = match expected {
            Some(expected) => status == expected,
            None => status.is_success(),
        };
        if accepted {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %text, "remote call rejected");
        Err(StoreError::Http {
            status: status.as_u16(),
            message: if text.is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                text
            },
        })
    }

    /// Sends `builder` and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// See [`RemoteClient::send`]; an undecodable body is a
    /// [`StoreError::Network`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        expected: Option<StatusCode>,
    ) -> Result<T, StoreError> {
        let response = self.send(builder, expected).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Network(format!("unexpected response body: {e}")))
    }
}

/// Joins a base URL and a path without doubling slashes.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(join("http://h/api/eventos/", "/4/"), "http://h/api/eventos/4/");
        assert_eq!(join("http://h/api/eventos", ""), "http://h/api/eventos/");
        assert_eq!(join("http://h", "auth/SignIn"), "http://h/auth/SignIn");
    }
}
