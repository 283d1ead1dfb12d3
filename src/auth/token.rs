//! Credential token verification and issuing.
//!
//! Tokens are HS256 JWTs whose claims carry the session identity:
//! `sub`, `email`, `name` and `role`. Expiry is enforced when the token
//! carries an `exp` claim.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, Session, UserId};
use crate::error::StoreError;

/// Claims carried by a credential token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id.
    pub sub: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Role; tokens without one are regular users.
    #[serde(default)]
    pub role: Role,
    /// Expiry (seconds since the Unix epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issue time (seconds since the Unix epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl TokenClaims {
    /// Converts the claims into the session they describe.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session {
            user_id: UserId::new(self.sub),
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

/// Verifies and issues credential tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec for the given secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub"]);
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Verifies `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCredential`] if the token is malformed,
    /// carries a bad signature, or has expired.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, StoreError> {
        jsonwebtoken::decode::<TokenClaims>(token.trim(), &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| StoreError::InvalidCredential(e.to_string()))
    }

    /// Verifies `token` and returns the session it describes.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::decode`].
    pub fn session(&self, token: &str) -> Result<Session, StoreError> {
        self.decode(token).map(TokenClaims::into_session)
    }

    /// Issues a token for `session` valid for `ttl_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if signing fails.
    pub fn issue(&self, session: &Session, ttl_secs: u64) -> Result<String, StoreError> {
        let claims = Self::claims_for(session, ttl_secs);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| StoreError::Internal(format!("failed to sign token: {e}")))
    }

    /// Builds the claims describing `session`, stamped with the current time.
    #[must_use]
    pub fn claims_for(session: &Session, ttl_secs: u64) -> TokenClaims {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        TokenClaims {
            sub: session.user_id.to_string(),
            email: session.email.clone(),
            name: session.name.clone(),
            role: session.role,
            exp: Some(now.saturating_add(ttl_secs)),
            iat: Some(now),
        }
    }
}
