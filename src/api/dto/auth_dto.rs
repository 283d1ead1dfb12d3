//! Sign-in and session DTOs.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Session;

/// Request body for `POST /api/v1/auth/sign-in`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Current authentication state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Whether a session is active.
    pub authenticated: bool,
    /// The active session.
    pub session: Option<Session>,
}

impl From<Option<Session>> for SessionResponse {
    fn from(session: Option<Session>) -> Self {
        Self {
            authenticated: session.is_some(),
            session,
        }
    }
}
