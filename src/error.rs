//! Storefront error types with HTTP status code mapping.
//!
//! [`StoreError`] is the single error type of the crate. Every store catches
//! failures at its boundary, records the message as its last error and
//! returns the error value to the caller; the HTTP layer maps each variant
//! to a status code and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "not enough tickets available: requested 3, available 1"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the code ranges on [`StoreError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error enum shared by every store, backend and handler.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                   |
/// |-----------|----------------------|-------------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request               |
/// | 2000–2999 | Identity / Not Found | 401 / 403 / 404 / 409         |
/// | 3000–3999 | Transport / Storage  | 500 / 502                     |
/// | 4000–4999 | Domain rules         | 409 Conflict / 422            |
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Request or form validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The requested entity does not exist locally or remotely.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (`event`, `purchase`, `notification`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The event does not have enough remaining capacity.
    #[error("not enough tickets available: requested {requested}, available {available}")]
    InsufficientCapacity {
        /// Quantity asked for.
        requested: u32,
        /// Quantity still purchasable.
        available: u32,
    },

    /// A credential token could not be verified or decoded.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Email/password combination rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with the same email already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation requires a signed-in session.
    #[error("you must be signed in to {0}")]
    Unauthenticated(&'static str),

    /// The signed-in identity lacks the required role or ownership.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A purchase state transition that the lifecycle does not allow.
    #[error("{0}")]
    DomainRule(String),

    /// Transport-level failure talking to a remote endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// Remote endpoint answered with an unexpected HTTP status.
    #[error("remote error ({status}): {message}")]
    Http {
        /// HTTP status returned by the remote endpoint.
        status: u16,
        /// Response text or envelope message.
        message: String,
    },

    /// Local storage read/write or serialization failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidCredential(_) => 1002,
            Self::NotFound { .. } => 2001,
            Self::InvalidCredentials => 2002,
            Self::Unauthenticated(_) => 2003,
            Self::Forbidden(_) => 2004,
            Self::Conflict(_) => 2005,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::Network(_) => 3002,
            Self::Http { .. } => 3003,
            Self::InsufficientCapacity { .. } => 4001,
            Self::DomainRule(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredential(_) | Self::InvalidCredentials | Self::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::DomainRule(_) => StatusCode::CONFLICT,
            Self::InsufficientCapacity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Network(_) | Self::Http { .. } => StatusCode::BAD_GATEWAY,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
