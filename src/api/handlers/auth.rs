//! Session handlers: sign-in, sign-up, sign-out and current session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{SessionResponse, SignInRequest};
use crate::app_state::AppState;
use crate::backend::SignUpProfile;
use crate::error::{ErrorResponse, StoreError};

/// `POST /api/v1/auth/sign-in` — Sign in with email and password.
///
/// # Errors
///
/// Returns [`StoreError::InvalidCredentials`] for rejected credentials.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    tag = "Auth",
    summary = "Sign in",
    description = "Exchanges email and password for a session. The credential token is kept in local storage.",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Malformed email", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state
        .context
        .session
        .sign_in(&req.email, &req.password)
        .await?;
    Ok(Json(SessionResponse::from(Some(session))))
}

/// `POST /api/v1/auth/sign-up` — Register and sign in.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for an incomplete profile and
/// [`StoreError::Conflict`] for a registered email.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    tag = "Auth",
    summary = "Sign up",
    description = "Creates a `user` account and signs it in.",
    request_body = SignUpProfile,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Incomplete profile", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(profile): Json<SignUpProfile>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state.context.session.sign_up(&profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from(Some(session))),
    ))
}

/// `POST /api/v1/auth/sign-out` — End the session.
///
/// # Errors
///
/// Returns [`StoreError::Storage`] if the token cannot be removed.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    tag = "Auth",
    summary = "Sign out",
    description = "Removes the stored credential token. Signing out while signed out succeeds.",
    responses(
        (status = 204, description = "Signed out"),
    )
)]
pub async fn sign_out(State(state): State<AppState>) -> Result<impl IntoResponse, StoreError> {
    state.context.session.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/auth/session` — Current session.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Auth",
    summary = "Current session",
    responses(
        (status = 200, description = "Authentication state", body = SessionResponse),
    )
)]
pub async fn current_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(SessionResponse::from(state.context.session.current().await))
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(current_session))
}
