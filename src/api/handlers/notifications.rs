//! Notification handlers for the signed-in user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{CountResponse, NotificationListResponse};
use crate::app_state::AppState;
use crate::domain::{Notification, NotificationId};
use crate::error::{ErrorResponse, StoreError};

/// `GET /api/v1/notifications` — Notifications of the signed-in user.
///
/// # Errors
///
/// Returns [`StoreError::Unauthenticated`] when signed out.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "List notifications",
    description = "Returns the signed-in user's notifications, newest first, with the unread count.",
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state
        .context
        .session
        .require_session("read notifications")
        .await?;
    let sink = &state.context.notifications;
    Ok(Json(NotificationListResponse {
        data: sink.for_user(&session.user_id).await,
        unread_count: sink.unread_count(&session.user_id).await,
    }))
}

/// `POST /api/v1/notifications/{id}/read` — Mark one notification read.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown id and
/// [`StoreError::Forbidden`] for another user's notification.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark notification read",
    description = "Marks one notification read. Repeating the call returns the same notification.",
    params(
        ("id" = String, Path, description = "Notification id"),
    ),
    responses(
        (status = 200, description = "Read notification", body = Notification),
        (status = 403, description = "Notification of another user", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state
        .context
        .session
        .require_session("read notifications")
        .await?;
    let notification = state
        .context
        .notifications
        .mark_read(&session, &NotificationId::new(id))
        .await?;
    Ok(Json(notification))
}

/// `POST /api/v1/notifications/read-all` — Mark every notification read.
///
/// # Errors
///
/// Returns [`StoreError::Unauthenticated`] when signed out.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    summary = "Mark all notifications read",
    responses(
        (status = 200, description = "Number of notifications changed", body = CountResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state
        .context
        .session
        .require_session("read notifications")
        .await?;
    let count = state
        .context
        .notifications
        .mark_all_read(&session.user_id)
        .await?;
    Ok(Json(CountResponse { count }))
}

/// `DELETE /api/v1/notifications/{id}` — Delete one notification.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown id and
/// [`StoreError::Forbidden`] for another user's notification.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    summary = "Delete notification",
    params(
        ("id" = String, Path, description = "Notification id"),
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Notification of another user", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state
        .context
        .session
        .require_session("manage notifications")
        .await?;
    state
        .context
        .notifications
        .delete(&session, &NotificationId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
}
