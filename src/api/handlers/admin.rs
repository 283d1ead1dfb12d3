//! Administrator handlers: event creation, editing and deletion.
//!
//! Every handler first requires an administrator session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::dto::{EventListResponse, EventView};
use crate::app_state::AppState;
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::{ErrorResponse, StoreError};

/// `GET /api/v1/admin/events` — Every event, past ones included.
///
/// # Errors
///
/// Returns [`StoreError::Unauthenticated`] or [`StoreError::Forbidden`]
/// without an administrator session.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events",
    tag = "Admin",
    summary = "List all events",
    responses(
        (status = 200, description = "Every cached event", body = EventListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
    )
)]
pub async fn list_all_events(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StoreError> {
    state.context.session.require_admin().await?;
    let data: Vec<EventView> = state
        .context
        .catalog
        .list()
        .await
        .into_iter()
        .map(|event| EventView::new(event, false))
        .collect();
    Ok(Json(EventListResponse {
        count: data.len(),
        data,
    }))
}

/// `POST /api/v1/admin/events` — Create an event.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for an invalid form.
#[utoipa::path(
    post,
    path = "/api/v1/admin/events",
    tag = "Admin",
    summary = "Create event",
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(new_event): Json<NewEvent>,
) -> Result<impl IntoResponse, StoreError> {
    state.context.session.require_admin().await?;
    let event = state.context.catalog.create(new_event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `PATCH /api/v1/admin/events/{id}` — Partially update an event.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for an empty or invalid patch and
/// [`StoreError::NotFound`] for an unknown event.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/events/{id}",
    tag = "Admin",
    summary = "Update event",
    description = "Applies the fields present in the body; absent fields keep their value.",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    request_body = EventPatch,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> Result<impl IntoResponse, StoreError> {
    state.context.session.require_admin().await?;
    let event = state
        .context
        .catalog
        .update(&EventId::new(id), &patch)
        .await?;
    Ok(Json(event))
}

/// `DELETE /api/v1/admin/events/{id}` — Delete an event.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown event.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}",
    tag = "Admin",
    summary = "Delete event",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    state.context.session.require_admin().await?;
    state.context.catalog.delete(&EventId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Administrator routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/events", get(list_all_events).post(create_event))
        .route("/admin/events/{id}", patch(update_event).delete(delete_event))
}
