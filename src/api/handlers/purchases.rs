//! Purchase handlers: create, pay, cancel and list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CreatePurchaseRequest, PurchaseListResponse};
use crate::app_state::AppState;
use crate::domain::{Purchase, PurchaseId};
use crate::error::{ErrorResponse, StoreError};
use crate::service::PaymentDetails;

/// `POST /api/v1/purchases` — Create a pending purchase.
///
/// # Errors
///
/// Returns [`StoreError::Unauthenticated`] when signed out and
/// [`StoreError::InsufficientCapacity`] when the quantity exceeds what is
/// still available.
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    tag = "Purchases",
    summary = "Create purchase",
    description = "Creates a pending purchase that holds the requested tickets until it is paid or cancelled.",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Pending purchase", body = Purchase),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 422, description = "Not enough tickets", body = ErrorResponse),
    )
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, StoreError> {
    let purchase = state
        .context
        .orders
        .create(&req.event_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// `POST /api/v1/purchases/{id}/pay` — Pay a pending purchase.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for incomplete card details and
/// [`StoreError::DomainRule`] unless the purchase is pending.
#[utoipa::path(
    post,
    path = "/api/v1/purchases/{id}/pay",
    tag = "Purchases",
    summary = "Pay purchase",
    description = "Pays a pending purchase, consumes the event's capacity and sends a purchase confirmation notification.",
    params(
        ("id" = String, Path, description = "Purchase id"),
    ),
    request_body = PaymentDetails,
    responses(
        (status = 200, description = "Completed purchase", body = Purchase),
        (status = 400, description = "Incomplete payment details", body = ErrorResponse),
        (status = 403, description = "Purchase of another user", body = ErrorResponse),
        (status = 404, description = "Purchase not found", body = ErrorResponse),
        (status = 409, description = "Purchase is not pending", body = ErrorResponse),
    )
)]
pub async fn pay_purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(details): Json<PaymentDetails>,
) -> Result<impl IntoResponse, StoreError> {
    let purchase = state
        .context
        .orders
        .process(&PurchaseId::new(id), &details)
        .await?;
    Ok(Json(purchase))
}

/// `POST /api/v1/purchases/{id}/cancel` — Cancel a pending purchase.
///
/// # Errors
///
/// Returns [`StoreError::DomainRule`] for a completed purchase.
#[utoipa::path(
    post,
    path = "/api/v1/purchases/{id}/cancel",
    tag = "Purchases",
    summary = "Cancel purchase",
    description = "Cancels a pending purchase and releases its tickets. Cancelling a cancelled purchase succeeds.",
    params(
        ("id" = String, Path, description = "Purchase id"),
    ),
    responses(
        (status = 200, description = "Cancelled purchase", body = Purchase),
        (status = 404, description = "Purchase not found", body = ErrorResponse),
        (status = 409, description = "Purchase already completed", body = ErrorResponse),
    )
)]
pub async fn cancel_purchase(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let purchase = state.context.orders.cancel(&PurchaseId::new(id)).await?;
    Ok(Json(purchase))
}

/// `GET /api/v1/purchases` — Purchases of the signed-in user.
///
/// # Errors
///
/// Returns [`StoreError::Unauthenticated`] when signed out.
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    tag = "Purchases",
    summary = "List purchases",
    responses(
        (status = 200, description = "Purchases of the signed-in user", body = PurchaseListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    )
)]
pub async fn list_purchases(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StoreError> {
    state
        .context
        .session
        .require_session("view purchases")
        .await?;
    Ok(Json(PurchaseListResponse {
        data: state.context.orders.user_purchases().await,
    }))
}

/// Purchase routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchases", post(create_purchase).get(list_purchases))
        .route("/purchases/{id}/pay", post(pay_purchase))
        .route("/purchases/{id}/cancel", post(cancel_purchase))
}
