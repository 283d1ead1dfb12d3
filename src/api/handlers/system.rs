//! System endpoints: health check and store status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::StoreStatusResponse;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /api/v1/status` — Loading flag and last error of every store.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "System",
    summary = "Store status",
    description = "Returns each store's loading flag and the message of its most recent failure.",
    responses(
        (status = 200, description = "Store status", body = StoreStatusResponse),
    )
)]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let context = &state.context;
    Json(StoreStatusResponse {
        session: context.session.status(),
        catalog: context.catalog.status(),
        orders: context.orders.status(),
        notifications: context.notifications.status(),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// System routes mounted under /api/v1.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/status", get(status_handler))
}
