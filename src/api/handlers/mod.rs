//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod auth;
pub mod events;
pub mod notifications;
pub mod purchases;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(events::routes())
        .merge(purchases::routes())
        .merge(notifications::routes())
        .merge(admin::routes())
        .merge(system::api_routes())
}
