//! Public catalog handlers: home, listing, detail and checkout quote.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CheckoutParams, EventListParams, EventListResponse, EventView, HomeResponse};
use crate::app_state::AppState;
use crate::domain::{Event, EventId};
use crate::error::{ErrorResponse, StoreError};
use crate::service::{Checkout, CheckoutQuote};

/// `GET /api/v1/home` — Featured events and the current session.
#[utoipa::path(
    get,
    path = "/api/v1/home",
    tag = "Events",
    summary = "Home page",
    description = "Returns the next three upcoming events, the signed-in user and their unread notification count.",
    responses(
        (status = 200, description = "Home page data", body = HomeResponse),
    )
)]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let context = &state.context;
    let session = context.session.current().await;
    let featured = with_flags(&state, context.catalog.featured().await).await;
    let unread_notifications = match &session {
        Some(session) => context.notifications.unread_count(&session.user_id).await,
        None => 0,
    };
    Json(HomeResponse {
        featured,
        session,
        unread_notifications,
    })
}

/// `GET /api/v1/events` — Search and sort the catalog.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Lists upcoming events (or all with `include_past`), filtered by a case-insensitive search on name or location and sorted by date or price. Each event is flagged when the signed-in user already holds tickets for it.",
    params(EventListParams),
    responses(
        (status = 200, description = "Matching events", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> impl IntoResponse {
    let events = state.context.catalog.query(&params.to_query()).await;
    let data = with_flags(&state, events).await;
    Json(EventListResponse {
        count: data.len(),
        data,
    })
}

/// `GET /api/v1/events/{id}` — Event detail.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event",
    params(
        ("id" = String, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event detail", body = EventView),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let event = state.context.catalog.get(&EventId::new(id)).await?;
    let purchased = state
        .context
        .orders
        .purchased_event_ids()
        .await
        .contains(&event.id);
    Ok(Json(EventView::new(event, purchased)))
}

/// `GET /api/v1/events/{id}/checkout` — First checkout step.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/checkout",
    tag = "Events",
    summary = "Checkout quote",
    description = "Clamps the requested quantity to the tickets still available (pending purchases hold tickets) and returns the total.",
    params(
        ("id" = String, Path, description = "Event id"),
        CheckoutParams,
    ),
    responses(
        (status = 200, description = "Quote", body = CheckoutQuote),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn checkout_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CheckoutParams>,
) -> Result<impl IntoResponse, StoreError> {
    let event = state.context.catalog.get(&EventId::new(id)).await?;
    let mut checkout = Checkout::start(&state.context.orders, event).await;
    checkout.set_quantity(params.quantity.unwrap_or(1))?;
    Ok(Json(checkout.quote()))
}

async fn with_flags(state: &AppState, events: Vec<Event>) -> Vec<EventView> {
    let purchased = state.context.orders.purchased_event_ids().await;
    events
        .into_iter()
        .map(|event| {
            let flag = purchased.contains(&event.id);
            EventView::new(event, flag)
        })
        .collect()
}

/// Public catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/checkout", get(checkout_quote))
}
