//! Event listing, detail and checkout DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DateWindow, Event, EventQuery, Session, SortBy};

/// Query parameters of `GET /api/v1/events`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListParams {
    /// Case-insensitive match on name or location.
    #[serde(default)]
    pub search: Option<String>,
    /// `date` (default) or `price`.
    #[serde(default)]
    pub sort: Option<SortBy>,
    /// Also list events whose date has passed.
    #[serde(default)]
    pub include_past: bool,
}

impl EventListParams {
    /// Converts to a catalog query.
    #[must_use]
    pub fn to_query(&self) -> EventQuery {
        EventQuery {
            search: self.search.clone(),
            sort: self.sort.unwrap_or_default(),
            window: if self.include_past {
                DateWindow::All
            } else {
                DateWindow::FromNow
            },
            limit: None,
        }
    }
}

/// An event as shown to the signed-in user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventView {
    /// The event record.
    #[serde(flatten)]
    pub event: Event,
    /// `capacity − tickets_sold`.
    pub remaining_capacity: u32,
    /// Whether the current user holds tickets for it.
    pub purchased: bool,
}

impl EventView {
    /// Wraps `event` with its derived fields.
    #[must_use]
    pub fn new(event: Event, purchased: bool) -> Self {
        Self {
            remaining_capacity: event.remaining_capacity(),
            event,
            purchased,
        }
    }
}

/// Response body for `GET /api/v1/events`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Matching events.
    pub data: Vec<EventView>,
    /// Number of matching events.
    pub count: usize,
}

/// Response body for `GET /api/v1/home`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomeResponse {
    /// The next upcoming events.
    pub featured: Vec<EventView>,
    /// The signed-in user, if any.
    pub session: Option<Session>,
    /// Unread notifications of the signed-in user.
    pub unread_notifications: usize,
}

/// Query parameters of `GET /api/v1/events/{id}/checkout`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckoutParams {
    /// Requested ticket count; clamped to availability.
    #[serde(default)]
    pub quantity: Option<u32>,
}
