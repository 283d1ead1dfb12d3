//! Filtering and ordering of catalog listings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use super::Event;

/// Number of events shown on the home page.
pub const FEATURED_COUNT: usize = 3;

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Soonest first.
    #[default]
    Date,
    /// Cheapest first.
    Price,
}

/// Which event dates a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    /// Past and future events.
    #[default]
    All,
    /// Events dated now or later.
    FromNow,
    /// Events dated strictly after now.
    AfterNow,
}

impl DateWindow {
    fn admits(self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::FromNow => date >= now,
            Self::AfterNow => date > now,
        }
    }
}

/// A catalog listing request.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Case-insensitive substring matched against name or location.
    pub search: Option<String>,
    /// Listing order; ties keep catalog order.
    pub sort: SortBy,
    /// Date filter.
    pub window: DateWindow,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Listing of the home page: the next [`FEATURED_COUNT`] events.
    #[must_use]
    pub fn featured() -> Self {
        Self {
            search: None,
            sort: SortBy::Date,
            window: DateWindow::AfterNow,
            limit: Some(FEATURED_COUNT),
        }
    }

    /// Applies the query to `events` as of `now`.
    #[must_use]
    pub fn apply(&self, events: &[Event], now: DateTime<Utc>) -> Vec<Event> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<Event> = events
            .iter()
            .filter(|event| self.window.admits(event.date, now))
            .filter(|event| {
                needle.as_deref().is_none_or(|needle| {
                    event.name.to_lowercase().contains(needle)
                        || event.location.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();

        match self.sort {
            SortBy::Date => matched.sort_by(|a, b| a.date.cmp(&b.date)),
            SortBy::Price => matched.sort_by(|a, b| a.ticket_price.cmp(&b.ticket_price)),
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}
