//! Events emitted after store mutations.
//!
//! Every successful mutation of a store publishes a [`StoreEvent`] through
//! the [`super::EventBus`]. WebSocket clients subscribe to one or more
//! [`Topic`]s and receive the matching events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, NotificationId, PurchaseId, Role, UserId};

/// Coarse grouping of store events used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Sign-in and sign-out.
    Session,
    /// Event catalog changes.
    Catalog,
    /// Purchase lifecycle.
    Orders,
    /// Notification inbox.
    Notifications,
}

impl Topic {
    /// All topics, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Session,
        Self::Catalog,
        Self::Orders,
        Self::Notifications,
    ];

    /// Wire name of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Catalog => "catalog",
            Self::Orders => "orders",
            Self::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| format!("unknown topic: {s}"))
    }
}

/// Event emitted after a store mutation.
///
/// Money amounts are carried as strings to keep decimal precision in JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A user signed in or signed up.
    SessionStarted {
        /// Signed-in user.
        user_id: UserId,
        /// Role claim of the session.
        role: Role,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The current user signed out.
    SessionEnded {
        /// User that signed out.
        user_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An administrator created an event.
    EventCreated {
        /// New event.
        event_id: EventId,
        /// Its name.
        name: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An administrator edited an event.
    EventUpdated {
        /// Edited event.
        event_id: EventId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An administrator deleted an event.
    EventDeleted {
        /// Deleted event.
        event_id: EventId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Capacity was consumed by a completed purchase.
    TicketsSold {
        /// Event whose capacity changed.
        event_id: EventId,
        /// Tickets consumed.
        quantity: u32,
        /// Remaining capacity afterwards.
        remaining: u32,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pending purchase was created.
    PurchaseCreated {
        /// New purchase.
        purchase_id: PurchaseId,
        /// Owner.
        user_id: UserId,
        /// Purchased event.
        event_id: EventId,
        /// Ticket count.
        quantity: u32,
        /// Total price (decimal string).
        total_price: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A purchase was paid.
    PurchaseCompleted {
        /// Paid purchase.
        purchase_id: PurchaseId,
        /// Owner.
        user_id: UserId,
        /// Purchased event.
        event_id: EventId,
        /// Payment reference.
        payment_id: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pending purchase was cancelled.
    PurchaseCancelled {
        /// Cancelled purchase.
        purchase_id: PurchaseId,
        /// Owner.
        user_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A notification was delivered.
    NotificationSent {
        /// New notification.
        notification_id: NotificationId,
        /// Recipient.
        user_id: UserId,
        /// Its headline.
        title: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// One or more notifications were marked read.
    NotificationsRead {
        /// Recipient.
        user_id: UserId,
        /// Number of notifications that changed state.
        count: usize,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A notification was deleted.
    NotificationDeleted {
        /// Deleted notification.
        notification_id: NotificationId,
        /// Recipient.
        user_id: UserId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl StoreEvent {
    /// Returns the subscription topic of this event.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::SessionStarted { .. } | Self::SessionEnded { .. } => Topic::Session,
            Self::EventCreated { .. }
            | Self::EventUpdated { .. }
            | Self::EventDeleted { .. }
            | Self::TicketsSold { .. } => Topic::Catalog,
            Self::PurchaseCreated { .. }
            | Self::PurchaseCompleted { .. }
            | Self::PurchaseCancelled { .. } => Topic::Orders,
            Self::NotificationSent { .. }
            | Self::NotificationsRead { .. }
            | Self::NotificationDeleted { .. } => Topic::Notifications,
        }
    }

    /// Returns the user this event is private to, if any.
    ///
    /// Catalog events are public and return `None`.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::SessionStarted { user_id, .. }
            | Self::SessionEnded { user_id, .. }
            | Self::PurchaseCreated { user_id, .. }
            | Self::PurchaseCompleted { user_id, .. }
            | Self::PurchaseCancelled { user_id, .. }
            | Self::NotificationSent { user_id, .. }
            | Self::NotificationsRead { user_id, .. }
            | Self::NotificationDeleted { user_id, .. } => Some(user_id),
            Self::EventCreated { .. }
            | Self::EventUpdated { .. }
            | Self::EventDeleted { .. }
            | Self::TicketsSold { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::SessionEnded { .. } => "session_ended",
            Self::EventCreated { .. } => "event_created",
            Self::EventUpdated { .. } => "event_updated",
            Self::EventDeleted { .. } => "event_deleted",
            Self::TicketsSold { .. } => "tickets_sold",
            Self::PurchaseCreated { .. } => "purchase_created",
            Self::PurchaseCompleted { .. } => "purchase_completed",
            Self::PurchaseCancelled { .. } => "purchase_cancelled",
            Self::NotificationSent { .. } => "notification_sent",
            Self::NotificationsRead { .. } => "notifications_read",
            Self::NotificationDeleted { .. } => "notification_deleted",
        }
    }
}
