//! User-visible notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Event, EventId, NotificationId, Purchase, PurchaseId, UserId};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A purchase was paid.
    PurchaseConfirmation,
    /// An event the user follows changed.
    EventUpdate,
    /// Anything else.
    System,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Related event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Related purchase, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<PurchaseId>,
}

/// Fields supplied by the sender; id, read flag and timestamp are assigned
/// by the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related event, if any.
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Related purchase, if any.
    #[serde(default)]
    pub purchase_id: Option<PurchaseId>,
}

impl NewNotification {
    /// Confirmation sent once a purchase is paid.
    #[must_use]
    pub fn purchase_confirmation(purchase: &Purchase, event: &Event) -> Self {
        Self {
            user_id: purchase.user_id.clone(),
            kind: NotificationKind::PurchaseConfirmation,
            title: "Purchase Confirmed".to_string(),
            message: format!(
                "Your purchase of {} ticket(s) for {} has been confirmed.",
                purchase.quantity, event.name
            ),
            event_id: Some(event.id.clone()),
            purchase_id: Some(purchase.id.clone()),
        }
    }

    /// Stamps the notification as a new, unread entry.
    #[must_use]
    pub fn into_notification(self, id: NotificationId) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            is_read: false,
            created_at: Utc::now(),
            event_id: self.event_id,
            purchase_id: self.purchase_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn confirmation_mentions_quantity_and_event() {
        let event = Event {
            id: EventId::new("3"),
            name: "Comedy Night".to_string(),
            date: Utc::now(),
            location: "Laugh Factory".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity: 150,
            ticket_price: Decimal::new(3500, 2),
            tickets_sold: 0,
        };
        let purchase = Purchase::pending(
            PurchaseId::new("p-9"),
            UserId::new("u-1"),
            event.id.clone(),
            event.name.clone(),
            2,
            event.price_for(2),
        );
        let new = NewNotification::purchase_confirmation(&purchase, &event);
        assert_eq!(new.kind, NotificationKind::PurchaseConfirmation);
        assert!(new.message.contains("2 ticket(s) for Comedy Night"));

        let stored = new.into_notification(NotificationId::new("n-1"));
        assert!(!stored.is_read);
        assert_eq!(stored.purchase_id, Some(PurchaseId::new("p-9")));
    }

    #[test]
    fn kind_serializes_under_type_key() {
        let new = NewNotification {
            user_id: UserId::new("u"),
            kind: NotificationKind::System,
            title: "t".to_string(),
            message: "m".to_string(),
            event_id: None,
            purchase_id: None,
        };
        let json = serde_json::to_string(&new.into_notification(NotificationId::new("n")))
            .unwrap_or_default();
        assert!(json.contains("\"type\":\"system\""));
    }
}
