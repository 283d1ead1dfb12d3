//! Ticket purchases and their lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, PurchaseId, UserId};
use crate::error::StoreError;

/// Lifecycle state of a purchase.
///
/// `Pending` is the only state with outgoing transitions: it moves to
/// `Completed` once payment succeeds, or to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Created, awaiting payment.
    Pending,
    /// Paid; tickets have been deducted from the event.
    Completed,
    /// Abandoned before payment.
    Cancelled,
}

/// A purchase of tickets for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Purchase {
    /// Purchase identifier.
    pub id: PurchaseId,
    /// Owning user.
    pub user_id: UserId,
    /// Purchased event.
    pub event_id: EventId,
    /// Event name at creation time.
    pub event_name: String,
    /// Number of tickets.
    pub quantity: u32,
    /// Price of all tickets at creation time.
    #[schema(value_type = String)]
    pub total_price: Decimal,
    /// Creation timestamp.
    pub purchase_date: DateTime<Utc>,
    /// Current state.
    pub status: PurchaseStatus,
    /// Payment reference, set when the purchase completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl Purchase {
    /// Builds a new pending purchase.
    #[must_use]
    pub fn pending(
        id: PurchaseId,
        user_id: UserId,
        event_id: EventId,
        event_name: String,
        quantity: u32,
        total_price: Decimal,
    ) -> Self {
        Self {
            id,
            user_id,
            event_id,
            event_name,
            quantity,
            total_price,
            purchase_date: Utc::now(),
            status: PurchaseStatus::Pending,
            payment_id: None,
        }
    }

    /// Returns `true` while the purchase awaits payment.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == PurchaseStatus::Pending
    }

    /// Moves a pending purchase to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DomainRule`] if the purchase is not pending.
    pub fn complete(&mut self, payment_id: String) -> Result<(), StoreError> {
        if !self.is_pending() {
            return Err(StoreError::DomainRule(format!(
                "purchase {} is not pending",
                self.id
            )));
        }
        self.status = PurchaseStatus::Completed;
        self.payment_id = Some(payment_id);
        Ok(())
    }

    /// Moves a pending purchase to `Cancelled`.
    ///
    /// Returns `Ok(false)` when the purchase was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DomainRule`] for a completed purchase.
    pub fn cancel(&mut self) -> Result<bool, StoreError> {
        match self.status {
            PurchaseStatus::Pending => {
                self.status = PurchaseStatus::Cancelled;
                Ok(true)
            }
            PurchaseStatus::Cancelled => Ok(false),
            PurchaseStatus::Completed => Err(StoreError::DomainRule(
                "cannot cancel a completed purchase".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pending() -> Purchase {
        Purchase::pending(
            PurchaseId::new("p-1"),
            UserId::new("u-1"),
            EventId::new("1"),
            "Comedy Night".to_string(),
            2,
            Decimal::new(7000, 2),
        )
    }

    #[test]
    fn complete_sets_payment_reference() {
        let mut purchase = pending();
        let Ok(()) = purchase.complete("pay-1".to_string()) else {
            panic!("pending purchase should complete");
        };
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(purchase.payment_id.as_deref(), Some("pay-1"));
        assert!(purchase.complete("pay-2".to_string()).is_err());
        assert!(purchase.cancel().is_err());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut purchase = pending();
        assert!(matches!(purchase.cancel(), Ok(true)));
        assert!(matches!(purchase.cancel(), Ok(false)));
        assert!(purchase.complete("pay".to_string()).is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&pending()).unwrap_or_default();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(!json.contains("payment_id"));
    }
}
