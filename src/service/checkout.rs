//! Three-step ticket checkout.
//!
//! `SelectTickets → Payment → Confirmation`. The quantity picked in the
//! first step is clamped to what is still available; continuing creates a
//! pending purchase and paying completes it. Steps cannot be skipped.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::OrderStore;
use crate::domain::{Event, EventId, Purchase};
use crate::error::StoreError;

/// Wizard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Choosing the ticket count.
    SelectTickets,
    /// Entering card details for the pending purchase.
    Payment,
    /// Purchase completed.
    Confirmation,
}

/// Card details entered in the payment step.
///
/// Only checked for presence; nothing is stored.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct PaymentDetails {
    /// Card number.
    pub card_number: String,
    /// Name printed on the card.
    pub card_name: String,
    /// Expiry, e.g. `12/27`.
    pub expiry_date: String,
    /// Security code.
    pub cvv: String,
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_name", &self.card_name)
            .finish_non_exhaustive()
    }
}

impl PaymentDetails {
    /// Requires every field to be filled in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] naming the first blank field.
    pub fn validate(&self) -> Result<(), StoreError> {
        let fields = [
            ("card number", &self.card_number),
            ("card holder name", &self.card_name),
            ("expiry date", &self.expiry_date),
            ("CVV", &self.cvv),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(StoreError::Validation(format!("{name} is required"))),
            None => Ok(()),
        }
    }
}

/// Clamps a requested quantity to `[1, max(available, 1)]`.
#[must_use]
pub fn clamp_quantity(requested: u32, available: u32) -> u32 {
    requested.clamp(1, available.max(1))
}

/// Price summary of the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckoutQuote {
    /// Event being bought.
    pub event_id: EventId,
    /// Event name.
    pub event_name: String,
    /// Clamped ticket count.
    pub quantity: u32,
    /// Tickets still purchasable.
    pub available: u32,
    /// Unit price.
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    /// `unit_price × quantity`.
    #[schema(value_type = String)]
    pub total_price: Decimal,
    /// Whether any ticket can be bought.
    pub sold_out: bool,
}

impl CheckoutQuote {
    /// Quotes `requested` tickets of `event` given `available`.
    #[must_use]
    pub fn new(event: &Event, available: u32, requested: u32) -> Self {
        let quantity = clamp_quantity(requested, available);
        Self {
            event_id: event.id.clone(),
            event_name: event.name.clone(),
            quantity,
            available,
            unit_price: event.ticket_price,
            total_price: event.price_for(quantity),
            sold_out: available == 0,
        }
    }
}

/// One pass through the checkout.
#[derive(Debug, Clone)]
pub struct Checkout {
    event: Event,
    available: u32,
    quantity: u32,
    step: CheckoutStep,
    purchase: Option<Purchase>,
}

impl Checkout {
    /// Starts the wizard for `event` with `available` tickets left.
    #[must_use]
    pub fn new(event: Event, available: u32) -> Self {
        Self {
            event,
            available,
            quantity: 1,
            step: CheckoutStep::SelectTickets,
            purchase: None,
        }
    }

    /// Starts the wizard using the order store's availability.
    pub async fn start(orders: &OrderStore, event: Event) -> Self {
        let available = orders.available_for(&event).await;
        Self::new(event, available)
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Selected quantity.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Purchase created by the second step.
    #[must_use]
    pub fn purchase(&self) -> Option<&Purchase> {
        self.purchase.as_ref()
    }

    /// Current price summary.
    #[must_use]
    pub fn quote(&self) -> CheckoutQuote {
        CheckoutQuote::new(&self.event, self.available, self.quantity)
    }

    /// Changes the quantity, clamped to availability.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DomainRule`] outside the first step.
    pub fn set_quantity(&mut self, requested: u32) -> Result<u32, StoreError> {
        self.expect_step(CheckoutStep::SelectTickets)?;
        self.quantity = clamp_quantity(requested, self.available);
        Ok(self.quantity)
    }

    /// Creates the pending purchase and moves to the payment step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DomainRule`] outside the first step, and any
    /// error of [`OrderStore::create`]; the wizard stays put on failure.
    pub async fn continue_to_payment(&mut self, orders: &OrderStore) -> Result<&Purchase, StoreError> {
        self.expect_step(CheckoutStep::SelectTickets)?;
        let purchase = orders.create(&self.event.id, self.quantity).await?;
        self.step = CheckoutStep::Payment;
        Ok(self.purchase.insert(purchase))
    }

    /// Pays the pending purchase and moves to the confirmation step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DomainRule`] outside the payment step, and any
    /// error of [`OrderStore::process`]; the wizard stays put on failure.
    pub async fn pay(
        &mut self,
        orders: &OrderStore,
        details: &PaymentDetails,
    ) -> Result<&Purchase, StoreError> {
        self.expect_step(CheckoutStep::Payment)?;
        let Some(pending) = &self.purchase else {
            return Err(StoreError::DomainRule("no pending purchase".to_string()));
        };
        let completed = orders.process(&pending.id, details).await?;
        self.step = CheckoutStep::Confirmation;
        Ok(self.purchase.insert(completed))
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), StoreError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(StoreError::DomainRule(format!(
                "checkout is at {:?}, expected {expected:?}",
                self.step
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event() -> Event {
        Event {
            id: EventId::new("1"),
            name: "Comedy Night".to_string(),
            date: Utc::now(),
            location: "Laugh Factory".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity: 5,
            ticket_price: Decimal::new(4500, 2),
            tickets_sold: 0,
        }
    }

    #[test]
    fn quantity_is_clamped_to_availability() {
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(9, 5), 5);
        assert_eq!(clamp_quantity(3, 5), 3);
        assert_eq!(clamp_quantity(3, 0), 1);
    }

    #[test]
    fn quote_totals_clamped_quantity() {
        let quote = CheckoutQuote::new(&event(), 2, 10);
        assert_eq!(quote.quantity, 2);
        assert_eq!(quote.total_price, Decimal::new(9000, 2));
        assert!(!quote.sold_out);
        assert!(CheckoutQuote::new(&event(), 0, 1).sold_out);
    }

    #[test]
    fn payment_details_require_every_field() {
        let mut details = PaymentDetails {
            card_number: "4242424242424242".to_string(),
            card_name: "Ana Quispe".to_string(),
            expiry_date: "12/27".to_string(),
            cvv: "123".to_string(),
        };
        assert!(details.validate().is_ok());
        details.cvv = " ".to_string();
        let Err(StoreError::Validation(message)) = details.validate() else {
            panic!("blank CVV must fail");
        };
        assert_eq!(message, "CVV is required");
        assert!(!format!("{details:?}").contains("4242"));
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut checkout = Checkout::new(event(), 3);
        assert_eq!(checkout.step(), CheckoutStep::SelectTickets);
        assert!(matches!(checkout.set_quantity(7), Ok(3)));
        assert!(checkout.expect_step(CheckoutStep::Payment).is_err());
        assert_eq!(checkout.quote().total_price, Decimal::new(13500, 2));
    }
}
