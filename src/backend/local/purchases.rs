use async_trait::async_trait;
use chrono::Utc;

use super::SimulatedLatency;
use crate::backend::{PaymentReceipt, PurchaseBackend, PurchaseReceipt};
use crate::domain::{EventId, PurchaseId, UserId};
use crate::error::StoreError;

/// Simulated purchases service: assigns ids and payment references.
///
/// Purchase records themselves live in the order store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPurchases {
    latency: SimulatedLatency,
}

impl LocalPurchases {
    /// Creates the simulated service.
    #[must_use]
    pub const fn new(latency: SimulatedLatency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PurchaseBackend for LocalPurchases {
    async fn create(
        &self,
        user: &UserId,
        event_id: &EventId,
        quantity: u32,
    ) -> Result<PurchaseReceipt, StoreError> {
        self.latency.pause().await;
        let id = PurchaseId::generate();
        tracing::debug!(%id, %user, %event_id, quantity, "simulated purchase created");
        Ok(PurchaseReceipt {
            id,
            purchase_date: Some(Utc::now()),
        })
    }

    async fn pay(&self, purchase_id: &PurchaseId) -> Result<PaymentReceipt, StoreError> {
        self.latency.pause().await;
        tracing::debug!(%purchase_id, "simulated payment accepted");
        Ok(PaymentReceipt {
            payment_id: format!("pay-{}", Utc::now().timestamp_millis()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_unique_ids_and_payment_references() {
        let backend = LocalPurchases::default();
        let user = UserId::new("u");
        let event = EventId::new("1");
        let (Ok(a), Ok(b)) = (
            backend.create(&user, &event, 1).await,
            backend.create(&user, &event, 1).await,
        ) else {
            panic!("simulated create never fails");
        };
        assert_ne!(a.id, b.id);

        let Ok(receipt) = backend.pay(&a.id).await else {
            panic!("simulated pay never fails");
        };
        assert!(receipt.payment_id.starts_with("pay-"));
    }
}
