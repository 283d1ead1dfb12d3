use async_trait::async_trait;
use reqwest::Method;

use super::wire::{PurchaseBody, RemotePurchase};
use super::{RemoteClient, join};
use crate::backend::{PaymentReceipt, PurchaseBackend, PurchaseReceipt};
use crate::domain::{EventId, PurchaseId, UserId};
use crate::error::StoreError;

/// Purchases service client.
///
/// The owner is taken from the bearer token by the service, so `user` is
/// not sent.
#[derive(Debug, Clone)]
pub struct RemotePurchases {
    client: RemoteClient,
    base_url: String,
}

impl RemotePurchases {
    /// Creates a client for the purchases collection at `base_url`.
    #[must_use]
    pub fn new(client: RemoteClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PurchaseBackend for RemotePurchases {
    async fn create(
        &self,
        _user: &UserId,
        event_id: &EventId,
        quantity: u32,
    ) -> Result<PurchaseReceipt, StoreError> {
        let builder = self
            .client
            .request(Method::POST, &self.base_url)
            .await
            .json(&PurchaseBody::new(event_id, quantity));
        let remote: RemotePurchase = self.client.send_json(builder, None).await?;
        if remote.cantidad != quantity {
            tracing::warn!(
                requested = quantity,
                recorded = remote.cantidad,
                "purchases service recorded a different quantity"
            );
        }
        Ok(PurchaseReceipt {
            id: remote.purchase_id(),
            purchase_date: remote.purchase_date(),
        })
    }

    async fn pay(&self, purchase_id: &PurchaseId) -> Result<PaymentReceipt, StoreError> {
        let url = join(&self.base_url, &format!("{purchase_id}/pagar"));
        let builder = self.client.request(Method::PUT, &url).await;
        let remote: RemotePurchase = self.client.send_json(builder, None).await?;
        if !remote.pagado {
            return Err(StoreError::DomainRule(format!(
                "purchase {purchase_id} was not marked as paid"
            )));
        }
        Ok(PaymentReceipt {
            payment_id: format!("pay-{}", remote.id.oid),
        })
    }
}
