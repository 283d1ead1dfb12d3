//! Order store: ticket purchases of the signed-in user.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{CatalogStore, NotificationStore, PaymentDetails, SessionStore, StatusSnapshot, StoreStatus};
use crate::backend::PurchaseBackend;
use crate::domain::{
    Event, EventBus, EventId, NewNotification, Purchase, PurchaseId, PurchaseStatus, Session,
    StoreEvent,
};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, keys, load_collection, save_collection};

/// Purchases persisted under [`keys::PURCHASES`].
///
/// Capacity rules:
///
/// - a pending purchase holds its tickets, so creation checks the event's
///   remaining capacity minus every pending quantity of that event;
/// - capacity is consumed once, inside the `pending → completed`
///   transition, through [`CatalogStore::record_sale`].
///
/// The purchase list lock is held across each check-and-write so that two
/// overlapping checkouts cannot both pass the capacity check.
#[derive(Debug)]
pub struct OrderStore {
    backend: Arc<dyn PurchaseBackend>,
    storage: Arc<dyn KeyValueStorage>,
    session: Arc<SessionStore>,
    catalog: Arc<CatalogStore>,
    notifications: Arc<NotificationStore>,
    purchases: RwLock<Vec<Purchase>>,
    event_bus: EventBus,
    status: StoreStatus,
}

impl OrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PurchaseBackend>,
        storage: Arc<dyn KeyValueStorage>,
        session: Arc<SessionStore>,
        catalog: Arc<CatalogStore>,
        notifications: Arc<NotificationStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            backend,
            storage,
            session,
            catalog,
            notifications,
            purchases: RwLock::new(Vec::new()),
            event_bus,
            status: StoreStatus::default(),
        }
    }

    /// Loads the persisted purchases.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] for an unreadable collection.
    pub async fn load(&self) -> Result<usize, StoreError> {
        self.status
            .track("load purchases", async {
                let stored: Vec<Purchase> =
                    load_collection(self.storage.as_ref(), keys::PURCHASES).await?;
                let count = stored.len();
                *self.purchases.write().await = stored;
                Ok(count)
            })
            .await
    }

    /// Creates a pending purchase of `quantity` tickets.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] when signed out.
    /// - [`StoreError::Validation`] for a zero quantity.
    /// - [`StoreError::NotFound`] for an unknown event.
    /// - [`StoreError::InsufficientCapacity`] when the quantity exceeds what
    ///   is still available.
    pub async fn create(&self, event_id: &EventId, quantity: u32) -> Result<Purchase, StoreError> {
        self.status
            .track("create purchase", async {
                let session = self.session.require_session("purchase tickets").await?;
                if quantity == 0 {
                    return Err(StoreError::Validation(
                        "quantity must be at least 1".to_string(),
                    ));
                }
                let event = self.catalog.get(event_id).await?;

                let mut purchases = self.purchases.write().await;
                let available = event
                    .remaining_capacity()
                    .saturating_sub(held(&purchases, event_id));
                if quantity > available {
                    return Err(StoreError::InsufficientCapacity {
                        requested: quantity,
                        available,
                    });
                }

                let receipt = self
                    .backend
                    .create(&session.user_id, event_id, quantity)
                    .await?;
                let mut purchase = Purchase::pending(
                    receipt.id,
                    session.user_id.clone(),
                    event.id.clone(),
                    event.name.clone(),
                    quantity,
                    event.price_for(quantity),
                );
                if let Some(date) = receipt.purchase_date {
                    purchase.purchase_date = date;
                }
                let mut next = purchases.clone();
                next.push(purchase.clone());
                save_collection(self.storage.as_ref(), keys::PURCHASES, next.as_slice()).await?;
                *purchases = next;
                drop(purchases);

                let _ = self.event_bus.publish(StoreEvent::PurchaseCreated {
                    purchase_id: purchase.id.clone(),
                    user_id: purchase.user_id.clone(),
                    event_id: purchase.event_id.clone(),
                    quantity,
                    total_price: purchase.total_price.to_string(),
                    timestamp: Utc::now(),
                });
                tracing::info!(
                    purchase_id = %purchase.id,
                    event_id = %purchase.event_id,
                    quantity,
                    total = %purchase.total_price,
                    "purchase created"
                );
                Ok(purchase)
            })
            .await
    }

    /// Pays a pending purchase.
    ///
    /// Pays on the backend, consumes the event's capacity, completes the
    /// purchase and sends a confirmation notification. A notification
    /// failure is logged and does not undo the purchase.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] when signed out.
    /// - [`StoreError::Validation`] for incomplete payment details.
    /// - [`StoreError::NotFound`] / [`StoreError::Forbidden`] for an unknown
    ///   or foreign purchase.
    /// - [`StoreError::DomainRule`] unless the purchase is pending.
    /// - The backend's error if payment or the sale fails; the purchase
    ///   then stays pending.
    pub async fn process(
        &self,
        purchase_id: &PurchaseId,
        details: &PaymentDetails,
    ) -> Result<Purchase, StoreError> {
        self.status
            .track("process purchase", async {
                let session = self.session.require_session("pay for tickets").await?;
                details.validate()?;

                let mut purchases = self.purchases.write().await;
                let pending = find_owned(&purchases, &session, purchase_id)?.clone();
                if !pending.is_pending() {
                    return Err(StoreError::DomainRule(format!(
                        "only pending purchases can be paid; purchase {purchase_id} is {:?}",
                        pending.status
                    )));
                }

                let receipt = self.backend.pay(purchase_id).await?;
                let event = self
                    .catalog
                    .record_sale(&pending.event_id, pending.quantity)
                    .await?;

                let mut next = purchases.clone();
                let slot = next
                    .iter_mut()
                    .find(|p| &p.id == purchase_id)
                    .ok_or_else(|| StoreError::not_found("purchase", purchase_id))?;
                slot.complete(receipt.payment_id.clone())?;
                let completed = slot.clone();
                save_collection(self.storage.as_ref(), keys::PURCHASES, next.as_slice()).await?;
                *purchases = next;
                drop(purchases);

                if let Err(err) = self
                    .notifications
                    .send(NewNotification::purchase_confirmation(&completed, &event))
                    .await
                {
                    tracing::warn!(purchase_id = %completed.id, error = %err, "confirmation not delivered");
                }

                let _ = self.event_bus.publish(StoreEvent::PurchaseCompleted {
                    purchase_id: completed.id.clone(),
                    user_id: completed.user_id.clone(),
                    event_id: completed.event_id.clone(),
                    payment_id: receipt.payment_id,
                    timestamp: Utc::now(),
                });
                tracing::info!(
                    purchase_id = %completed.id,
                    event_id = %completed.event_id,
                    quantity = completed.quantity,
                    "purchase completed"
                );
                Ok(completed)
            })
            .await
    }

    /// Cancels a pending purchase. Cancelling a cancelled purchase is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unauthenticated`] when signed out.
    /// - [`StoreError::NotFound`] / [`StoreError::Forbidden`] for an unknown
    ///   or foreign purchase.
    /// - [`StoreError::DomainRule`] for a completed purchase.
    pub async fn cancel(&self, purchase_id: &PurchaseId) -> Result<Purchase, StoreError> {
        self.status
            .track("cancel purchase", async {
                let session = self.session.require_session("cancel purchases").await?;
                let mut purchases = self.purchases.write().await;
                find_owned(&purchases, &session, purchase_id)?;

                let mut next = purchases.clone();
                let slot = next
                    .iter_mut()
                    .find(|p| &p.id == purchase_id)
                    .ok_or_else(|| StoreError::not_found("purchase", purchase_id))?;
                let changed = slot.cancel()?;
                let cancelled = slot.clone();
                if !changed {
                    return Ok(cancelled);
                }
                save_collection(self.storage.as_ref(), keys::PURCHASES, next.as_slice()).await?;
                *purchases = next;
                drop(purchases);

                let _ = self.event_bus.publish(StoreEvent::PurchaseCancelled {
                    purchase_id: cancelled.id.clone(),
                    user_id: cancelled.user_id.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(purchase_id = %cancelled.id, "purchase cancelled");
                Ok(cancelled)
            })
            .await
    }

    /// Looks up a purchase by id.
    pub async fn get(&self, purchase_id: &PurchaseId) -> Option<Purchase> {
        self.purchases
            .read()
            .await
            .iter()
            .find(|p| &p.id == purchase_id)
            .cloned()
    }

    /// Every stored purchase.
    pub async fn all(&self) -> Vec<Purchase> {
        self.purchases.read().await.clone()
    }

    /// Purchases of the signed-in user; empty when signed out.
    pub async fn user_purchases(&self) -> Vec<Purchase> {
        let Some(session) = self.session.current().await else {
            return Vec::new();
        };
        self.purchases
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == session.user_id)
            .cloned()
            .collect()
    }

    /// Events the signed-in user holds pending or completed tickets for.
    pub async fn purchased_event_ids(&self) -> HashSet<EventId> {
        self.user_purchases()
            .await
            .into_iter()
            .filter(|p| p.status != PurchaseStatus::Cancelled)
            .map(|p| p.event_id)
            .collect()
    }

    /// Tickets of `event_id` held by pending purchases.
    pub async fn held_quantity(&self, event_id: &EventId) -> u32 {
        held(&self.purchases.read().await, event_id)
    }

    /// Tickets of `event` that can still be bought.
    pub async fn available_for(&self, event: &Event) -> u32 {
        event
            .remaining_capacity()
            .saturating_sub(self.held_quantity(&event.id).await)
    }

    /// Loading flag and last error.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }
}

fn held(purchases: &[Purchase], event_id: &EventId) -> u32 {
    purchases
        .iter()
        .filter(|p| p.is_pending() && &p.event_id == event_id)
        .fold(0_u32, |sum, p| sum.saturating_add(p.quantity))
}

fn find_owned<'a>(
    purchases: &'a [Purchase],
    session: &Session,
    purchase_id: &PurchaseId,
) -> Result<&'a Purchase, StoreError> {
    let purchase = purchases
        .iter()
        .find(|p| &p.id == purchase_id)
        .ok_or_else(|| StoreError::not_found("purchase", purchase_id))?;
    if !session.can_act_for(&purchase.user_id) {
        return Err(StoreError::Forbidden(
            "purchase belongs to another user".to_string(),
        ));
    }
    Ok(purchase)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::{CredentialCell, TokenCodec};
    use crate::backend::local::{LocalCatalog, LocalIdentity, LocalPurchases, SimulatedLatency};
    use crate::backend::{CatalogBackend, IdentityBackend, SignUpProfile};
    use crate::domain::{EventPatch, NewEvent, NotificationKind};
    use crate::storage::MemoryStorage;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    struct Fixture {
        orders: OrderStore,
        session: Arc<SessionStore>,
        catalog: Arc<CatalogStore>,
        notifications: Arc<NotificationStore>,
        storage: Arc<dyn KeyValueStorage>,
    }

    /// Memory storage whose writes to one key can be made to fail.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing_key: std::sync::RwLock<Option<&'static str>>,
    }

    impl FlakyStorage {
        fn fail_writes_to(&self, key: Option<&'static str>) {
            if let Ok(mut guard) = self.failing_key.write() {
                *guard = key;
            }
        }
    }

    #[async_trait::async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
            let failing = self.failing_key.read().map(|g| *g).unwrap_or_default();
            if failing == Some(key) {
                return Err(StoreError::Storage(format!("disk full writing `{key}`")));
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove_item(key).await
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(MemoryStorage::new())).await
    }

    async fn fixture_with(storage: Arc<dyn KeyValueStorage>) -> Fixture {
        let bus = EventBus::new(64);
        let codec = TokenCodec::new(&SecretString::from("orders-test"));
        let identity: Arc<dyn IdentityBackend> = Arc::new(LocalIdentity::new(
            Arc::clone(&storage),
            codec.clone(),
            3_600,
            SimulatedLatency::NONE,
        ));
        let session = Arc::new(SessionStore::new(
            identity,
            Arc::clone(&storage),
            codec,
            CredentialCell::new(),
            bus.clone(),
        ));
        let catalog_backend: Arc<dyn CatalogBackend> = Arc::new(LocalCatalog::new(
            Arc::clone(&storage),
            SimulatedLatency::NONE,
        ));
        let catalog = Arc::new(CatalogStore::new(catalog_backend, bus.clone()));
        let notifications = Arc::new(NotificationStore::new(Arc::clone(&storage), bus.clone()));
        let orders = OrderStore::new(
            Arc::new(LocalPurchases::default()),
            Arc::clone(&storage),
            Arc::clone(&session),
            Arc::clone(&catalog),
            Arc::clone(&notifications),
            bus,
        );
        Fixture {
            orders,
            session,
            catalog,
            notifications,
            storage,
        }
    }

    async fn sign_up(session: &SessionStore, email: &str) -> Session {
        let profile = SignUpProfile {
            given_names: "Test".to_string(),
            family_names: "Buyer".to_string(),
            national_id: String::new(),
            address: String::new(),
            phone: String::new(),
            email: email.to_string(),
            password: "secret1".to_string(),
        };
        let Ok(session) = session.sign_up(&profile).await else {
            panic!("sign-up should succeed");
        };
        session
    }

    async fn event(catalog: &CatalogStore, capacity: u32, price: i64) -> Event {
        let new_event = NewEvent {
            name: "Small Venue".to_string(),
            date: Utc::now() + Duration::days(7),
            location: "Basement".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity,
            ticket_price: Decimal::new(price, 0),
        };
        let Ok(event) = catalog.create(new_event).await else {
            panic!("event creation should succeed");
        };
        event
    }

    fn card() -> PaymentDetails {
        PaymentDetails {
            card_number: "4242424242424242".to_string(),
            card_name: "Test Buyer".to_string(),
            expiry_date: "12/30".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[tokio::test]
    async fn second_purchase_over_capacity_fails() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 2, 50).await;

        let Ok(first) = fx.orders.create(&event.id, 2).await else {
            panic!("first purchase fits capacity");
        };
        assert_eq!(first.total_price, Decimal::new(100, 0));
        assert_eq!(first.status, PurchaseStatus::Pending);

        let second = fx.orders.create(&event.id, 1).await;
        assert!(matches!(
            second,
            Err(StoreError::InsufficientCapacity {
                requested: 1,
                available: 0
            })
        ));
        assert!(fx.orders.status().error.is_some());
    }

    #[tokio::test]
    async fn cancelled_hold_frees_capacity() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 2, 50).await;

        let Ok(first) = fx.orders.create(&event.id, 2).await else {
            panic!("first purchase fits capacity");
        };
        assert_eq!(fx.orders.held_quantity(&event.id).await, 2);
        let _ = fx.orders.cancel(&first.id).await;
        assert_eq!(fx.orders.available_for(&event).await, 2);
        assert!(fx.orders.create(&event.id, 2).await.is_ok());
    }

    #[tokio::test]
    async fn process_consumes_capacity_once_and_notifies() {
        let fx = fixture().await;
        let buyer = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;

        let Ok(pending) = fx.orders.create(&event.id, 3).await else {
            panic!("purchase fits capacity");
        };
        let Ok(completed) = fx.orders.process(&pending.id, &card()).await else {
            panic!("payment should succeed");
        };
        assert_eq!(completed.status, PurchaseStatus::Completed);
        assert!(completed.payment_id.is_some());

        let Ok(current) = fx.catalog.get(&event.id).await else {
            panic!("event should still exist");
        };
        assert_eq!(current.remaining_capacity(), 2);
        assert_eq!(fx.orders.available_for(&current).await, 2);

        assert!(matches!(
            fx.orders.process(&pending.id, &card()).await,
            Err(StoreError::DomainRule(_))
        ));
        let Ok(after) = fx.catalog.get(&event.id).await else {
            panic!("event should still exist");
        };
        assert_eq!(after.remaining_capacity(), 2);

        let inbox = fx.notifications.for_user(&buyer.user_id).await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(
            inbox.first().map(|n| n.kind),
            Some(NotificationKind::PurchaseConfirmation)
        );
    }

    #[tokio::test]
    async fn completed_purchase_cannot_be_cancelled() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;
        let Ok(pending) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        let _ = fx.orders.process(&pending.id, &card()).await;

        assert!(matches!(
            fx.orders.cancel(&pending.id).await,
            Err(StoreError::DomainRule(_))
        ));
        assert_eq!(
            fx.orders.get(&pending.id).await.map(|p| p.status),
            Some(PurchaseStatus::Completed)
        );
    }

    #[tokio::test]
    async fn cancel_twice_is_a_no_op_and_cancelled_cannot_be_paid() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;
        let Ok(pending) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        assert!(fx.orders.cancel(&pending.id).await.is_ok());
        let Ok(again) = fx.orders.cancel(&pending.id).await else {
            panic!("second cancel is a no-op");
        };
        assert_eq!(again.status, PurchaseStatus::Cancelled);
        assert!(matches!(
            fx.orders.process(&pending.id, &card()).await,
            Err(StoreError::DomainRule(_))
        ));
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let fx = fixture().await;
        let event = event(&fx.catalog, 5, 20).await;
        assert!(matches!(
            fx.orders.create(&event.id, 1).await,
            Err(StoreError::Unauthenticated(_))
        ));

        let _ = sign_up(&fx.session, "buyer@example.com").await;
        assert!(matches!(
            fx.orders.create(&event.id, 0).await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            fx.orders.create(&EventId::new("404"), 1).await,
            Err(StoreError::NotFound { .. })
        ));

        let Ok(pending) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        let blank = PaymentDetails::default();
        assert!(matches!(
            fx.orders.process(&pending.id, &blank).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn other_users_cannot_touch_a_purchase() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "first@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;
        let Ok(pending) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        let _ = fx.session.sign_out().await;
        let _ = sign_up(&fx.session, "second@example.com").await;

        assert!(matches!(
            fx.orders.cancel(&pending.id).await,
            Err(StoreError::Forbidden(_))
        ));
        assert!(fx.orders.user_purchases().await.is_empty());
        assert!(fx.orders.purchased_event_ids().await.is_empty());
    }

    #[tokio::test]
    async fn purchases_reload_identically() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;
        let _ = fx.orders.create(&event.id, 1).await;
        let _ = fx.orders.create(&event.id, 2).await;

        let reloaded = OrderStore::new(
            Arc::new(LocalPurchases::default()),
            Arc::clone(&fx.storage),
            Arc::clone(&fx.session),
            Arc::clone(&fx.catalog),
            Arc::clone(&fx.notifications),
            EventBus::new(4),
        );
        assert!(matches!(reloaded.load().await, Ok(2)));
        assert_eq!(reloaded.all().await, fx.orders.all().await);
    }

    #[tokio::test]
    async fn checkout_wizard_walks_all_three_steps() {
        use crate::service::{Checkout, CheckoutStep};

        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 4, 25).await;

        let mut checkout = Checkout::start(&fx.orders, event).await;
        assert!(matches!(checkout.set_quantity(10), Ok(4)));
        assert!(matches!(
            checkout.pay(&fx.orders, &card()).await,
            Err(StoreError::DomainRule(_))
        ));

        let Ok(pending) = checkout.continue_to_payment(&fx.orders).await else {
            panic!("second step should create the purchase");
        };
        assert_eq!(pending.total_price, Decimal::new(100, 0));
        assert_eq!(checkout.step(), CheckoutStep::Payment);
        assert!(checkout.set_quantity(1).is_err());

        assert!(checkout.pay(&fx.orders, &PaymentDetails::default()).await.is_err());
        assert_eq!(checkout.step(), CheckoutStep::Payment);

        let Ok(completed) = checkout.pay(&fx.orders, &card()).await else {
            panic!("payment should succeed");
        };
        assert_eq!(completed.status, PurchaseStatus::Completed);
        assert_eq!(checkout.step(), CheckoutStep::Confirmation);
    }

    #[tokio::test]
    async fn price_edits_do_not_change_existing_totals() {
        let fx = fixture().await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;
        let Ok(pending) = fx.orders.create(&event.id, 2).await else {
            panic!("purchase fits capacity");
        };
        let patch = EventPatch {
            ticket_price: Some(Decimal::new(99, 0)),
            ..EventPatch::default()
        };
        let _ = fx.catalog.update(&event.id, &patch).await;
        assert_eq!(
            fx.orders.get(&pending.id).await.map(|p| p.total_price),
            Some(Decimal::new(40, 0))
        );
    }

    #[tokio::test]
    async fn failed_save_leaves_no_hold_behind() {
        let flaky = Arc::new(FlakyStorage::default());
        let fx = fixture_with(Arc::clone(&flaky) as Arc<dyn KeyValueStorage>).await;
        let _ = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 2, 50).await;

        flaky.fail_writes_to(Some(keys::PURCHASES));
        assert!(matches!(
            fx.orders.create(&event.id, 2).await,
            Err(StoreError::Storage(_))
        ));
        assert_eq!(fx.orders.held_quantity(&event.id).await, 0);
        assert!(fx.orders.user_purchases().await.is_empty());

        flaky.fail_writes_to(None);
        let Ok(pending) = fx.orders.create(&event.id, 2).await else {
            panic!("retry should fit capacity");
        };

        flaky.fail_writes_to(Some(keys::PURCHASES));
        assert!(fx.orders.cancel(&pending.id).await.is_err());
        assert!(fx.orders.process(&pending.id, &card()).await.is_err());
        assert_eq!(
            fx.orders.get(&pending.id).await.map(|p| p.status),
            Some(PurchaseStatus::Pending)
        );
        assert_eq!(fx.orders.held_quantity(&event.id).await, 2);
    }

    #[tokio::test]
    async fn failed_notification_save_changes_nothing() {
        let flaky = Arc::new(FlakyStorage::default());
        let fx = fixture_with(Arc::clone(&flaky) as Arc<dyn KeyValueStorage>).await;
        let buyer = sign_up(&fx.session, "buyer@example.com").await;
        let event = event(&fx.catalog, 5, 20).await;

        let Ok(first) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        let _ = fx.orders.process(&first.id, &card()).await;
        assert_eq!(fx.notifications.unread_count(&buyer.user_id).await, 1);

        flaky.fail_writes_to(Some(keys::NOTIFICATIONS));
        assert!(fx.notifications.mark_all_read(&buyer.user_id).await.is_err());
        assert_eq!(fx.notifications.unread_count(&buyer.user_id).await, 1);

        let Ok(second) = fx.orders.create(&event.id, 1).await else {
            panic!("purchase fits capacity");
        };
        let Ok(completed) = fx.orders.process(&second.id, &card()).await else {
            panic!("an undelivered confirmation does not fail the payment");
        };
        assert_eq!(completed.status, PurchaseStatus::Completed);
        assert_eq!(fx.notifications.for_user(&buyer.user_id).await.len(), 1);
    }
}
