//! Catalog store: the event list shown to visitors and administrators.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{StatusSnapshot, StoreStatus};
use crate::backend::CatalogBackend;
use crate::domain::{Event, EventBus, EventId, EventPatch, EventQuery, NewEvent, StoreEvent};
use crate::error::StoreError;

/// Cached event list reconciled with the catalog backend.
///
/// The list is loaded once at startup; every single-event call goes to the
/// backend and upserts or drops the cached copy.
#[derive(Debug)]
pub struct CatalogStore {
    backend: Arc<dyn CatalogBackend>,
    events: RwLock<Vec<Event>>,
    event_bus: EventBus,
    status: StoreStatus,
}

impl CatalogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, event_bus: EventBus) -> Self {
        Self {
            backend,
            events: RwLock::new(Vec::new()),
            event_bus,
            status: StoreStatus::default(),
        }
    }

    /// Replaces the cache with the backend's full list.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cache is left unchanged.
    pub async fn load(&self) -> Result<usize, StoreError> {
        self.status
            .track("load events", async {
                let events = self.backend.list().await?;
                let count = events.len();
                *self.events.write().await = events;
                tracing::info!(count, "catalog loaded");
                Ok(count)
            })
            .await
    }

    /// All cached events.
    pub async fn list(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    /// The cached copy of `id`, without calling the backend.
    pub async fn cached(&self, id: &EventId) -> Option<Event> {
        self.events.read().await.iter().find(|e| &e.id == id).cloned()
    }

    /// Fetches `id` from the backend and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] (and drops any cached copy) when the
    /// backend no longer has the event.
    pub async fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        self.status
            .track("get event", async {
                match self.backend.get(id).await {
                    Ok(event) => {
                        self.upsert(event.clone()).await;
                        Ok(event)
                    }
                    Err(err @ StoreError::NotFound { .. }) => {
                        self.events.write().await.retain(|e| &e.id != id);
                        Err(err)
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an invalid form and the
    /// backend error otherwise.
    pub async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        self.status
            .track("create event", async {
                new_event.validate()?;
                let event = self.backend.create(new_event).await?;
                self.events.write().await.push(event.clone());

                let _ = self.event_bus.publish(StoreEvent::EventCreated {
                    event_id: event.id.clone(),
                    name: event.name.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(event_id = %event.id, name = %event.name, "event created");
                Ok(event)
            })
            .await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty or invalid patch,
    /// [`StoreError::NotFound`] for an unknown id, and the backend error
    /// otherwise.
    pub async fn update(&self, id: &EventId, patch: &EventPatch) -> Result<Event, StoreError> {
        self.status
            .track("update event", async {
                patch.validate()?;
                let event = self.backend.update(id, patch).await?;
                self.upsert(event.clone()).await;

                let _ = self.event_bus.publish(StoreEvent::EventUpdated {
                    event_id: event.id.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(event_id = %event.id, "event updated");
                Ok(event)
            })
            .await
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and the backend
    /// error otherwise.
    pub async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        self.status
            .track("delete event", async {
                self.backend.delete(id).await?;
                self.events.write().await.retain(|e| &e.id != id);

                let _ = self.event_bus.publish(StoreEvent::EventDeleted {
                    event_id: id.clone(),
                    timestamp: Utc::now(),
                });
                tracing::info!(event_id = %id, "event deleted");
                Ok(())
            })
            .await
    }

    /// Consumes `quantity` tickets of `id` on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InsufficientCapacity`] if the backend's current
    /// record cannot cover the sale.
    pub async fn record_sale(&self, id: &EventId, quantity: u32) -> Result<Event, StoreError> {
        self.status
            .track("record sale", async {
                let event = self.backend.record_sale(id, quantity).await?;
                self.upsert(event.clone()).await;

                let _ = self.event_bus.publish(StoreEvent::TicketsSold {
                    event_id: event.id.clone(),
                    quantity,
                    remaining: event.remaining_capacity(),
                    timestamp: Utc::now(),
                });
                tracing::info!(
                    event_id = %event.id,
                    quantity,
                    remaining = event.remaining_capacity(),
                    "tickets sold"
                );
                Ok(event)
            })
            .await
    }

    /// Runs a listing query over the cache.
    pub async fn query(&self, query: &EventQuery) -> Vec<Event> {
        query.apply(&self.events.read().await, Utc::now())
    }

    /// The home page selection.
    pub async fn featured(&self) -> Vec<Event> {
        self.query(&EventQuery::featured()).await
    }

    /// Loading flag and last error.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    async fn upsert(&self, event: Event) {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => events.push(event),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::local::{LocalCatalog, SimulatedLatency};
    use crate::storage::MemoryStorage;
    use chrono::Duration;
    use rust_decimal::Decimal;

    async fn seeded() -> (CatalogStore, Arc<LocalCatalog>) {
        let backend = Arc::new(LocalCatalog::new(
            Arc::new(MemoryStorage::new()),
            SimulatedLatency::NONE,
        ));
        let _ = backend.seed_if_absent().await;
        let store = CatalogStore::new(
            Arc::clone(&backend) as Arc<dyn CatalogBackend>,
            EventBus::new(16),
        );
        let _ = store.load().await;
        (store, backend)
    }

    fn new_event() -> NewEvent {
        NewEvent {
            name: "Jazz Evening".to_string(),
            date: Utc::now() + Duration::days(2),
            location: "Blue Note".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity: 2,
            ticket_price: Decimal::new(50, 0),
        }
    }

    #[tokio::test]
    async fn create_update_delete_reconcile_cache() {
        let (store, _) = seeded().await;
        assert_eq!(store.list().await.len(), 3);

        let Ok(created) = store.create(new_event()).await else {
            panic!("create should succeed");
        };
        assert!(store.cached(&created.id).await.is_some());

        let patch = EventPatch {
            name: Some("Late Jazz".to_string()),
            ..EventPatch::default()
        };
        let Ok(updated) = store.update(&created.id, &patch).await else {
            panic!("update should succeed");
        };
        assert_eq!(updated.name, "Late Jazz");
        assert_eq!(store.cached(&created.id).await.map(|e| e.name), Some("Late Jazz".to_string()));

        let Ok(()) = store.delete(&created.id).await else {
            panic!("delete should succeed");
        };
        assert!(store.cached(&created.id).await.is_none());
        assert_eq!(store.list().await.len(), 3);
    }

    #[tokio::test]
    async fn invalid_create_is_recorded_and_returned() {
        let (store, _) = seeded().await;
        let mut bad = new_event();
        bad.capacity = 0;
        assert!(matches!(store.create(bad).await, Err(StoreError::Validation(_))));
        assert!(store.status().error.is_some());
        assert_eq!(store.list().await.len(), 3);
    }

    #[tokio::test]
    async fn get_drops_events_deleted_behind_the_cache() {
        let (store, backend) = seeded().await;
        let id = EventId::new("2");
        let _ = backend.delete(&id).await;
        assert!(store.cached(&id).await.is_some());
        assert!(matches!(store.get(&id).await, Err(StoreError::NotFound { .. })));
        assert!(store.cached(&id).await.is_none());
    }

    #[tokio::test]
    async fn record_sale_updates_cached_remaining_capacity() {
        let (store, _) = seeded().await;
        let Ok(created) = store.create(new_event()).await else {
            panic!("create should succeed");
        };
        let Ok(sold) = store.record_sale(&created.id, 2).await else {
            panic!("sale should succeed");
        };
        assert_eq!(sold.remaining_capacity(), 0);
        assert_eq!(
            store.cached(&created.id).await.map(|e| e.remaining_capacity()),
            Some(0)
        );
    }

    #[tokio::test]
    async fn featured_lists_three_soonest() {
        let (store, _) = seeded().await;
        let _ = store.create(new_event()).await;
        let featured = store.featured().await;
        assert_eq!(featured.len(), 3);
        assert_eq!(featured.first().map(|e| e.name.as_str()), Some("Jazz Evening"));
    }
}
