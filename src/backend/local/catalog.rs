use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Timelike, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::SimulatedLatency;
use crate::backend::CatalogBackend;
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, keys, load_collection, save_collection};

/// Catalog kept under the `events` storage key.
///
/// Ids are sequential integers, like the remote service's.
#[derive(Debug)]
pub struct LocalCatalog {
    storage: Arc<dyn KeyValueStorage>,
    latency: SimulatedLatency,
    write_lock: Mutex<()>,
}

impl LocalCatalog {
    /// Creates a catalog over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, latency: SimulatedLatency) -> Self {
        Self {
            storage,
            latency,
            write_lock: Mutex::new(()),
        }
    }

    /// Writes [`sample_events`] if the catalog has never been stored.
    ///
    /// An explicitly emptied catalog is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] on read or write failure.
    pub async fn seed_if_absent(&self) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.storage.get_item(keys::EVENTS).await?.is_some() {
            return Ok(false);
        }
        let events = sample_events();
        save_collection(self.storage.as_ref(), keys::EVENTS, &events).await?;
        tracing::info!(count = events.len(), "seeded sample events");
        Ok(true)
    }

    async fn load(&self) -> Result<Vec<Event>, StoreError> {
        load_collection(self.storage.as_ref(), keys::EVENTS).await
    }

    async fn save(&self, events: &[Event]) -> Result<(), StoreError> {
        save_collection(self.storage.as_ref(), keys::EVENTS, events).await
    }

    /// Runs `mutate` on the stored event `id` and writes the list back.
    async fn modify<F>(&self, id: &EventId, mutate: F) -> Result<Event, StoreError>
    where
        F: FnOnce(&mut Event) -> Result<(), StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut events = self.load().await?;
        let event = events
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::not_found("event", id))?;
        mutate(event)?;
        let updated = event.clone();
        self.save(&events).await?;
        Ok(updated)
    }
}

fn next_id(events: &[Event]) -> EventId {
    let max = events
        .iter()
        .filter_map(|e| e.id.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    EventId::new((max + 1).to_string())
}

#[async_trait]
impl CatalogBackend for LocalCatalog {
    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        self.latency.pause().await;
        self.load().await
    }

    async fn get(&self, id: &EventId) -> Result<Event, StoreError> {
        self.latency.pause().await;
        self.load()
            .await?
            .into_iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::not_found("event", id))
    }

    async fn create(&self, new_event: NewEvent) -> Result<Event, StoreError> {
        self.latency.pause().await;
        let _guard = self.write_lock.lock().await;
        let mut events = self.load().await?;
        let event = new_event.into_event(next_id(&events));
        events.push(event.clone());
        self.save(&events).await?;
        Ok(event)
    }

    async fn update(&self, id: &EventId, patch: &EventPatch) -> Result<Event, StoreError> {
        self.latency.pause().await;
        self.modify(id, |event| {
            event.apply(patch);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &EventId) -> Result<(), StoreError> {
        self.latency.pause().await;
        let _guard = self.write_lock.lock().await;
        let mut events = self.load().await?;
        let before = events.len();
        events.retain(|e| &e.id != id);
        if events.len() == before {
            return Err(StoreError::not_found("event", id));
        }
        self.save(&events).await
    }

    async fn record_sale(&self, id: &EventId, quantity: u32) -> Result<Event, StoreError> {
        self.latency.pause().await;
        self.modify(id, |event| {
            let available = event.remaining_capacity();
            if quantity > available {
                return Err(StoreError::InsufficientCapacity {
                    requested: quantity,
                    available,
                });
            }
            event.tickets_sold += quantity;
            Ok(())
        })
        .await
    }
}

/// Catalog written on first start: three events one, two and three months
/// ahead.
#[must_use]
pub fn sample_events() -> Vec<Event> {
    let today = Utc::now()
        .with_hour(0)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or_else(Utc::now);
    let at = |days: i64, hour: i64| today + Duration::days(days) + Duration::hours(hour);

    vec![
        Event {
            id: EventId::new("1"),
            name: "Summer Music Festival".to_string(),
            date: at(30, 18),
            location: "Central Park, New York".to_string(),
            description: "Join us for a day of amazing music performances featuring top artists from around the world.".to_string(),
            image_url: "https://images.unsplash.com/photo-1501281668745-f7f57925c3b4?auto=format&fit=crop&w=1470&q=80".to_string(),
            capacity: 5000,
            ticket_price: Decimal::new(75, 0),
            tickets_sold: 2150,
        },
        Event {
            id: EventId::new("2"),
            name: "Tech Conference".to_string(),
            date: at(60, 9),
            location: "Convention Center, San Francisco".to_string(),
            description: "The biggest tech conference of the year featuring keynotes, workshops, and networking opportunities.".to_string(),
            image_url: "https://images.unsplash.com/photo-1540575467063-178a50c2df87?auto=format&fit=crop&w=1470&q=80".to_string(),
            capacity: 2000,
            ticket_price: Decimal::new(299, 0),
            tickets_sold: 1200,
        },
        Event {
            id: EventId::new("3"),
            name: "Comedy Night".to_string(),
            date: at(90, 20),
            location: "Laugh Factory, Los Angeles".to_string(),
            description: "A night of laughter with top comedians performing their best stand-up routines.".to_string(),
            image_url: "https://images.unsplash.com/photo-1610964199131-5e29387e6267?auto=format&fit=crop&w=1470&q=80".to_string(),
            capacity: 500,
            ticket_price: Decimal::new(45, 0),
            tickets_sold: 350,
        },
    ]
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn catalog() -> LocalCatalog {
        LocalCatalog::new(Arc::new(MemoryStorage::new()), SimulatedLatency::NONE)
    }

    fn new_event(capacity: u32) -> NewEvent {
        NewEvent {
            name: "Jazz Evening".to_string(),
            date: Utc::now() + Duration::days(3),
            location: "Blue Note".to_string(),
            description: String::new(),
            image_url: String::new(),
            capacity,
            ticket_price: Decimal::new(50, 0),
        }
    }

    #[tokio::test]
    async fn seeds_once_and_not_after_emptying() {
        let catalog = catalog();
        assert!(matches!(catalog.seed_if_absent().await, Ok(true)));
        assert_eq!(catalog.list().await.unwrap_or_default().len(), 3);

        for id in ["1", "2", "3"] {
            let _ = catalog.delete(&EventId::new(id)).await;
        }
        assert!(matches!(catalog.seed_if_absent().await, Ok(false)));
        assert!(catalog.list().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let catalog = catalog();
        let _ = catalog.seed_if_absent().await;
        let Ok(created) = catalog.create(new_event(10)).await else {
            panic!("create should succeed");
        };
        assert_eq!(created.id.as_str(), "4");
        assert_eq!(created.tickets_sold, 0);
    }

    #[tokio::test]
    async fn record_sale_consumes_capacity_and_rejects_overdraw() {
        let catalog = catalog();
        let Ok(created) = catalog.create(new_event(2)).await else {
            panic!("create should succeed");
        };
        let Ok(sold) = catalog.record_sale(&created.id, 2).await else {
            panic!("sale within capacity should succeed");
        };
        assert_eq!(sold.remaining_capacity(), 0);
        assert!(matches!(
            catalog.record_sale(&created.id, 1).await,
            Err(StoreError::InsufficientCapacity { available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let catalog = catalog();
        let id = EventId::new("99");
        assert!(matches!(catalog.get(&id).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(catalog.delete(&id).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(
            catalog.update(&id, &EventPatch::default()).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn sample_events_are_upcoming() {
        let now = Utc::now();
        assert!(sample_events().iter().all(|e| e.date > now));
    }
}
