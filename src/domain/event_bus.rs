//! Broadcast channel for store events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every store
//! mutation publishes a [`StoreEvent`] through the bus, and WebSocket
//! connections subscribe to receive the topics they asked for.

use tokio::sync::broadcast;

use super::StoreEvent;

/// Broadcast bus for [`StoreEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. Without
    /// receivers the event is dropped.
    pub fn publish(&self, event: StoreEvent) -> usize {
        tracing::trace!(event_type = event.event_type_str(), "publishing store event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EventId;
    use chrono::Utc;

    fn deleted(id: &str) -> StoreEvent {
        StoreEvent::EventDeleted {
            event_id: EventId::new(id),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(deleted("1")), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(deleted("7")), 2);

        let Ok(StoreEvent::EventDeleted { event_id, .. }) = rx1.recv().await else {
            panic!("rx1 should receive the deletion");
        };
        assert_eq!(event_id.as_str(), "7");
        let Ok(second) = rx2.recv().await else {
            panic!("rx2 should receive the deletion");
        };
        assert_eq!(second.event_type_str(), "event_deleted");
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
