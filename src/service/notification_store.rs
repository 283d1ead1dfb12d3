//! Notification sink backed by local storage.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{StatusSnapshot, StoreStatus};
use crate::domain::{
    EventBus, NewNotification, Notification, NotificationId, Session, StoreEvent, UserId,
};
use crate::error::StoreError;
use crate::storage::{KeyValueStorage, keys, load_collection, save_collection};

/// User notifications, newest first.
///
/// Persisted under [`keys::NOTIFICATIONS`]; every change rewrites the whole
/// collection.
#[derive(Debug)]
pub struct NotificationStore {
    storage: Arc<dyn KeyValueStorage>,
    notifications: RwLock<Vec<Notification>>,
    event_bus: EventBus,
    status: StoreStatus,
}

impl NotificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, event_bus: EventBus) -> Self {
        Self {
            storage,
            notifications: RwLock::new(Vec::new()),
            event_bus,
            status: StoreStatus::default(),
        }
    }

    /// Loads the persisted notifications.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] for an unreadable collection.
    pub async fn load(&self) -> Result<usize, StoreError> {
        self.status
            .track("load notifications", async {
                let stored: Vec<Notification> =
                    load_collection(self.storage.as_ref(), keys::NOTIFICATIONS).await?;
                let count = stored.len();
                *self.notifications.write().await = stored;
                Ok(count)
            })
            .await
    }

    /// Delivers a notification and simulates the matching e-mail.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the collection cannot be written.
    pub async fn send(&self, new: NewNotification) -> Result<Notification, StoreError> {
        self.status
            .track("send notification", async {
                let notification = new.into_notification(NotificationId::generate());
                {
                    let mut list = self.notifications.write().await;
                    let mut next = Vec::with_capacity(list.len() + 1);
                    next.push(notification.clone());
                    next.extend(list.iter().cloned());
                    save_collection(self.storage.as_ref(), keys::NOTIFICATIONS, next.as_slice()).await?;
                    *list = next;
                }

                tracing::info!(
                    to = %notification.user_id,
                    subject = %notification.title,
                    body = %notification.message,
                    "email sent"
                );
                let _ = self.event_bus.publish(StoreEvent::NotificationSent {
                    notification_id: notification.id.clone(),
                    user_id: notification.user_id.clone(),
                    title: notification.title.clone(),
                    timestamp: Utc::now(),
                });
                Ok(notification)
            })
            .await
    }

    /// Marks one notification read. Marking a read notification is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::Forbidden`] for another user's notification.
    pub async fn mark_read(
        &self,
        actor: &Session,
        id: &NotificationId,
    ) -> Result<Notification, StoreError> {
        self.status
            .track("mark notification read", async {
                let mut list = self.notifications.write().await;
                let mut next = list.clone();
                let notification = next
                    .iter_mut()
                    .find(|n| &n.id == id)
                    .ok_or_else(|| StoreError::not_found("notification", id))?;
                ensure_recipient(actor, notification)?;
                if notification.is_read {
                    return Ok(notification.clone());
                }
                notification.is_read = true;
                let updated = notification.clone();
                save_collection(self.storage.as_ref(), keys::NOTIFICATIONS, next.as_slice()).await?;
                *list = next;
                drop(list);

                let _ = self.event_bus.publish(StoreEvent::NotificationsRead {
                    user_id: updated.user_id.clone(),
                    count: 1,
                    timestamp: Utc::now(),
                });
                Ok(updated)
            })
            .await
    }

    /// Marks every notification of `user` read and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the collection cannot be written.
    pub async fn mark_all_read(&self, user: &UserId) -> Result<usize, StoreError> {
        self.status
            .track("mark all notifications read", async {
                let mut list = self.notifications.write().await;
                let mut next = list.clone();
                let mut changed = 0;
                for notification in next.iter_mut().filter(|n| &n.user_id == user && !n.is_read) {
                    notification.is_read = true;
                    changed += 1;
                }
                if changed == 0 {
                    return Ok(0);
                }
                save_collection(self.storage.as_ref(), keys::NOTIFICATIONS, next.as_slice()).await?;
                *list = next;
                drop(list);

                let _ = self.event_bus.publish(StoreEvent::NotificationsRead {
                    user_id: user.clone(),
                    count: changed,
                    timestamp: Utc::now(),
                });
                Ok(changed)
            })
            .await
    }

    /// Deletes one notification.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::Forbidden`] for another user's notification.
    pub async fn delete(&self, actor: &Session, id: &NotificationId) -> Result<(), StoreError> {
        self.status
            .track("delete notification", async {
                let mut list = self.notifications.write().await;
                let position = list
                    .iter()
                    .position(|n| &n.id == id)
                    .ok_or_else(|| StoreError::not_found("notification", id))?;
                let mut next = list.clone();
                let removed = next.remove(position);
                ensure_recipient(actor, &removed)?;
                save_collection(self.storage.as_ref(), keys::NOTIFICATIONS, next.as_slice()).await?;
                *list = next;
                drop(list);

                let _ = self.event_bus.publish(StoreEvent::NotificationDeleted {
                    notification_id: removed.id,
                    user_id: removed.user_id,
                    timestamp: Utc::now(),
                });
                Ok(())
            })
            .await
    }

    /// Notifications of `user`, newest first.
    pub async fn for_user(&self, user: &UserId) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| &n.user_id == user)
            .cloned()
            .collect()
    }

    /// Number of unread notifications of `user`.
    pub async fn unread_count(&self, user: &UserId) -> usize {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| &n.user_id == user && !n.is_read)
            .count()
    }

    /// Loading flag and last error.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }
}

fn ensure_recipient(actor: &Session, notification: &Notification) -> Result<(), StoreError> {
    if actor.can_act_for(&notification.user_id) {
        Ok(())
    } else {
        Err(StoreError::Forbidden(
            "notification belongs to another user".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{NotificationKind, Role};
    use crate::storage::MemoryStorage;

    fn store(storage: &Arc<MemoryStorage>) -> NotificationStore {
        NotificationStore::new(
            Arc::clone(storage) as Arc<dyn KeyValueStorage>,
            EventBus::new(16),
        )
    }

    fn session(id: &str) -> Session {
        Session {
            user_id: UserId::new(id),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role: Role::User,
        }
    }

    fn system(user: &str, title: &str) -> NewNotification {
        NewNotification {
            user_id: UserId::new(user),
            kind: NotificationKind::System,
            title: title.to_string(),
            message: "hello".to_string(),
            event_id: None,
            purchase_id: None,
        }
    }

    #[tokio::test]
    async fn send_prepends_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = store(&storage);
        let _ = sink.send(system("u1", "first")).await;
        let _ = sink.send(system("u1", "second")).await;
        let _ = sink.send(system("u2", "other")).await;

        let titles: Vec<String> = sink
            .for_user(&UserId::new("u1"))
            .await
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(sink.unread_count(&UserId::new("u1")).await, 2);

        let reloaded = store(&storage);
        assert!(matches!(reloaded.load().await, Ok(3)));
        assert_eq!(
            reloaded.for_user(&UserId::new("u1")).await,
            sink.for_user(&UserId::new("u1")).await
        );
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = store(&storage);
        let Ok(sent) = sink.send(system("u1", "hi")).await else {
            panic!("send should succeed");
        };
        let actor = session("u1");

        let Ok(first) = sink.mark_read(&actor, &sent.id).await else {
            panic!("first mark should succeed");
        };
        let Ok(second) = sink.mark_read(&actor, &sent.id).await else {
            panic!("second mark should succeed");
        };
        assert!(first.is_read);
        assert_eq!(first, second);
        assert_eq!(sink.unread_count(&actor.user_id).await, 0);
    }

    #[tokio::test]
    async fn mark_all_read_is_scoped_to_user() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = store(&storage);
        let _ = sink.send(system("u1", "a")).await;
        let _ = sink.send(system("u1", "b")).await;
        let _ = sink.send(system("u2", "c")).await;

        assert!(matches!(sink.mark_all_read(&UserId::new("u1")).await, Ok(2)));
        assert!(matches!(sink.mark_all_read(&UserId::new("u1")).await, Ok(0)));
        assert_eq!(sink.unread_count(&UserId::new("u2")).await, 1);
    }

    #[tokio::test]
    async fn delete_checks_recipient_and_existence() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = store(&storage);
        let Ok(sent) = sink.send(system("u1", "a")).await else {
            panic!("send should succeed");
        };

        assert!(matches!(
            sink.delete(&session("u2"), &sent.id).await,
            Err(StoreError::Forbidden(_))
        ));
        assert_eq!(sink.for_user(&UserId::new("u1")).await.len(), 1);

        assert!(sink.delete(&session("u1"), &sent.id).await.is_ok());
        assert!(matches!(
            sink.delete(&session("u1"), &sent.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(sink.status().error.is_some());
    }
}
