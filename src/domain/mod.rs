//! Domain layer: core types and the event system.
//!
//! This module contains the storefront's domain model: identifiers, the
//! signed-in session, catalog events, purchases with their lifecycle,
//! notifications, catalog listing queries, and the event bus that
//! broadcasts store mutations.

pub mod catalog_query;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod notification;
pub mod purchase;
pub mod session;
pub mod store_event;

pub use catalog_query::{DateWindow, EventQuery, SortBy};
pub use event::{Event, EventPatch, NewEvent};
pub use event_bus::EventBus;
pub use ids::{EventId, NotificationId, PurchaseId, UserId};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use purchase::{Purchase, PurchaseStatus};
pub use session::{Role, Session};
pub use store_event::{StoreEvent, Topic};
