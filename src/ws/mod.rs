//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes [`crate::domain::StoreEvent`]s to
//! clients subscribed to their topic, and answers a `get_badge` command with
//! the session and unread notification count.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
