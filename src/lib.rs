//! # ticketfront
//!
//! State layer of a ticket storefront: visitors browse events, sign in,
//! buy tickets through a three-step checkout and read notifications;
//! administrators manage the event catalog.
//!
//! The four stores either call the storefront's remote HTTP services or
//! simulate them against local key/value storage, and are exposed to a
//! view layer through a JSON API and a WebSocket push channel.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── StorefrontContext (context)
//!     │     ├── SessionStore ─┐
//!     │     ├── CatalogStore  ├── EventBus (domain/)
//!     │     ├── OrderStore    │
//!     │     └── NotificationStore
//!     │
//!     ├── Backends (backend/): remote HTTP | local simulation
//!     │
//!     └── KeyValueStorage (storage/): memory | JSON file
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod backend;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;
pub mod ws;
