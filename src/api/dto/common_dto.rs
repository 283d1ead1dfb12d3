//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::service::StatusSnapshot;

/// Loading flag and last error of every store, for `GET /api/v1/status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreStatusResponse {
    /// Session store.
    pub session: StatusSnapshot,
    /// Catalog store.
    pub catalog: StatusSnapshot,
    /// Order store.
    pub orders: StatusSnapshot,
    /// Notification sink.
    pub notifications: StatusSnapshot,
}

/// Number of items a bulk operation changed.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CountResponse {
    /// Changed items.
    pub count: usize,
}
