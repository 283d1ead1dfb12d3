//! Purchase DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EventId, Purchase};

/// Request body for `POST /api/v1/purchases`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePurchaseRequest {
    /// Event to buy tickets for.
    pub event_id: EventId,
    /// Ticket count.
    pub quantity: u32,
}

/// Response body for `GET /api/v1/purchases`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseListResponse {
    /// Purchases of the signed-in user.
    pub data: Vec<Purchase>,
}
