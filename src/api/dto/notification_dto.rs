//! Notification DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Notification;

/// Response body for `GET /api/v1/notifications`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// Notifications, newest first.
    pub data: Vec<Notification>,
    /// Number of unread notifications.
    pub unread_count: usize,
}
