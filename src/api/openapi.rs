//! OpenAPI document for the storefront API.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{admin, auth, events, notifications, purchases, system};
use crate::backend::SignUpProfile;
use crate::domain::{
    Event, EventId, EventPatch, NewEvent, Notification, NotificationId, NotificationKind,
    Purchase, PurchaseId, PurchaseStatus, Role, Session, SortBy, UserId,
};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::{CheckoutQuote, PaymentDetails, StatusSnapshot};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "ticketfront",
        description = "Ticket storefront: events, checkout, purchases and notifications."
    ),
    paths(
        system::health_handler,
        system::status_handler,
        auth::sign_in,
        auth::sign_up,
        auth::sign_out,
        auth::current_session,
        events::home,
        events::list_events,
        events::get_event,
        events::checkout_quote,
        purchases::create_purchase,
        purchases::pay_purchase,
        purchases::cancel_purchase,
        purchases::list_purchases,
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        admin::list_all_events,
        admin::create_event,
        admin::update_event,
        admin::delete_event,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        Event,
        EventId,
        EventPatch,
        NewEvent,
        Notification,
        NotificationId,
        NotificationKind,
        Purchase,
        PurchaseId,
        PurchaseStatus,
        Role,
        Session,
        SortBy,
        UserId,
        SignUpProfile,
        CheckoutQuote,
        PaymentDetails,
        StatusSnapshot,
        system::HealthResponse,
        dto::SignInRequest,
        dto::SessionResponse,
        dto::EventView,
        dto::EventListResponse,
        dto::HomeResponse,
        dto::CreatePurchaseRequest,
        dto::PurchaseListResponse,
        dto::NotificationListResponse,
        dto::CountResponse,
        dto::StoreStatusResponse,
    )),
    tags(
        (name = "System", description = "Health and store status"),
        (name = "Auth", description = "Sign-in, sign-up and session"),
        (name = "Events", description = "Catalog browsing and checkout quotes"),
        (name = "Purchases", description = "Ticket purchases"),
        (name = "Notifications", description = "User notifications"),
        (name = "Admin", description = "Event management"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/purchases/{id}/pay"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/admin/events/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
