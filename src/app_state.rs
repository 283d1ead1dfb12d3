//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::context::StorefrontContext;
use crate::domain::EventBus;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every storefront store.
    pub context: Arc<StorefrontContext>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wraps a started context.
    #[must_use]
    pub fn new(context: Arc<StorefrontContext>) -> Self {
        let event_bus = context.event_bus.clone();
        Self { context, event_bus }
    }
}
