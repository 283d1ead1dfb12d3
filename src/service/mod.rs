//! Service layer: the four storefront stores and the checkout wizard.
//!
//! Every store follows the same pattern: check the session → call the
//! backend → reconcile the in-memory list → persist → emit a
//! [`crate::domain::StoreEvent`] → log. Failures are recorded in the
//! store's [`StoreStatus`] and returned to the caller.

pub mod catalog_store;
pub mod checkout;
pub mod notification_store;
pub mod order_store;
pub mod session_store;

use std::future::Future;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

pub use catalog_store::CatalogStore;
pub use checkout::{Checkout, CheckoutQuote, CheckoutStep, PaymentDetails};
pub use notification_store::NotificationStore;
pub use order_store::OrderStore;
pub use session_store::SessionStore;

use crate::error::StoreError;

/// Loading flag and last error message of a store.
#[derive(Debug, Default)]
pub struct StoreStatus {
    in_flight: AtomicUsize,
    last_error: RwLock<Option<String>>,
}

/// Point-in-time copy of a [`StoreStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusSnapshot {
    /// Whether an operation is running.
    pub is_loading: bool,
    /// Message of the most recent failure, cleared by the next success.
    pub error: Option<String>,
}

impl StoreStatus {
    /// Runs `operation`, tracking the loading flag and recording its
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns the operation's error after recording its message.
    pub async fn track<T, F>(&self, action: &'static str, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let result = {
            let _in_flight = InFlight::enter(&self.in_flight);
            operation.await
        };
        match &result {
            Ok(_) => self.set_error(None),
            Err(err) => {
                tracing::warn!(action, error = %err, "store operation failed");
                self.set_error(Some(err.to_string()));
            }
        }
        result
    }

    /// Whether an operation is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the most recent failure.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|guard| guard.clone())
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            is_loading: self.is_loading(),
            error: self.last_error(),
        }
    }

    fn set_error(&self, message: Option<String>) {
        if let Ok(mut guard) = self.last_error.write() {
            *guard = message;
        }
    }
}

/// Counts one running operation until dropped, so an abandoned future
/// still clears the loading flag.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn records_and_clears_last_error() {
        let status = StoreStatus::default();
        let failed: Result<(), StoreError> = status
            .track("test", async { Err(StoreError::Validation("bad".to_string())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(status.last_error().as_deref(), Some("invalid request: bad"));
        assert!(!status.is_loading());

        let ok = status.track("test", async { Ok(1) }).await;
        assert!(matches!(ok, Ok(1)));
        assert!(status.last_error().is_none());
    }

    #[tokio::test]
    async fn abandoned_operation_clears_loading_flag() {
        let status = StoreStatus::default();
        let slow = status.track("slow", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
        assert!(timed_out.is_err());
        assert!(!status.is_loading());
    }
}
