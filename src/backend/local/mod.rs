//! Simulated backends persisting to local storage.
//!
//! These stand in for the remote services during development: the catalog
//! and the account list live in [`crate::storage`], tokens are issued by
//! the shared [`crate::auth::TokenCodec`], and every call can be slowed
//! down by a configurable latency.

mod catalog;
mod identity;
mod purchases;

use std::time::Duration;

pub use catalog::{LocalCatalog, sample_events};
pub use identity::{Account, LocalIdentity};
pub use purchases::LocalPurchases;

/// Artificial delay applied before each simulated call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedLatency(Duration);

impl SimulatedLatency {
    /// No delay.
    pub const NONE: Self = Self(Duration::ZERO);

    /// Delay of `millis` milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Sleeps for the configured delay.
    pub async fn pause(self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_configured_delay() {
        let started = tokio::time::Instant::now();
        SimulatedLatency::from_millis(500).pause().await;
        assert!(started.elapsed() >= Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        SimulatedLatency::NONE.pause().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
