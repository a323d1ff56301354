//! Inter-request delay
//!
//! The delay is a floor, not a rate: it is slept in full before every
//! document request, so spacing between downloads is the delay plus
//! whatever the previous request took.

use std::time::Duration;

/// Mandatory pause before each per-record request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Sleeps for the configured delay
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
