//! Time abstraction for polling loops.
//!
//! Attestation polling sleeps through the [`Clock`] trait rather than calling
//! `tokio::time::sleep` directly, so tests can fast-forward through polling
//! loops and timeouts without actually waiting.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Trait for time-based operations.
///
/// Production code uses [`TokioClock`]; tests implement a fake clock that
/// records sleeps and advances instantly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}

/// Production clock backed by Tokio's time functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
