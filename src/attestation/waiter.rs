//! Bounded attestation polling.
//!
//! [`AttestationWaiter`] polls the lookup service on a fixed interval up to a
//! hard attempt cap. This is the canonical bounded-retry shape for the whole
//! pipeline: fixed attempt budget, fixed linear delay, no backoff and no
//! jitter. The attestation service rate-limits completion externally, so
//! short-interval polling does not risk overload at this scale.

use alloy_primitives::{hex, FixedBytes};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::attestation::lookup::AttestationLookup;
use crate::attestation::response::{AttestationBytes, AttestationStatus};
use crate::clock::Clock;
use crate::error::{CrosspayError, Result};

/// Configuration for attestation polling behavior.
///
/// # Examples
///
/// ```rust
/// use crosspay::PollingConfig;
/// use std::time::Duration;
///
/// // Defaults: 30 attempts, 5 seconds apart
/// let config = PollingConfig::default();
///
/// let config = PollingConfig::default()
///     .with_max_attempts(20)
///     .with_poll_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of lookup attempts before giving up.
    pub max_attempts: u32,
    /// Delay between consecutive attempts.
    pub poll_interval: Duration,
}

impl Default for PollingConfig {
    /// 30 attempts, 5 seconds apart: a 2.5 minute budget matching the
    /// downstream payment listener's timeout window.
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl PollingConfig {
    /// Sets the maximum number of polling attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the delay between polling attempts.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the total wait budget (`max_attempts * poll_interval`).
    pub fn total_timeout(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

/// Polls the attestation lookup service until an attestation is complete or
/// the attempt budget is exhausted.
///
/// The wait is a plain future: dropping it cancels the in-flight lookup and
/// the pending sleep, so a caller-driven shutdown aborts polling without
/// leaking the underlying HTTP session.
#[derive(Debug, Clone)]
pub struct AttestationWaiter<L, C> {
    lookup: L,
    clock: C,
}

impl<L, C> AttestationWaiter<L, C>
where
    L: AttestationLookup,
    C: Clock,
{
    pub fn new(lookup: L, clock: C) -> Self {
        Self { lookup, clock }
    }

    /// Waits for the attestation of `message_hash`.
    ///
    /// Issues at most `config.max_attempts` lookups. The first response with
    /// status `complete` and a non-empty attestation payload returns the
    /// attestation bytes immediately. Pending statuses, 404s, transport
    /// errors, and unexpected HTTP codes are all absorbed and polling
    /// continues after `config.poll_interval`. There is no sleep after the
    /// final attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttestationTimeout` carrying the digest and the attempt count
    /// once the budget is exhausted, so the caller can direct an operator to
    /// check the attestation manually.
    pub async fn wait_for_attestation(
        &self,
        message_hash: FixedBytes<32>,
        config: PollingConfig,
    ) -> Result<AttestationBytes> {
        let started = self.clock.now();

        info!(
            message_hash = %hex::encode(message_hash),
            max_attempts = config.max_attempts,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            event = "attestation_polling_started"
        );

        for attempt in 1..=config.max_attempts {
            match self.lookup.get_attestation(message_hash).await {
                Ok(response) => match response.status {
                    AttestationStatus::Complete => {
                        match response.attestation.filter(|a| !a.is_empty()) {
                            Some(attestation) => {
                                info!(
                                    attempt = attempt,
                                    attestation_length_bytes = attestation.len(),
                                    event = "attestation_complete"
                                );
                                return Ok(attestation.to_vec());
                            }
                            // Complete without data is an inconsistent
                            // service response; treat as not yet ready.
                            None => warn!(
                                attempt = attempt,
                                event = "attestation_complete_without_data"
                            ),
                        }
                    }
                    status => debug!(
                        attempt = attempt,
                        status = ?status,
                        event = "attestation_not_ready"
                    ),
                },
                Err(CrosspayError::AttestationNotFound) => {
                    debug!(attempt = attempt, event = "attestation_not_found")
                }
                // Transient lookup failures must not abort the wait early.
                Err(e) => warn!(
                    attempt = attempt,
                    error = %e,
                    event = "attestation_lookup_failed"
                ),
            }

            if attempt < config.max_attempts {
                self.clock.sleep(config.poll_interval).await;
            }
        }

        error!(
            message_hash = %hex::encode(message_hash),
            attempts = config.max_attempts,
            elapsed_secs = (self.clock.now() - started).as_secs(),
            event = "attestation_timeout"
        );
        Err(CrosspayError::AttestationTimeout {
            message_hash,
            attempts: config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollingConfig::default();
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.total_timeout(), Duration::from_secs(150));
    }

    #[test]
    fn test_builder_methods() {
        let config = PollingConfig::default()
            .with_max_attempts(20)
            .with_poll_interval(Duration::from_millis(500));
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.total_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_is_copy() {
        let config = PollingConfig::default();
        let copied = config;
        assert_eq!(config, copied);
    }
}
