//! Attestation lookup boundary.
//!
//! The waiter polls through the [`AttestationLookup`] trait so tests can
//! script response sequences without a live HTTP endpoint. [`IrisLookup`] is
//! the production implementation against Circle's Iris API.

use alloy_primitives::{hex, FixedBytes};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::attestation::response::AttestationResponse;
use crate::error::{CrosspayError, Result};

/// Attestation service environment URLs.
pub const IRIS_API: &str = "https://iris-api.circle.com";
pub const IRIS_API_SANDBOX: &str = "https://iris-api-sandbox.circle.com";

/// Attestation API path.
const ATTESTATION_PATH: &str = "/v1/attestations/";

/// HTTP timeout for a single lookup request.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for attestation retrieval.
///
/// This is typically called repeatedly (polling) until the attestation
/// status becomes `Complete`.
#[async_trait]
pub trait AttestationLookup: Send + Sync {
    /// Fetches attestation status and data for a message hash.
    ///
    /// # Errors
    ///
    /// Returns `AttestationNotFound` when the service has not yet seen the
    /// message (HTTP 404), and other errors for transport failures or
    /// unexpected status codes. The waiter absorbs all of these inside its
    /// bounded retry loop.
    async fn get_attestation(&self, message_hash: FixedBytes<32>) -> Result<AttestationResponse>;
}

/// Production attestation lookup over Circle's Iris API.
#[derive(Debug, Clone)]
pub struct IrisLookup {
    base_url: Url,
    client: Client,
}

impl IrisLookup {
    /// Creates a lookup against the given base URL
    /// (e.g. <https://iris-api.circle.com>).
    pub fn new(base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(CrosspayError::Network)?;
        Ok(Self { base_url, client })
    }

    /// Creates a lookup for the production environment.
    pub fn production() -> Result<Self> {
        Self::new(Url::parse(IRIS_API).expect("static URL is valid"))
    }

    /// Creates a lookup for the sandbox (testnet) environment.
    pub fn sandbox() -> Result<Self> {
        Self::new(Url::parse(IRIS_API_SANDBOX).expect("static URL is valid"))
    }

    /// Constructs the lookup URL for a message hash.
    ///
    /// The digest is hex without a `0x` prefix, appended to the attestation
    /// path.
    pub fn attestation_url(&self, message_hash: FixedBytes<32>) -> Result<Url> {
        self.base_url
            .join(&format!("{ATTESTATION_PATH}{}", hex::encode(message_hash)))
            .map_err(|e| CrosspayError::InvalidUrl {
                reason: format!("failed to construct attestation URL: {e}"),
            })
    }
}

#[async_trait]
impl AttestationLookup for IrisLookup {
    async fn get_attestation(&self, message_hash: FixedBytes<32>) -> Result<AttestationResponse> {
        let url = self.attestation_url(message_hash)?;
        trace!(url = %url, event = "attestation_lookup_request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(CrosspayError::Network)?;

        // Rate limiting carries a Retry-After hint; surfaced for logging,
        // the waiter keeps its fixed cadence regardless.
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(300);

            debug!(
                retry_after_seconds = retry_after,
                event = "attestation_rate_limited"
            );
            return Err(CrosspayError::RateLimitExceeded {
                retry_after_seconds: retry_after,
            });
        }

        // 404 means the attestation does not exist yet.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(event = "attestation_not_found");
            return Err(CrosspayError::AttestationNotFound);
        }

        response.error_for_status_ref()?;

        let attestation: AttestationResponse = response.json().await?;
        debug!(status = ?attestation.status, event = "attestation_response_parsed");

        Ok(attestation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attestation_url_format_sandbox() {
        let lookup = IrisLookup::sandbox().unwrap();
        let hash = FixedBytes::from([0x12; 32]);
        let url = lookup.attestation_url(hash).unwrap();
        insta::assert_snapshot!(url.as_str(), @"https://iris-api-sandbox.circle.com/v1/attestations/1212121212121212121212121212121212121212121212121212121212121212");
    }

    #[test]
    fn test_attestation_url_format_production() {
        let lookup = IrisLookup::production().unwrap();
        let hash = FixedBytes::from([0xff; 32]);
        let url = lookup.attestation_url(hash).unwrap();
        insta::assert_snapshot!(url.as_str(), @"https://iris-api.circle.com/v1/attestations/ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
    }

    #[test]
    fn test_attestation_url_has_no_hex_prefix() {
        let lookup = IrisLookup::production().unwrap();
        let url = lookup.attestation_url(FixedBytes::ZERO).unwrap();
        assert!(!url.as_str().contains("0x"));
    }
}
