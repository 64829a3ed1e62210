//! Attestation lookup and bounded waiting.
//!
//! A burn on the source chain emits a message whose keccak256 digest keys an
//! off-chain attestation. This module polls the attestation service for that
//! digest until the attestation is complete or a fixed attempt budget runs
//! out.

mod lookup;
mod response;
mod waiter;

pub use lookup::{AttestationLookup, IrisLookup, IRIS_API, IRIS_API_SANDBOX};
pub use response::{AttestationBytes, AttestationResponse, AttestationStatus};
pub use waiter::{AttestationWaiter, PollingConfig};
