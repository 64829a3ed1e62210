//! Test utilities and fake implementations.
//!
//! Fake versions of the chain, attestation, and clock boundaries enable
//! testing the full transfer pipeline without a live network, including
//! adversarial scenarios like reverts, flaky lookups, and timeouts. Used by
//! this crate's integration tests and available to downstream users.

use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::attestation::{AttestationLookup, AttestationResponse, AttestationStatus};
use crate::chain::{ChainRpc, NonceKind, TxConfirmation};
use crate::clock::Clock;
use crate::error::{CrosspayError, Result};

// ============================================================================
// Fake chain RPC
// ============================================================================

/// A fake chain RPC with scripted nonce counts, gas price, view-call results,
/// and submission receipts.
///
/// Every submitted transaction request is recorded, so tests can assert on
/// resolved nonces, gas prices, calldata, and submission counts.
#[derive(Clone, Debug, Default)]
pub struct FakeChainRpc {
    nonces: Arc<Mutex<HashMap<(Address, NonceKind), u64>>>,
    gas_price: Arc<Mutex<u128>>,
    call_results: Arc<Mutex<HashMap<Address, Bytes>>>,
    confirmations: Arc<Mutex<VecDeque<TxConfirmation>>>,
    submitted: Arc<Mutex<Vec<TransactionRequest>>>,
    submission_failure: Arc<Mutex<Option<String>>>,
}

impl FakeChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the transaction count for an account at a block tag.
    pub fn set_transaction_count(&self, account: Address, kind: NonceKind, count: u64) {
        self.nonces.lock().unwrap().insert((account, kind), count);
    }

    /// Scripts the network gas price.
    pub fn set_gas_price(&self, price: u128) {
        *self.gas_price.lock().unwrap() = price;
    }

    /// Scripts the raw return data for view calls to a contract address.
    pub fn set_call_result(&self, contract: Address, data: Bytes) {
        self.call_results.lock().unwrap().insert(contract, data);
    }

    /// Queues a confirmation returned by the next unscripted submission.
    pub fn push_confirmation(&self, confirmation: TxConfirmation) {
        self.confirmations.lock().unwrap().push_back(confirmation);
    }

    /// Makes every subsequent submission fail with the given reason.
    pub fn fail_submissions(&self, reason: impl Into<String>) {
        *self.submission_failure.lock().unwrap() = Some(reason.into());
    }

    /// Returns every transaction request submitted so far.
    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn transaction_count(&self, account: Address, kind: NonceKind) -> Result<u64> {
        Ok(self
            .nonces
            .lock()
            .unwrap()
            .get(&(account, kind))
            .copied()
            .unwrap_or(0))
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(*self.gas_price.lock().unwrap())
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        let Some(TxKind::Call(contract)) = request.to else {
            return Err(CrosspayError::Provider(
                "view call without a contract address".to_string(),
            ));
        };

        self.call_results
            .lock()
            .unwrap()
            .get(&contract)
            .cloned()
            .ok_or_else(|| {
                CrosspayError::Provider(format!("no scripted call result for {contract}"))
            })
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxConfirmation> {
        self.submitted.lock().unwrap().push(request);

        if let Some(reason) = self.submission_failure.lock().unwrap().clone() {
            return Err(CrosspayError::ChainSubmission { reason });
        }

        let sequence = self.submitted.lock().unwrap().len() as u8;
        Ok(self
            .confirmations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TxConfirmation {
                transaction_hash: TxHash::from([sequence; 32]),
                success: true,
                logs: Vec::new(),
            }))
    }
}

/// Encodes a `balanceOf` return value as raw call return data.
pub fn encode_balance(balance: U256) -> Bytes {
    Bytes::from(balance.to_be_bytes::<32>().to_vec())
}

// ============================================================================
// Fake attestation lookup
// ============================================================================

/// A fake attestation lookup that plays back scripted response sequences.
///
/// Each call returns the next response in the sequence; once exhausted, the
/// last response repeats. Hashes without a script return "not found".
#[derive(Clone, Debug, Default)]
pub struct FakeAttestationLookup {
    responses: Arc<Mutex<HashMap<alloy_primitives::FixedBytes<32>, Vec<AttestationResponse>>>>,
    call_counts: Arc<Mutex<HashMap<alloy_primitives::FixedBytes<32>, usize>>>,
}

impl FakeAttestationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a sequence of responses for a message hash, enabling state
    /// progressions like Pending → Complete.
    pub fn add_response_sequence(
        &self,
        message_hash: alloy_primitives::FixedBytes<32>,
        responses: Vec<AttestationResponse>,
    ) {
        self.responses
            .lock()
            .unwrap()
            .insert(message_hash, responses);
    }

    /// Scripts an immediately complete attestation.
    pub fn add_complete_response(
        &self,
        message_hash: alloy_primitives::FixedBytes<32>,
        attestation: Bytes,
    ) {
        self.add_response_sequence(
            message_hash,
            vec![AttestationResponse {
                status: AttestationStatus::Complete,
                attestation: Some(attestation),
            }],
        );
    }

    /// Scripts `pending_count` pending responses followed by a complete one.
    pub fn add_pending_then_complete(
        &self,
        message_hash: alloy_primitives::FixedBytes<32>,
        pending_count: usize,
        attestation: Bytes,
    ) {
        let mut responses = vec![
            AttestationResponse {
                status: AttestationStatus::Pending,
                attestation: None,
            };
            pending_count
        ];
        responses.push(AttestationResponse {
            status: AttestationStatus::Complete,
            attestation: Some(attestation),
        });
        self.add_response_sequence(message_hash, responses);
    }

    /// Scripts a response that stays pending forever (for timeout tests).
    pub fn add_always_pending(&self, message_hash: alloy_primitives::FixedBytes<32>) {
        self.add_response_sequence(
            message_hash,
            vec![AttestationResponse {
                status: AttestationStatus::Pending,
                attestation: None,
            }],
        );
    }

    /// Returns how many lookups have been issued for a message hash.
    pub fn call_count(&self, message_hash: alloy_primitives::FixedBytes<32>) -> usize {
        self.call_counts
            .lock()
            .unwrap()
            .get(&message_hash)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the total number of lookups across all hashes.
    pub fn total_call_count(&self) -> usize {
        self.call_counts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl AttestationLookup for FakeAttestationLookup {
    async fn get_attestation(
        &self,
        message_hash: alloy_primitives::FixedBytes<32>,
    ) -> Result<AttestationResponse> {
        let mut counts = self.call_counts.lock().unwrap();
        let index = counts.entry(message_hash).or_insert(0);
        let attempt = *index;
        *index += 1;
        drop(counts);

        let responses = self.responses.lock().unwrap();
        match responses.get(&message_hash) {
            Some(sequence) => Ok(sequence
                .get(attempt)
                .or_else(|| sequence.last())
                .cloned()
                .expect("scripted sequence is never empty")),
            None => Err(CrosspayError::AttestationNotFound),
        }
    }
}

// ============================================================================
// Fake clock
// ============================================================================

/// A fake clock that records sleeps and advances instantly.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forwards the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Total time "slept" through this clock.
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Number of sleep calls.
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
