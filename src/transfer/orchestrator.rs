//! End-to-end transfer pipeline.
//!
//! The orchestrator drives one transfer through a strictly linear state
//! machine:
//!
//! ```text
//! Start → CheckedBalance → Approved → Burned → Attested → Minted
//! ```
//!
//! Every transition is one-way and each step's output (nonce, message digest,
//! attestation) is a hard input of the next, so there is no internal
//! parallelism and no retry of a failed step: an already-burned message is
//! not safe to replay blindly, since a second burn would create a second
//! mintable message. A caller that wants retries re-invokes the whole
//! orchestrator.
//!
//! Nonce resolution is scoped to one account-chain pair and is not globally
//! locked: two orchestrations submitting from the *same* account concurrently
//! race on `resolve_nonce`. This is an accepted limitation; callers must not
//! run two transfers from one account at the same time.

use alloy_primitives::{keccak256, Bytes, FixedBytes, TxHash};
use alloy_sol_types::SolCall;
use bon::Builder;
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::attestation::{AttestationLookup, AttestationWaiter, PollingConfig};
use crate::chain::contracts::{self, MessageTransmitter, TokenMessenger, Usdc};
use crate::chain::{
    extract_event, ChainRpc, ChainTxBuilder, APPROVE_GAS_LIMIT, BURN_GAS_LIMIT, MINT_GAS_LIMIT,
};
use crate::clock::Clock;
use crate::error::CrosspayError;
use crate::transfer::request::TransferRequest;

/// Pipeline stages, in order. Failure reports name the stage being attempted
/// when the pipeline halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Start,
    CheckedBalance,
    Approved,
    Burned,
    Attested,
    Minted,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Start => "start",
            TransferStage::CheckedBalance => "checked_balance",
            TransferStage::Approved => "approved",
            TransferStage::Burned => "burned",
            TransferStage::Attested => "attested",
            TransferStage::Minted => "minted",
        };
        f.write_str(name)
    }
}

/// The raw message emitted by the burn, plus its content digest.
///
/// The digest keys the attestation lookup; the bytes are replayed verbatim to
/// the destination transmitter. Never mutated after extraction.
#[derive(Debug, Clone)]
pub struct BurnMessage {
    pub bytes: Vec<u8>,
    pub hash: FixedBytes<32>,
}

impl BurnMessage {
    fn from_event_payload(payload: Bytes) -> Self {
        let bytes = payload.to_vec();
        let hash = keccak256(&bytes);
        Self { bytes, hash }
    }
}

/// Transaction hashes of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipts {
    pub approve_tx: TxHash,
    pub burn_tx: TxHash,
    pub mint_tx: TxHash,
    pub message_hash: FixedBytes<32>,
}

/// Structured terminal failure: the stage the pipeline halted in plus the
/// underlying error, so a caller can tell whether funds are stuck
/// mid-pipeline (burned but not minted) or never moved at all.
#[derive(Debug, Error)]
#[error("transfer halted at {stage}: {source}")]
pub struct TransferFailure {
    pub stage: TransferStage,
    #[source]
    pub source: CrosspayError,
}

/// Drives one transfer: approve → burn → attest → mint.
///
/// The two [`ChainTxBuilder`]s own their chain's transport; the attestation
/// waiter owns the lookup session. No shared mutable state exists across
/// concurrent orchestrators beyond the per-account nonce caveat documented on
/// this module.
#[derive(Builder, Debug)]
pub struct TransferOrchestrator<S, D, L, C> {
    request: TransferRequest,
    source: ChainTxBuilder<S>,
    destination: ChainTxBuilder<D>,
    waiter: AttestationWaiter<L, C>,
    #[builder(default)]
    polling: PollingConfig,
}

impl<S, D, L, C> TransferOrchestrator<S, D, L, C>
where
    S: ChainRpc,
    D: ChainRpc,
    L: AttestationLookup,
    C: Clock,
{
    /// Executes the full pipeline.
    ///
    /// Pre-flight: the sender's source-chain token balance must cover the
    /// requested amount, checked before any transaction is submitted so an
    /// underfunded transfer spends no gas. After the burn confirms, the
    /// `MessageSent` payload and its keccak256 digest are extracted from the
    /// receipt; the mint is submitted only once the attestation for that
    /// digest has been returned. Exactly one burn message maps to exactly one
    /// attestation maps to exactly one mint submission.
    pub async fn execute(&self) -> Result<TransferReceipts, TransferFailure> {
        let request = &self.request;
        let sender = self.source.sender();

        // Balance pre-flight.
        let balance = contracts::balance_of(self.source.rpc(), request.source_token(), sender)
            .await
            .map_err(halted_at(TransferStage::CheckedBalance))?;

        if balance < request.amount_units() {
            return Err(TransferFailure {
                stage: TransferStage::CheckedBalance,
                source: CrosspayError::InsufficientFunds {
                    balance,
                    required: request.amount_units(),
                },
            });
        }

        info!(
            sender = %sender,
            balance = %balance,
            amount = %request.amount_units(),
            source_chain = %request.source_chain(),
            destination_chain = %request.destination_chain(),
            event = "transfer_preflight_passed"
        );

        // Approve the messenger's allowance on the source chain.
        let approve_calldata = Usdc::approveCall {
            spender: request.source_messenger(),
            amount: request.amount_units(),
        }
        .abi_encode();
        let approve = self
            .source
            .submit(
                request.source_token(),
                approve_calldata.into(),
                APPROVE_GAS_LIMIT,
            )
            .await
            .map_err(halted_at(TransferStage::Approved))?;

        // Burn. The nonce is re-resolved inside submit, not reused from the
        // approval.
        let burn_calldata = TokenMessenger::depositForBurnCall {
            amount: request.amount_units(),
            destinationDomain: request.destination_domain(),
            mintRecipient: request.mint_recipient().into_word(),
            burnToken: request.source_token(),
        }
        .abi_encode();
        let burn = self
            .source
            .submit(
                request.source_messenger(),
                burn_calldata.into(),
                BURN_GAS_LIMIT,
            )
            .await
            .map_err(halted_at(TransferStage::Burned))?;

        let message_sent: TokenMessenger::MessageSent =
            extract_event(&burn).map_err(halted_at(TransferStage::Burned))?;
        let message = BurnMessage::from_event_payload(message_sent.message);

        info!(
            burn_tx = %burn.transaction_hash,
            message_hash = %message.hash,
            message_length_bytes = message.bytes.len(),
            event = "burn_message_extracted"
        );

        // The only externally unbounded wait; hard attempt cap.
        let attestation = self
            .waiter
            .wait_for_attestation(message.hash, self.polling)
            .await
            .map_err(halted_at(TransferStage::Attested))?;

        // Mint on the destination chain with nonce and gas price resolved
        // fresh for that chain.
        let mint_calldata = MessageTransmitter::receiveMessageCall {
            message: message.bytes.clone().into(),
            attestation: attestation.into(),
        }
        .abi_encode();
        let mint = self
            .destination
            .submit(
                request.destination_transmitter(),
                mint_calldata.into(),
                MINT_GAS_LIMIT,
            )
            .await
            .map_err(halted_at(TransferStage::Minted))?;

        info!(
            approve_tx = %approve.transaction_hash,
            burn_tx = %burn.transaction_hash,
            mint_tx = %mint.transaction_hash,
            message_hash = %message.hash,
            event = "transfer_complete"
        );

        Ok(TransferReceipts {
            approve_tx: approve.transaction_hash,
            burn_tx: burn.transaction_hash,
            mint_tx: mint.transaction_hash,
            message_hash: message.hash,
        })
    }
}

fn halted_at(stage: TransferStage) -> impl FnOnce(CrosspayError) -> TransferFailure {
    move |source| TransferFailure { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_names() {
        assert_eq!(TransferStage::CheckedBalance.to_string(), "checked_balance");
        assert_eq!(TransferStage::Minted.to_string(), "minted");
    }

    #[test]
    fn test_burn_message_digest() {
        let payload = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);
        let message = BurnMessage::from_event_payload(payload.clone());

        assert_eq!(message.bytes, payload.to_vec());
        assert_eq!(message.hash, keccak256(payload));
    }

    #[test]
    fn test_failure_display_names_stage() {
        let failure = TransferFailure {
            stage: TransferStage::Attested,
            source: CrosspayError::AttestationTimeout {
                message_hash: FixedBytes::ZERO,
                attempts: 30,
            },
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("attested"));
    }
}
