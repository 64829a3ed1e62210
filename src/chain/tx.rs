//! Per-chain transaction building and submission.
//!
//! [`ChainTxBuilder`] resolves the nonce and gas price fresh at submission
//! time (both drift between pipeline steps as transactions land and network
//! congestion moves), then signs, submits, and waits for the confirmed
//! receipt through the chain's [`ChainRpc`].

use alloy_chains::NamedChain;
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolEvent;
use bon::Builder;
use tracing::{debug, info};

use crate::chain::rpc::{ChainRpc, NonceKind, TxConfirmation};
use crate::error::{CrosspayError, Result};

/// Gas limits for the pipeline's three contract calls.
pub const APPROVE_GAS_LIMIT: u64 = 100_000;
pub const BURN_GAS_LIMIT: u64 = 300_000;
pub const MINT_GAS_LIMIT: u64 = 300_000;

/// Applies the fixed 10% gas-price premium, rounded half-up.
///
/// A uniform bump that reduces the chance of an underpriced, stuck
/// transaction; not adaptive to observed failures.
pub fn bump_gas_price(base: u128) -> u128 {
    base.saturating_mul(11).saturating_add(5) / 10
}

/// Builds, signs, and submits contract calls from one account on one chain.
#[derive(Builder, Debug, Clone)]
pub struct ChainTxBuilder<R> {
    rpc: R,
    chain: NamedChain,
    sender: Address,
}

impl<R: ChainRpc> ChainTxBuilder<R> {
    /// Returns the chain this builder submits to.
    pub fn chain(&self) -> NamedChain {
        self.chain
    }

    /// Returns the submitting account.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Returns a reference to the chain RPC.
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Resolves the next usable nonce as `max(pending, latest)`.
    ///
    /// Taking the maximum guards against sending with a stale nonce while a
    /// prior transaction from this account is still in the mempool.
    pub async fn resolve_nonce(&self) -> Result<u64> {
        let pending = self
            .rpc
            .transaction_count(self.sender, NonceKind::Pending)
            .await?;
        let latest = self
            .rpc
            .transaction_count(self.sender, NonceKind::Latest)
            .await?;

        let nonce = pending.max(latest);
        debug!(
            account = %self.sender,
            chain = %self.chain,
            pending = pending,
            latest = latest,
            nonce = nonce,
            event = "nonce_resolved"
        );
        Ok(nonce)
    }

    /// Resolves the gas price as the current network price plus 10%.
    pub async fn resolve_gas_price(&self) -> Result<u128> {
        let base = self.rpc.gas_price().await?;
        let price = bump_gas_price(base);
        debug!(
            chain = %self.chain,
            base_gas_price = base,
            gas_price = price,
            event = "gas_price_resolved"
        );
        Ok(price)
    }

    /// Submits a contract call and waits for its confirmed receipt.
    ///
    /// Nonce and gas price are resolved fresh for every submission, never
    /// cached across calls. A reverted receipt fails with `ChainSubmission`;
    /// submissions are not retried here, the orchestrator decides whether a
    /// failure aborts the whole transfer.
    pub async fn submit(
        &self,
        contract: Address,
        calldata: Bytes,
        gas_limit: u64,
    ) -> Result<TxConfirmation> {
        let nonce = self.resolve_nonce().await?;
        let gas_price = self.resolve_gas_price().await?;

        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(contract)
            .with_input(calldata)
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price);

        let confirmation = self.rpc.send_transaction(request).await?;

        if !confirmation.success {
            return Err(CrosspayError::ChainSubmission {
                reason: format!(
                    "transaction {} reverted on {}",
                    confirmation.transaction_hash, self.chain
                ),
            });
        }

        info!(
            tx_hash = %confirmation.transaction_hash,
            chain = %self.chain,
            contract = %contract,
            nonce = nonce,
            event = "transaction_confirmed"
        );
        Ok(confirmation)
    }
}

/// Decodes a named event from a confirmation's logs.
///
/// Matches on the event's signature topic, so the burn message payload is
/// recovered without manual log parsing.
///
/// # Errors
///
/// Fails with `EventNotFound` when no log carries the event's signature.
pub fn extract_event<E: SolEvent>(confirmation: &TxConfirmation) -> Result<E> {
    let log = confirmation
        .logs
        .iter()
        .find(|log| {
            log.data
                .topics()
                .first()
                .is_some_and(|topic| *topic == E::SIGNATURE_HASH)
        })
        .ok_or(CrosspayError::EventNotFound { event: E::SIGNATURE })?;

    E::decode_log_data(&log.data).map_err(Into::into)
}
