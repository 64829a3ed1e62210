//! Chain RPC boundary.
//!
//! All blockchain access goes through the [`ChainRpc`] trait: nonce lookup,
//! gas price, view calls, and signed submission. Tests inject fakes that
//! simulate reverts, RPC failures, and scripted receipts; production wraps an
//! Alloy provider whose wallet filler holds the account's key material.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, Log, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::{BlockId, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{CrosspayError, Result};

/// Which transaction count to read for an account.
///
/// `Pending` includes transactions still in the mempool; `Latest` only those
/// already mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceKind {
    Pending,
    Latest,
}

/// The confirmed record of a submitted transaction.
///
/// Read-only once produced; the pipeline extracts emitted events from `logs`
/// and checks `success` before advancing.
#[derive(Debug, Clone)]
pub struct TxConfirmation {
    pub transaction_hash: TxHash,
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Trait for chain read/write operations.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Returns the account's transaction count at the given tag.
    async fn transaction_count(&self, account: Address, kind: NonceKind) -> Result<u64>;

    /// Returns the current network gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Executes a read-only contract call and returns the raw return data.
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Signs, broadcasts, and confirms a transaction, returning its receipt.
    ///
    /// Blocks until the transaction is mined. Signing happens inside the
    /// implementation; the request carries the resolved nonce and gas price.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxConfirmation>;
}

/// Production chain access wrapping an Alloy [`Provider`].
///
/// The provider is expected to carry a wallet filler for the submitting
/// account, so `send_transaction` signs locally before broadcasting.
#[derive(Debug, Clone)]
pub struct AlloyChainRpc<P> {
    provider: P,
}

impl<P> AlloyChainRpc<P>
where
    P: Provider<Ethereum> + Clone,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns a reference to the underlying Alloy provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> ChainRpc for AlloyChainRpc<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
{
    async fn transaction_count(&self, account: Address, kind: NonceKind) -> Result<u64> {
        let block_id = match kind {
            NonceKind::Pending => BlockId::pending(),
            NonceKind::Latest => BlockId::latest(),
        };
        let count = self
            .provider
            .get_transaction_count(account)
            .block_id(block_id)
            .await
            .map_err(|e| CrosspayError::Provider(e.to_string()))?;

        trace!(
            account = %account,
            kind = ?kind,
            count = count,
            event = "transaction_count_retrieved"
        );
        Ok(count)
    }

    async fn gas_price(&self) -> Result<u128> {
        let price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| CrosspayError::Provider(e.to_string()))?;

        trace!(gas_price = price, event = "gas_price_retrieved");
        Ok(price)
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.provider
            .call(request)
            .await
            .map_err(|e| CrosspayError::Provider(e.to_string()))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxConfirmation> {
        let pending = self.provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();
        debug!(tx_hash = %tx_hash, event = "transaction_broadcast");

        let receipt = pending.get_receipt().await.map_err(|e| {
            CrosspayError::ChainSubmission {
                reason: format!("failed to confirm transaction {tx_hash}: {e}"),
            }
        })?;

        Ok(confirmation_from_receipt(&receipt))
    }
}

/// Flattens an RPC receipt into the pipeline's confirmation record.
fn confirmation_from_receipt(receipt: &TransactionReceipt) -> TxConfirmation {
    // All Alloy receipt envelope variants carry the same inner receipt shape.
    let (success, logs) = match &receipt.inner {
        alloy_rpc_types::ReceiptEnvelope::Legacy(r)
        | alloy_rpc_types::ReceiptEnvelope::Eip2930(r)
        | alloy_rpc_types::ReceiptEnvelope::Eip1559(r)
        | alloy_rpc_types::ReceiptEnvelope::Eip4844(r)
        | alloy_rpc_types::ReceiptEnvelope::Eip7702(r) => (
            r.receipt.status.coerce_status(),
            r.receipt.logs.iter().map(|log| log.inner.clone()).collect(),
        ),
    };

    TxConfirmation {
        transaction_hash: receipt.transaction_hash,
        success,
        logs,
    }
}
