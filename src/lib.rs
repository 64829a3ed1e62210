//! # crosspay
//!
//! Cross-chain USDC payment orchestration over the burn-and-mint bridge
//! protocol, with a tool-invocation session for arming downstream payment
//! services.
//!
//! The crate covers the full transfer pipeline:
//!
//! 1. **Balance pre-flight**: verify the sender holds enough USDC.
//! 2. **Approve**: grant the token messenger an allowance on the source chain.
//! 3. **Burn**: call `depositForBurn` and extract the emitted bridge message.
//! 4. **Attest**: poll the attestation service until the message is signed.
//! 5. **Mint**: submit `receiveMessage` on the destination chain.
//!
//! Each external boundary (chain RPC, attestation lookup, clock) is a trait,
//! so the pipeline runs unmodified against fakes in tests. See [`testing`]
//! for the fake implementations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use alloy_chains::NamedChain;
//! use alloy_primitives::{address, U256};
//! use crosspay::{
//!     AttestationWaiter, ChainTxBuilder, IrisLookup, PollingConfig, TokioClock,
//!     TransferOrchestrator, TransferRequest,
//! };
//!
//! # async fn run(
//! #     source_rpc: impl crosspay::ChainRpc,
//! #     destination_rpc: impl crosspay::ChainRpc,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let request = TransferRequest::builder()
//!     .amount_units(U256::from(1_000_000u64)) // 1 USDC
//!     .source_chain(NamedChain::Sepolia)
//!     .destination_chain(NamedChain::ArbitrumSepolia)
//!     .source_token(address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"))
//!     .destination_token(address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"))
//!     .source_messenger(address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5"))
//!     .destination_transmitter(address!("aCF1ceeF35caAc005e15888dDb8A3515C41B4872"))
//!     .mint_recipient(address!("0000000000000000000000000000000000000001"))
//!     .destination_domain(3)
//!     .build();
//!
//! let sender = address!("0000000000000000000000000000000000000001");
//! let orchestrator = TransferOrchestrator::builder()
//!     .request(request)
//!     .source(
//!         ChainTxBuilder::builder()
//!             .rpc(source_rpc)
//!             .chain(NamedChain::Sepolia)
//!             .sender(sender)
//!             .build(),
//!     )
//!     .destination(
//!         ChainTxBuilder::builder()
//!             .rpc(destination_rpc)
//!             .chain(NamedChain::ArbitrumSepolia)
//!             .sender(sender)
//!             .build(),
//!     )
//!     .waiter(AttestationWaiter::new(IrisLookup::sandbox()?, TokioClock))
//!     .polling(PollingConfig::default())
//!     .build();
//!
//! let receipts = orchestrator.execute().await?;
//! println!("minted in {}", receipts.mint_tx);
//! # Ok(())
//! # }
//! ```

mod attestation;
mod chain;
mod clock;
mod error;
mod monitor;
mod session;
pub mod testing;
mod transfer;

pub use attestation::{
    AttestationBytes, AttestationLookup, AttestationResponse, AttestationStatus,
    AttestationWaiter, IrisLookup, PollingConfig, IRIS_API, IRIS_API_SANDBOX,
};
pub use chain::{
    balance_of, bump_gas_price, contracts, extract_event, AlloyChainRpc, ChainRpc, ChainTxBuilder,
    NonceKind, TxConfirmation, APPROVE_GAS_LIMIT, BURN_GAS_LIMIT, MINT_GAS_LIMIT,
};
pub use clock::{Clock, TokioClock};
pub use error::{CrosspayError, Result};
pub use monitor::{format_units, BalanceMonitor, USDC_DECIMALS};
pub use session::{
    decode_invocation_result, parse_payment_task_status, OperationInfo, PaymentTaskStatus,
    ServerIdentity, ToolInvocationResult, ToolSession,
};
pub use transfer::{
    BurnMessage, TransferFailure, TransferOrchestrator, TransferReceipts, TransferRequest,
    TransferStage,
};
