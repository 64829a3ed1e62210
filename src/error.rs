use alloy_primitives::{FixedBytes, U256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrosspayError {
    #[error("tool endpoint connection failed: {reason}")]
    Connection { reason: String },

    #[error("tool session is not connected")]
    NotConnected,

    #[error("tool invocation failed: {reason}")]
    ToolInvocation { reason: String },

    #[error("insufficient funds: balance {balance} below requested {required}")]
    InsufficientFunds { balance: U256, required: U256 },

    #[error("chain submission failed: {reason}")]
    ChainSubmission { reason: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("event {event} not found in transaction logs")]
    EventNotFound { event: &'static str },

    #[error("attestation not ready after {attempts} attempts for message {message_hash}")]
    AttestationTimeout {
        message_hash: FixedBytes<32>,
        attempts: u32,
    },

    #[error("attestation not found (will retry)")]
    AttestationNotFound,

    #[error("rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, CrosspayError>;
