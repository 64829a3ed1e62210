//! Chain access: the RPC boundary, contract bindings, and transaction
//! building with nonce and gas-price resolution.

pub mod contracts;
mod rpc;
mod tx;

pub use contracts::balance_of;
pub use rpc::{AlloyChainRpc, ChainRpc, NonceKind, TxConfirmation};
pub use tx::{
    bump_gas_price, extract_event, ChainTxBuilder, APPROVE_GAS_LIMIT, BURN_GAS_LIMIT,
    MINT_GAS_LIMIT,
};
