//! Minimal contract interfaces for the transfer pipeline.
//!
//! Only the functions and events the pipeline actually touches are declared:
//! USDC approval and balance reads, the messenger's burn entry point with its
//! `MessageSent` event, and the transmitter's mint entry point.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};

use crate::chain::rpc::ChainRpc;
use crate::error::Result;

sol!(
    #[allow(missing_docs)]
    contract Usdc {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
);

sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    contract TokenMessenger {
        function depositForBurn(uint256 amount, uint32 destinationDomain, bytes32 mintRecipient, address burnToken) external returns (uint64 nonce);
        event MessageSent(bytes message);
    }
);

sol!(
    #[allow(missing_docs)]
    contract MessageTransmitter {
        function receiveMessage(bytes message, bytes attestation) external returns (bool success);
    }
);

/// Reads the token balance of an account via `balanceOf`.
pub async fn balance_of<R: ChainRpc>(rpc: &R, token: Address, account: Address) -> Result<U256> {
    let calldata = Usdc::balanceOfCall { account }.abi_encode();
    let request = TransactionRequest::default()
        .with_to(token)
        .with_input(calldata);

    let data = rpc.call(request).await?;
    Ok(Usdc::balanceOfCall::abi_decode_returns(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, B256};
    use alloy_sol_types::SolEvent;

    #[test]
    fn test_message_sent_signature_matches_onchain_topic() {
        let expected: B256 = keccak256(b"MessageSent(bytes)");
        assert_eq!(TokenMessenger::MessageSent::SIGNATURE_HASH, expected);
    }

    #[test]
    fn test_mint_recipient_word_round_trip() {
        // CCTP addresses recipients as 32-byte left-padded words; padding and
        // unpadding must recover the original 20-byte address.
        let address: Address = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d"
            .parse()
            .unwrap();
        let word = address.into_word();

        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(Address::from_word(word), address);
    }
}
