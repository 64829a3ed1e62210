use alloy_chains::NamedChain;
use alloy_primitives::{Address, U256};
use bon::Builder;

/// Parameters for a single cross-chain transfer.
///
/// Immutable once orchestration starts; every address and the destination
/// domain id are supplied by the caller, never read from the environment.
#[derive(Builder, Debug, Clone)]
pub struct TransferRequest {
    /// Amount in the token's smallest denomination (1 USDC = 1_000_000).
    amount_units: U256,
    source_chain: NamedChain,
    destination_chain: NamedChain,
    /// Token contract burned on the source chain.
    source_token: Address,
    /// Token contract minted on the destination chain.
    destination_token: Address,
    /// Messenger contract that burns and emits the transfer message.
    source_messenger: Address,
    /// Transmitter contract that verifies the attestation and mints.
    destination_transmitter: Address,
    /// Recipient of the minted funds on the destination chain.
    mint_recipient: Address,
    /// Destination chain's domain id within the messaging protocol.
    destination_domain: u32,
}

impl TransferRequest {
    pub fn amount_units(&self) -> U256 {
        self.amount_units
    }

    pub fn source_chain(&self) -> NamedChain {
        self.source_chain
    }

    pub fn destination_chain(&self) -> NamedChain {
        self.destination_chain
    }

    pub fn source_token(&self) -> Address {
        self.source_token
    }

    pub fn destination_token(&self) -> Address {
        self.destination_token
    }

    pub fn source_messenger(&self) -> Address {
        self.source_messenger
    }

    pub fn destination_transmitter(&self) -> Address {
        self.destination_transmitter
    }

    pub fn mint_recipient(&self) -> Address {
        self.mint_recipient
    }

    pub fn destination_domain(&self) -> u32 {
        self.destination_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_request_builder() {
        let request = TransferRequest::builder()
            .amount_units(U256::from(1_000_000u64))
            .source_chain(NamedChain::Sepolia)
            .destination_chain(NamedChain::ArbitrumSepolia)
            .source_token(Address::ZERO)
            .destination_token(Address::ZERO)
            .source_messenger(Address::ZERO)
            .destination_transmitter(Address::ZERO)
            .mint_recipient(Address::ZERO)
            .destination_domain(3)
            .build();

        assert_eq!(request.amount_units(), U256::from(1_000_000u64));
        assert_eq!(request.destination_domain(), 3);
        assert_eq!(request.source_chain(), NamedChain::Sepolia);
    }
}
