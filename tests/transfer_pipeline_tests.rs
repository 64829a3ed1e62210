//! End-to-end pipeline tests against fake chain and attestation boundaries.

use alloy_chains::NamedChain;
use alloy_primitives::{address, keccak256, Address, Bytes, Log, TxHash, U256};
use alloy_sol_types::{SolCall, SolEvent};
use std::time::Duration;

use crosspay::contracts::{MessageTransmitter, TokenMessenger};
use crosspay::testing::{encode_balance, FakeAttestationLookup, FakeChainRpc, FakeClock};
use crosspay::{
    AttestationWaiter, ChainTxBuilder, CrosspayError, PollingConfig, TransferOrchestrator,
    TransferRequest, TransferStage, TxConfirmation,
};

const SENDER: Address = address!("00000000000000000000000000000000000000a1");
const RECIPIENT: Address = address!("00000000000000000000000000000000000000b2");
const SOURCE_TOKEN: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");
const DESTINATION_TOKEN: Address = address!("75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");
const SOURCE_MESSENGER: Address = address!("9f3B8679c73C2Fef8b59B4f3444d4e156fb70AA5");
const DESTINATION_TRANSMITTER: Address = address!("aCF1ceeF35caAc005e15888dDb8A3515C41B4872");

const ONE_USDC: u64 = 1_000_000;

fn transfer_request(amount_units: u64) -> TransferRequest {
    TransferRequest::builder()
        .amount_units(U256::from(amount_units))
        .source_chain(NamedChain::Sepolia)
        .destination_chain(NamedChain::ArbitrumSepolia)
        .source_token(SOURCE_TOKEN)
        .destination_token(DESTINATION_TOKEN)
        .source_messenger(SOURCE_MESSENGER)
        .destination_transmitter(DESTINATION_TRANSMITTER)
        .mint_recipient(RECIPIENT)
        .destination_domain(3)
        .build()
}

fn tx_builder(rpc: FakeChainRpc, chain: NamedChain) -> ChainTxBuilder<FakeChainRpc> {
    ChainTxBuilder::builder()
        .rpc(rpc)
        .chain(chain)
        .sender(SENDER)
        .build()
}

fn orchestrator(
    source: FakeChainRpc,
    destination: FakeChainRpc,
    lookup: FakeAttestationLookup,
    polling: PollingConfig,
) -> TransferOrchestrator<FakeChainRpc, FakeChainRpc, FakeAttestationLookup, FakeClock> {
    TransferOrchestrator::builder()
        .request(transfer_request(ONE_USDC))
        .source(tx_builder(source, NamedChain::Sepolia))
        .destination(tx_builder(destination, NamedChain::ArbitrumSepolia))
        .waiter(AttestationWaiter::new(lookup, FakeClock::new()))
        .polling(polling)
        .build()
}

fn burn_confirmation(message: &Bytes) -> TxConfirmation {
    let event = TokenMessenger::MessageSent {
        message: message.clone(),
    };
    TxConfirmation {
        transaction_hash: TxHash::from([0x02; 32]),
        success: true,
        logs: vec![Log {
            address: SOURCE_MESSENGER,
            data: event.encode_log_data(),
        }],
    }
}

fn confirmation(hash_byte: u8) -> TxConfirmation {
    TxConfirmation {
        transaction_hash: TxHash::from([hash_byte; 32]),
        success: true,
        logs: Vec::new(),
    }
}

#[tokio::test]
async fn test_full_pipeline_approve_burn_attest_mint() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(5 * ONE_USDC)));
    source.set_gas_price(100);

    let message = Bytes::from(vec![0x11, 0x22, 0x33, 0x44]);
    let message_hash = keccak256(&message);
    source.push_confirmation(confirmation(0x01));
    source.push_confirmation(burn_confirmation(&message));

    let destination = FakeChainRpc::new();
    destination.set_gas_price(200);
    destination.push_confirmation(confirmation(0x03));

    let attestation = Bytes::from(vec![0xab, 0xcd, 0xef]);
    let lookup = FakeAttestationLookup::new();
    lookup.add_complete_response(message_hash, attestation.clone());

    let receipts = orchestrator(
        source.clone(),
        destination.clone(),
        lookup.clone(),
        PollingConfig::default(),
    )
    .execute()
    .await
    .unwrap();

    assert_eq!(receipts.approve_tx, TxHash::from([0x01; 32]));
    assert_eq!(receipts.burn_tx, TxHash::from([0x02; 32]));
    assert_eq!(receipts.mint_tx, TxHash::from([0x03; 32]));
    assert_eq!(receipts.message_hash, message_hash);

    // Approve and burn on the source chain, mint on the destination.
    assert_eq!(source.submission_count(), 2);
    assert_eq!(destination.submission_count(), 1);
    assert_eq!(lookup.call_count(message_hash), 1);

    // The mint replays the burn message verbatim with the attestation.
    let mint_request = destination.submitted().pop().unwrap();
    let calldata = mint_request.input.input.unwrap();
    let mint_call = MessageTransmitter::receiveMessageCall::abi_decode(&calldata).unwrap();
    assert_eq!(mint_call.message, message);
    assert_eq!(mint_call.attestation, attestation);
}

#[tokio::test]
async fn test_insufficient_balance_halts_before_any_submission() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(ONE_USDC / 2)));

    let destination = FakeChainRpc::new();
    let lookup = FakeAttestationLookup::new();

    let failure = orchestrator(
        source.clone(),
        destination.clone(),
        lookup,
        PollingConfig::default(),
    )
    .execute()
    .await
    .unwrap_err();

    assert_eq!(failure.stage, TransferStage::CheckedBalance);
    assert!(matches!(
        failure.source,
        CrosspayError::InsufficientFunds { balance, required }
            if balance == U256::from(ONE_USDC / 2) && required == U256::from(ONE_USDC)
    ));

    // No gas spent: nothing was submitted on either chain.
    assert_eq!(source.submission_count(), 0);
    assert_eq!(destination.submission_count(), 0);
}

#[tokio::test]
async fn test_burn_without_message_event_halts_before_attestation() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(2 * ONE_USDC)));
    source.push_confirmation(confirmation(0x01));
    // Burn confirms but emits no MessageSent log.
    source.push_confirmation(confirmation(0x02));

    let destination = FakeChainRpc::new();
    let lookup = FakeAttestationLookup::new();

    let failure = orchestrator(
        source,
        destination.clone(),
        lookup.clone(),
        PollingConfig::default(),
    )
    .execute()
    .await
    .unwrap_err();

    assert_eq!(failure.stage, TransferStage::Burned);
    assert!(matches!(
        failure.source,
        CrosspayError::EventNotFound { .. }
    ));
    assert_eq!(lookup.total_call_count(), 0);
    assert_eq!(destination.submission_count(), 0);
}

#[tokio::test]
async fn test_attestation_timeout_leaves_destination_untouched() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(2 * ONE_USDC)));

    let message = Bytes::from(vec![0x55, 0x66]);
    let message_hash = keccak256(&message);
    source.push_confirmation(confirmation(0x01));
    source.push_confirmation(burn_confirmation(&message));

    let destination = FakeChainRpc::new();
    let lookup = FakeAttestationLookup::new();
    lookup.add_always_pending(message_hash);

    let polling = PollingConfig::default()
        .with_max_attempts(3)
        .with_poll_interval(Duration::from_millis(10));
    let failure = orchestrator(source, destination.clone(), lookup.clone(), polling)
        .execute()
        .await
        .unwrap_err();

    assert_eq!(failure.stage, TransferStage::Attested);
    assert!(matches!(
        failure.source,
        CrosspayError::AttestationTimeout { attempts: 3, .. }
    ));
    assert_eq!(lookup.call_count(message_hash), 3);
    // Funds are burned but never minted; the destination saw nothing.
    assert_eq!(destination.submission_count(), 0);
}

#[tokio::test]
async fn test_reverted_approval_halts_the_pipeline() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(2 * ONE_USDC)));
    source.push_confirmation(TxConfirmation {
        transaction_hash: TxHash::from([0x01; 32]),
        success: false,
        logs: Vec::new(),
    });

    let destination = FakeChainRpc::new();
    let failure = orchestrator(
        source.clone(),
        destination.clone(),
        FakeAttestationLookup::new(),
        PollingConfig::default(),
    )
    .execute()
    .await
    .unwrap_err();

    assert_eq!(failure.stage, TransferStage::Approved);
    assert!(matches!(
        failure.source,
        CrosspayError::ChainSubmission { .. }
    ));
    assert_eq!(source.submission_count(), 1);
    assert_eq!(destination.submission_count(), 0);
}

#[tokio::test]
async fn test_submissions_carry_resolved_nonce_and_bumped_gas_price() {
    let source = FakeChainRpc::new();
    source.set_call_result(SOURCE_TOKEN, encode_balance(U256::from(2 * ONE_USDC)));
    source.set_transaction_count(SENDER, crosspay::NonceKind::Pending, 7);
    source.set_transaction_count(SENDER, crosspay::NonceKind::Latest, 5);
    source.set_gas_price(100);

    let message = Bytes::from(vec![0x01]);
    source.push_confirmation(confirmation(0x01));
    source.push_confirmation(burn_confirmation(&message));

    let destination = FakeChainRpc::new();
    let lookup = FakeAttestationLookup::new();
    lookup.add_complete_response(keccak256(&message), Bytes::from(vec![0xaa]));

    orchestrator(
        source.clone(),
        destination,
        lookup,
        PollingConfig::default(),
    )
    .execute()
    .await
    .unwrap();

    let submitted = source.submitted();
    let approve = &submitted[0];
    // Pending count wins over latest; gas price carries the 10% premium.
    assert_eq!(approve.nonce, Some(7));
    assert_eq!(approve.gas_price, Some(110));
    assert_eq!(approve.gas, Some(crosspay::APPROVE_GAS_LIMIT));
    assert_eq!(approve.from, Some(SENDER));

    let burn = &submitted[1];
    assert_eq!(burn.gas, Some(crosspay::BURN_GAS_LIMIT));

    // The burn call carries the recipient as a 32-byte word and the
    // configured destination domain.
    let calldata = burn.input.input.clone().unwrap();
    let burn_call = TokenMessenger::depositForBurnCall::abi_decode(&calldata).unwrap();
    assert_eq!(burn_call.amount, U256::from(ONE_USDC));
    assert_eq!(burn_call.destinationDomain, 3);
    assert_eq!(burn_call.mintRecipient, RECIPIENT.into_word());
    assert_eq!(burn_call.burnToken, SOURCE_TOKEN);
}
