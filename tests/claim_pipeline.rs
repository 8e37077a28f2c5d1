//! End-to-end claim attempts against the in-memory wallet and contract.

use alloy::primitives::{address, Address, B256, U256};
use async_trait::async_trait;
use proofperks::chain::contract::encode_mint_proof;
use proofperks::chain::{
    CallRequest, ChainSession, NetworkDescriptor, SimulatedWallet, TxReceipt, WalletProvider,
};
use proofperks::domain::{ClaimOutcome, ClaimRequest, ClaimState, NewCampaign, NormalizedParams};
use proofperks::error::ChainError;
use proofperks::tx::{classify_error, ClaimOrchestrator, ErrorKind, GasEstimator, RevertArgs};
use proofperks::config::GasConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const HOLDER: Address = address!("1111111111111111111111111111111111111111");
const CONTRACT: Address = address!("171499691fcf4d6da32749f81a9293bb2726b478");

fn coffee() -> NewCampaign {
    NewCampaign {
        title: "Coffee Shop Rewards".to_string(),
        category: "Food & Beverage".to_string(),
        reward: "Free Coffee".to_string(),
        location: "Downtown".to_string(),
        tags: vec!["coffee".to_string()],
        ..NewCampaign::default()
    }
}

fn expired() -> NewCampaign {
    NewCampaign {
        title: "Last Year".to_string(),
        reward: "Nothing".to_string(),
        expiry: 1,
        ..NewCampaign::default()
    }
}

fn wallet() -> SimulatedWallet {
    SimulatedWallet::new(NetworkDescriptor::xrpl_evm_sidechain())
        .with_account(HOLDER)
        .with_campaign(coffee())
        .with_campaign(coffee())
        .with_campaign(expired())
}

async fn session_for(wallet: Arc<dyn WalletProvider>) -> ChainSession {
    ChainSession::connect(
        Some(wallet),
        NetworkDescriptor::xrpl_evm_sidechain(),
        CONTRACT,
        true,
    )
    .await
    .unwrap()
    .with_receipt_poll(Duration::from_millis(5))
}

fn holder_hex() -> String {
    format!("{HOLDER:?}")
}

#[tokio::test]
async fn claim_mints_exactly_one_proof() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    for id in 0..2u64 {
        let outcome = orchestrator
            .claim(&session, &ClaimRequest::new(holder_hex(), id))
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Minted { .. }));
        assert_eq!(
            wallet.proof_balance(HOLDER, U256::from(id)).await,
            U256::from(1u8)
        );
    }
    assert_eq!(wallet.sent_transactions().await.len(), 2);
    assert_eq!(orchestrator.status().state, ClaimState::Success);
}

#[tokio::test]
async fn second_claim_reports_already_claimed_and_sends_nothing() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();
    let request = ClaimRequest::new(holder_hex(), "1");

    let first = orchestrator.claim(&session, &request).await.unwrap();
    assert!(!first.is_already_claimed());
    let second = orchestrator.claim(&session, &request).await.unwrap();
    assert!(second.is_already_claimed());
    assert_eq!(second.tx_hash(), None);

    assert_eq!(wallet.sent_transactions().await.len(), 1);
    assert_eq!(wallet.proof_balance(HOLDER, U256::from(1u8)).await, U256::from(1u8));
}

#[tokio::test]
async fn unknown_campaign_fails_before_submitting() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    let failure = orchestrator
        .claim(&session, &ClaimRequest::new(holder_hex(), 7u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::InvalidCampaign);
    assert_eq!(failure.stage, ClaimState::Checking);
    assert!(wallet.sent_transactions().await.is_empty());
    assert_eq!(orchestrator.status().state, ClaimState::Failed);
}

#[tokio::test]
async fn invalid_address_never_reaches_the_chain() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    let failure = orchestrator
        .claim(&session, &ClaimRequest::new("0x123", 0u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::InvalidAddress);
    assert_eq!(failure.stage, ClaimState::Idle);
    assert!(wallet.sent_transactions().await.is_empty());
}

#[tokio::test]
async fn estimation_failure_falls_back_to_default_limit() {
    let wallet = Arc::new(wallet());
    wallet.fail_gas_estimation(true).await;
    wallet.fail_gas_price(true).await;
    let session = session_for(wallet.clone()).await;
    let gas = GasConfig::default();
    let orchestrator = ClaimOrchestrator::new(GasEstimator::new(gas.clone()));

    let outcome = orchestrator
        .claim(&session, &ClaimRequest::new(holder_hex(), 0u64))
        .await
        .unwrap();
    let ClaimOutcome::Minted { cost, .. } = outcome else {
        panic!("expected a mint");
    };
    assert_eq!(cost.gas_limit, gas.default_limit);
    assert_eq!(cost.gas_price, gas.default_price_wei());

    let sent = wallet.sent_transactions().await;
    assert_eq!(sent[0].gas_limit, Some(gas.default_limit));
}

#[tokio::test]
async fn user_rejection_is_classified() {
    let wallet = Arc::new(wallet());
    wallet.reject_next_transaction().await;
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    let failure = orchestrator
        .claim(&session, &ClaimRequest::new(holder_hex(), 0u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::UserRejection);
    assert_eq!(failure.stage, ClaimState::Submitting);
    assert_eq!(failure.error.message, "Transaction was rejected by the user");
    assert_eq!(wallet.proof_balance(HOLDER, U256::ZERO).await, U256::ZERO);
}

#[tokio::test]
async fn expired_campaign_revert_is_decoded() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    let failure = orchestrator
        .claim(&session, &ClaimRequest::new(holder_hex(), 2u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::CampaignExpired);
    assert!(matches!(
        failure.error.args,
        Some(RevertArgs::CampaignExpired { campaign_id, .. }) if campaign_id == U256::from(2u8)
    ));
}

#[tokio::test]
async fn already_claimed_revert_carries_user_and_campaign() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    ClaimOrchestrator::default()
        .claim(&session, &ClaimRequest::new(holder_hex(), 0u64))
        .await
        .unwrap();

    // Simulating the mint again hits the contract's own duplicate check
    let params = NormalizedParams {
        to: HOLDER,
        campaign_id: U256::ZERO,
        encrypted_data: Default::default(),
    };
    let request = CallRequest::new(CONTRACT, encode_mint_proof(&params)).from(HOLDER);
    let err = session.estimate_gas(&request).await.unwrap_err();

    let classified = classify_error(&err);
    assert_eq!(classified.kind, ErrorKind::AlreadyClaimed);
    assert_eq!(
        classified.args,
        Some(RevertArgs::AlreadyClaimed {
            user: HOLDER,
            campaign_id: U256::ZERO,
        })
    );
}

#[tokio::test]
async fn reverted_receipt_is_a_contract_error() {
    let wallet = Arc::new(wallet());
    wallet.revert_receipts(true).await;
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();

    let failure = orchestrator
        .claim(&session, &ClaimRequest::new(holder_hex(), 0u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::ContractError);
    assert_eq!(failure.stage, ClaimState::Confirming);
}

#[tokio::test]
async fn torn_down_session_refuses_claims() {
    let wallet = Arc::new(wallet());
    let session = session_for(wallet.clone()).await;
    assert!(!session.on_chain_changed(1));

    let failure = ClaimOrchestrator::default()
        .claim(&session, &ClaimRequest::new(holder_hex(), 0u64))
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::SessionClosed);
    assert!(wallet.sent_transactions().await.is_empty());
}

/// Holds `send_transaction` until released
struct GatedWallet {
    inner: SimulatedWallet,
    release: Notify,
}

#[async_trait]
impl WalletProvider for GatedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.inner.request_accounts().await
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.inner.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError> {
        self.inner.switch_chain(chain_id).await
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ChainError> {
        self.inner.add_chain(network).await
    }

    async fn call(&self, request: &CallRequest) -> Result<alloy::primitives::Bytes, ChainError> {
        self.inner.call(request).await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChainError> {
        self.inner.estimate_gas(request).await
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.inner.gas_price().await
    }

    async fn balance(&self, account: Address) -> Result<U256, ChainError> {
        self.inner.balance(account).await
    }

    async fn code_at(&self, address: Address) -> Result<alloy::primitives::Bytes, ChainError> {
        self.inner.code_at(address).await
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<B256, ChainError> {
        self.release.notified().await;
        self.inner.send_transaction(request).await
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, ChainError> {
        self.inner.transaction_receipt(tx_hash).await
    }
}

#[tokio::test]
async fn concurrent_claim_for_same_pair_is_refused() {
    let wallet = Arc::new(GatedWallet {
        inner: wallet(),
        release: Notify::new(),
    });
    let session = session_for(wallet.clone()).await;
    let orchestrator = ClaimOrchestrator::default();
    let request = ClaimRequest::new(holder_hex(), 0u64);

    let first = orchestrator.claim(&session, &request);
    let second = async {
        while !orchestrator.is_in_flight(HOLDER, U256::ZERO) {
            tokio::task::yield_now().await;
        }
        let refused = orchestrator.claim(&session, &request).await;
        wallet.release.notify_one();
        refused
    };

    let (first, second) = tokio::join!(first, second);
    assert!(matches!(first, Ok(ClaimOutcome::Minted { .. })));
    assert_eq!(second.unwrap_err().kind(), ErrorKind::ClaimInProgress);
    assert!(!orchestrator.is_in_flight(HOLDER, U256::ZERO));
    assert_eq!(
        wallet.inner.proof_balance(HOLDER, U256::ZERO).await,
        U256::from(1u8)
    );
}
