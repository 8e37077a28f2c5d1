//! In-memory wallet and ProofPerks contract
//!
//! Executes the contract's claim rules locally so the full pipeline can run without
//! a node (`--simulate` on the CLI) and under test. Failure knobs cover the wallet
//! behaviors the pipeline has to handle: rejected prompts, unknown networks, failed
//! estimation and reverted receipts.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{SolError, SolInterface, SolValue};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

use crate::chain::contract::{
    AlreadyClaimed, CampaignExpired, IProofPerks::IProofPerksCalls, InvalidCampaign,
};
use crate::chain::network::NetworkDescriptor;
use crate::chain::wallet::{CallRequest, TxReceipt, WalletProvider};
use crate::domain::NewCampaign;
use crate::error::ChainError;

/// Gas reported by a successful estimate
pub const SIMULATED_GAS_ESTIMATE: u64 = 150_000;

/// 10 gwei
pub const SIMULATED_GAS_PRICE: u128 = 10_000_000_000;

/// Placeholder runtime bytecode reported for the simulated contract
const SIMULATED_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

#[derive(Debug, Clone, Default)]
struct SimCampaign {
    details: NewCampaign,
    minted: u64,
    claimed: u64,
    burned: u64,
    views: u64,
    claimers: HashSet<Address>,
}

#[derive(Debug, Default)]
struct SimState {
    chain_id: u64,
    networks: HashMap<u64, NetworkDescriptor>,
    accounts: Vec<Address>,
    reject_accounts: bool,
    reject_switch: bool,
    reject_add: bool,
    ignore_switch: bool,
    contract: Option<Address>,
    reject_next_send: bool,
    fail_estimate: bool,
    fail_gas_price: bool,
    revert_receipts: bool,
    campaigns: Vec<SimCampaign>,
    proofs: HashMap<(Address, U256), U256>,
    native: HashMap<Address, U256>,
    receipts: HashMap<B256, TxReceipt>,
    sent: Vec<CallRequest>,
    block: u64,
}

fn reverted(error: impl SolError) -> ChainError {
    ChainError::new("execution reverted")
        .with_rpc_code(3)
        .with_data(error.abi_encode())
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

impl SimState {
    fn campaign_index(&self, campaign_id: U256) -> Result<usize, ChainError> {
        u64::try_from(campaign_id)
            .ok()
            .and_then(|id| usize::try_from(id).ok())
            .filter(|idx| *idx < self.campaigns.len())
            .ok_or_else(|| reverted(InvalidCampaign { campaignId: campaign_id }))
    }

    fn proof_balance(&self, account: Address, campaign_id: U256) -> U256 {
        self.proofs
            .get(&(account, campaign_id))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Contract-side checks; no state is touched
    fn check(&self, request: &CallRequest) -> Result<(), ChainError> {
        if request.data.is_empty() {
            let balance = request
                .from
                .map(|from| self.native.get(&from).copied().unwrap_or_default())
                .unwrap_or_default();
            if balance < request.value {
                return Err(ChainError::new(
                    "insufficient funds for gas * price + value",
                )
                .with_rpc_code(-32000));
            }
            return Ok(());
        }

        let call = IProofPerksCalls::abi_decode(&request.data)
            .map_err(|e| ChainError::new(format!("execution reverted: {e}")).with_rpc_code(3))?;
        match call {
            IProofPerksCalls::mintProof(c) => {
                let idx = self.campaign_index(c._campaignId)?;
                let expiry = self.campaigns[idx].details.expiry;
                if expiry != 0 && expiry <= now_secs() {
                    return Err(reverted(CampaignExpired {
                        campaignId: c._campaignId,
                        expiryTime: U256::from(expiry),
                    }));
                }
                if self.proof_balance(c._to, c._campaignId) > U256::ZERO {
                    return Err(reverted(AlreadyClaimed {
                        user: c._to,
                        campaignId: c._campaignId,
                    }));
                }
                Ok(())
            }
            IProofPerksCalls::burnProof(c) => {
                self.campaign_index(c._campaignId)?;
                if self.proof_balance(c._from, c._campaignId) == U256::ZERO {
                    return Err(ChainError::new("execution reverted: no proof to burn")
                        .with_rpc_code(3));
                }
                Ok(())
            }
            IProofPerksCalls::createCampaign(_) => Ok(()),
            _ => Err(ChainError::new("execution reverted: not a transaction").with_rpc_code(3)),
        }
    }

    fn apply(&mut self, request: &CallRequest) -> Result<(), ChainError> {
        if request.data.is_empty() {
            let from = request.from.unwrap_or_default();
            let sender = self.native.entry(from).or_default();
            *sender -= request.value;
            *self.native.entry(request.to).or_default() += request.value;
            return Ok(());
        }

        let call = IProofPerksCalls::abi_decode(&request.data)
            .map_err(|e| ChainError::new(format!("execution reverted: {e}")))?;
        match call {
            IProofPerksCalls::mintProof(c) => {
                let idx = self.campaign_index(c._campaignId)?;
                *self.proofs.entry((c._to, c._campaignId)).or_default() += U256::from(1u8);
                let campaign = &mut self.campaigns[idx];
                campaign.minted += 1;
                campaign.claimed += 1;
                campaign.claimers.insert(c._to);
            }
            IProofPerksCalls::burnProof(c) => {
                let idx = self.campaign_index(c._campaignId)?;
                *self.proofs.entry((c._from, c._campaignId)).or_default() -= U256::from(1u8);
                self.campaigns[idx].burned += 1;
            }
            IProofPerksCalls::createCampaign(c) => {
                self.campaigns.push(SimCampaign {
                    details: NewCampaign {
                        title: c.title,
                        category: c.category,
                        reward: c.reward,
                        image_url: c.imageUrl,
                        location: c.location,
                        expiry: u64::try_from(c.expiry).unwrap_or(u64::MAX),
                        tags: c.tags,
                    },
                    ..SimCampaign::default()
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn read(&self, request: &CallRequest) -> Result<Bytes, ChainError> {
        let call = IProofPerksCalls::abi_decode(&request.data)
            .map_err(|e| ChainError::new(format!("execution reverted: {e}")).with_rpc_code(3))?;
        let output = match call {
            IProofPerksCalls::balanceOf(c) => self.proof_balance(c.account, c.id).abi_encode(),
            IProofPerksCalls::currentCampaignId(_) => {
                U256::from(self.campaigns.len()).abi_encode()
            }
            IProofPerksCalls::getCampaignById(c) => {
                let c = &self.campaigns[self.campaign_index(c.campaignId)?];
                (
                    c.details.title.clone(),
                    c.details.category.clone(),
                    c.details.reward.clone(),
                    c.details.image_url.clone(),
                    c.details.location.clone(),
                    U256::from(c.details.expiry),
                    c.details.tags.clone(),
                    U256::from(c.minted),
                    U256::from(c.claimed),
                    U256::from(c.burned),
                    U256::from(c.views),
                )
                    .abi_encode_params()
            }
            IProofPerksCalls::getCampaignStats(c) => {
                let c = &self.campaigns[self.campaign_index(c.campaignId)?];
                (
                    U256::from(c.claimers.len()),
                    U256::from(c.minted),
                    U256::from(c.claimed),
                    U256::from(c.burned),
                )
                    .abi_encode_params()
            }
            _ => {
                return Err(ChainError::new("execution reverted: not a view function")
                    .with_rpc_code(3))
            }
        };
        Ok(Bytes::from(output))
    }
}

/// Wallet plus contract living entirely in memory
#[derive(Debug)]
pub struct SimulatedWallet {
    state: Mutex<SimState>,
}

impl SimulatedWallet {
    /// A wallet currently on `network`, which it already knows about
    pub fn new(network: NetworkDescriptor) -> Self {
        let mut state = SimState {
            chain_id: network.chain_id,
            ..SimState::default()
        };
        state.networks.insert(network.chain_id, network);
        Self {
            state: Mutex::new(state),
        }
    }

    /// A wallet on a chain it knows nothing else about
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                chain_id,
                ..SimState::default()
            }),
        }
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.state.get_mut().accounts.push(account);
        self
    }

    pub fn with_native_balance(mut self, account: Address, wei: U256) -> Self {
        self.state.get_mut().native.insert(account, wei);
        self
    }

    pub fn with_campaign(mut self, campaign: NewCampaign) -> Self {
        self.state.get_mut().campaigns.push(SimCampaign {
            details: campaign,
            ..SimCampaign::default()
        });
        self
    }

    /// Seed a campaign with existing usage counters
    pub fn with_campaign_counters(
        mut self,
        campaign: NewCampaign,
        minted: u64,
        claimed: u64,
        burned: u64,
        views: u64,
    ) -> Self {
        self.state.get_mut().campaigns.push(SimCampaign {
            details: campaign,
            minted,
            claimed,
            burned,
            views,
            claimers: HashSet::new(),
        });
        self
    }

    /// `eth_requestAccounts` answers with a user rejection
    pub fn rejecting_accounts(mut self) -> Self {
        self.state.get_mut().reject_accounts = true;
        self
    }

    /// `wallet_switchEthereumChain` answers with a user rejection
    pub fn rejecting_switch(mut self) -> Self {
        self.state.get_mut().reject_switch = true;
        self
    }

    /// `wallet_addEthereumChain` answers with a user rejection
    pub fn rejecting_add(mut self) -> Self {
        self.state.get_mut().reject_add = true;
        self
    }

    /// `wallet_switchEthereumChain` reports success but leaves the chain unchanged
    pub fn ignoring_switch(mut self) -> Self {
        self.state.get_mut().ignore_switch = true;
        self
    }

    /// Only `address` holds contract code; by default every address does
    pub fn deployed_at(mut self, address: Address) -> Self {
        self.state.get_mut().contract = Some(address);
        self
    }

    pub async fn reject_next_transaction(&self) {
        self.state.lock().await.reject_next_send = true;
    }

    pub async fn fail_gas_estimation(&self, fail: bool) {
        self.state.lock().await.fail_estimate = fail;
    }

    pub async fn fail_gas_price(&self, fail: bool) {
        self.state.lock().await.fail_gas_price = fail;
    }

    /// Include transactions but mark their receipts as reverted
    pub async fn revert_receipts(&self, revert: bool) {
        self.state.lock().await.revert_receipts = revert;
    }

    pub async fn proof_balance(&self, account: Address, campaign_id: U256) -> U256 {
        self.state.lock().await.proof_balance(account, campaign_id)
    }

    pub async fn sent_transactions(&self) -> Vec<CallRequest> {
        self.state.lock().await.sent.clone()
    }

    pub async fn knows_chain(&self, chain_id: u64) -> bool {
        self.state.lock().await.networks.contains_key(&chain_id)
    }
}

#[async_trait]
impl WalletProvider for SimulatedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError> {
        let state = self.state.lock().await;
        if state.reject_accounts {
            return Err(ChainError::user_rejected());
        }
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.state.lock().await.chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ChainError> {
        let mut state = self.state.lock().await;
        if state.reject_switch {
            return Err(ChainError::user_rejected());
        }
        if !state.networks.contains_key(&chain_id) {
            return Err(ChainError::unrecognized_chain(chain_id));
        }
        if !state.ignore_switch {
            state.chain_id = chain_id;
        }
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ChainError> {
        let mut state = self.state.lock().await;
        if state.reject_add {
            return Err(ChainError::user_rejected());
        }
        state.networks.insert(network.chain_id, network.clone());
        Ok(())
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ChainError> {
        self.state.lock().await.read(request)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChainError> {
        let state = self.state.lock().await;
        if state.fail_estimate {
            return Err(ChainError::new("gas estimation failed").with_rpc_code(-32000));
        }
        state.check(request)?;
        Ok(SIMULATED_GAS_ESTIMATE)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        if self.state.lock().await.fail_gas_price {
            return Err(ChainError::new("gas price unavailable").with_rpc_code(-32603));
        }
        Ok(SIMULATED_GAS_PRICE)
    }

    async fn balance(&self, account: Address) -> Result<U256, ChainError> {
        Ok(self
            .state
            .lock()
            .await
            .native
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ChainError> {
        let deployed = match self.state.lock().await.contract {
            Some(contract) => contract == address,
            None => true,
        };
        Ok(if deployed {
            Bytes::from_static(SIMULATED_CODE)
        } else {
            Bytes::new()
        })
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<B256, ChainError> {
        let mut state = self.state.lock().await;
        if std::mem::take(&mut state.reject_next_send) {
            return Err(ChainError::user_rejected());
        }
        state.check(request)?;

        let success = !state.revert_receipts;
        if success {
            state.apply(request)?;
        }
        state.sent.push(request.clone());
        state.block += 1;

        let nonce = state.sent.len() as u64;
        let tx_hash = keccak256([request.data.as_ref(), &nonce.to_be_bytes()[..]].concat());
        let receipt = TxReceipt {
            tx_hash,
            block_number: Some(state.block),
            success,
        };
        state.receipts.insert(tx_hash, receipt);
        debug!("Simulated tx {} in block {}", tx_hash, state.block);
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, ChainError> {
        Ok(self.state.lock().await.receipts.get(&tx_hash).copied())
    }
}
