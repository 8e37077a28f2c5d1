//! Connected chain session
//!
//! A `ChainSession` is created per wallet connection, bound to one network and one
//! contract. It is passed by reference to every pipeline component and refuses to
//! operate once torn down (wallet disconnect, or a chain-changed notification to
//! another network).

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::chain::contract::{
    self, balanceOfCall, burnProofCall, createCampaignCall, currentCampaignIdCall,
    getCampaignByIdCall, getCampaignStatsCall,
};
use crate::chain::network::NetworkDescriptor;
use crate::chain::wallet::{detect_wallet, CallRequest, TxReceipt, WalletProvider};
use crate::config::AppConfig;
use crate::domain::{Campaign, CampaignStats, NewCampaign};
use crate::error::{ChainError, PerksError, Result};

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(2);

/// Upper bound on campaign ids read by a single listing
pub const MAX_LISTED_CAMPAIGNS: u64 = 10_000;

pub struct ChainSession {
    wallet: Arc<dyn WalletProvider>,
    network: NetworkDescriptor,
    contract: Address,
    account: Option<Address>,
    receipt_poll: Duration,
    active: AtomicBool,
}

impl ChainSession {
    /// Obtain a session bound to `network`.
    ///
    /// Switches the wallet to the target network when needed, registering it first
    /// if the wallet reports it as unknown (4902). With `require_signer` the wallet is
    /// asked for an authorized account. Fails with `ContractNotDeployed` when no
    /// ProofPerks contract answers at `contract`.
    #[instrument(skip(wallet, network), fields(chain = %network.chain_id_hex()))]
    pub async fn connect(
        wallet: Option<Arc<dyn WalletProvider>>,
        network: NetworkDescriptor,
        contract: Address,
        require_signer: bool,
    ) -> Result<Self> {
        let wallet = wallet.ok_or_else(|| {
            PerksError::NoWallet("no wallet provider found; configure an RPC endpoint".into())
        })?;

        ensure_network(wallet.as_ref(), &network).await?;
        ensure_contract(wallet.as_ref(), contract).await?;

        let account = if require_signer {
            Some(resolve_account(wallet.as_ref()).await?)
        } else {
            None
        };

        info!(
            "Chain session active on {} (account: {})",
            network.name,
            account.map(|a| a.to_string()).unwrap_or_else(|| "read-only".into())
        );

        Ok(Self {
            wallet,
            network,
            contract,
            account,
            receipt_poll: DEFAULT_RECEIPT_POLL,
            active: AtomicBool::new(true),
        })
    }

    /// Detect the wallet from configuration and connect to the configured network
    pub async fn from_config(config: &AppConfig, require_signer: bool) -> Result<Self> {
        let contract: Address = config.contract.address.parse().map_err(|e| {
            PerksError::Validation(format!(
                "contract.address {} is invalid: {}",
                config.contract.address, e
            ))
        })?;
        let wallet = detect_wallet(config)?;
        Self::connect(wallet, config.network.descriptor(), contract, require_signer)
            .await
            .map(|s| s.with_receipt_poll(Duration::from_millis(config.wallet.receipt_poll_ms)))
    }

    pub fn with_receipt_poll(mut self, interval: Duration) -> Self {
        self.receipt_poll = interval;
        self
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    /// The authorized account, for operations that sign
    pub fn signer(&self) -> Result<Address> {
        self.account.ok_or_else(|| {
            PerksError::NoAccount("session was opened without a signing account".into())
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(PerksError::SessionClosed)
        }
    }

    /// Close the session; later operations fail with `SessionClosed`
    pub fn teardown(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Chain session on {} torn down", self.network.name);
        }
    }

    /// Handle a wallet chain-changed notification. Returns whether the session is
    /// still usable.
    pub fn on_chain_changed(&self, chain_id: u64) -> bool {
        if chain_id != self.network.chain_id {
            warn!(
                "Wallet moved to chain {:#x}, expected {}",
                chain_id,
                self.network.chain_id_hex()
            );
            self.teardown();
        }
        self.is_active()
    }

    // ==================== Raw wallet access ====================

    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        self.ensure_active()?;
        Ok(self.wallet.estimate_gas(request).await?)
    }

    pub async fn gas_price(&self) -> Result<u128> {
        self.ensure_active()?;
        Ok(self.wallet.gas_price().await?)
    }

    /// Native-currency balance in wei
    pub async fn native_balance(&self, account: Address) -> Result<U256> {
        self.ensure_active()?;
        Ok(self.wallet.balance(account).await?)
    }

    /// Sign and broadcast from the session account
    pub async fn send(&self, request: CallRequest) -> Result<B256> {
        self.ensure_active()?;
        let from = self.signer()?;
        let tx_hash = self.wallet.send_transaction(&request.from(from)).await?;
        debug!("Transaction submitted: {}", tx_hash);
        Ok(tx_hash)
    }

    /// Poll until the transaction is included. No timeout is applied.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt> {
        loop {
            self.ensure_active()?;
            if let Some(receipt) = self.wallet.transaction_receipt(tx_hash).await? {
                debug!(
                    "Receipt for {}: block {:?}, success {}",
                    tx_hash, receipt.block_number, receipt.success
                );
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }

    // ==================== Contract access ====================

    /// Read-only contract call, decoded into the call's return type
    pub async fn call<C: SolCall>(&self, call: &C) -> Result<C::Return> {
        self.ensure_active()?;
        let request = CallRequest::new(self.contract, call.abi_encode());
        let output = self.wallet.call(&request).await?;
        Ok(C::abi_decode_returns(&output)?)
    }

    /// Send a contract transaction and wait for inclusion; reverted receipts are errors
    pub async fn transact<C: SolCall>(&self, call: &C) -> Result<TxReceipt> {
        let tx_hash = self
            .send(CallRequest::new(self.contract, call.abi_encode()))
            .await?;
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(ChainError::new(format!("transaction {tx_hash} reverted")).into());
        }
        Ok(receipt)
    }

    pub async fn current_campaign_id(&self) -> Result<U256> {
        self.call(&currentCampaignIdCall {}).await
    }

    pub async fn balance_of(&self, account: Address, campaign_id: U256) -> Result<U256> {
        self.call(&balanceOfCall {
            account,
            id: campaign_id,
        })
        .await
    }

    /// Number of campaigns created so far
    pub async fn campaign_count(&self) -> Result<u64> {
        let count = self.current_campaign_id().await?;
        u64::try_from(count)
            .map_err(|_| PerksError::InvalidCampaignData(format!("campaign count {count}")))
    }

    async fn ensure_campaign_exists(&self, id: u64) -> Result<()> {
        let count = self.campaign_count().await?;
        if id >= count {
            return Err(PerksError::InvalidCampaignId(format!(
                "campaign {id} does not exist ({count} campaigns)"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn campaign(&self, id: u64) -> Result<Campaign> {
        self.ensure_campaign_exists(id).await?;
        let raw = self
            .call(&getCampaignByIdCall {
                campaignId: U256::from(id),
            })
            .await?;
        contract::decode_campaign(id, raw)
    }

    /// All campaigns, skipping entries that fail to decode. At most
    /// `MAX_LISTED_CAMPAIGNS` ids are read.
    pub async fn campaigns(&self) -> Result<Vec<Campaign>> {
        let count = self.campaign_count().await?;
        if count > MAX_LISTED_CAMPAIGNS {
            warn!(
                "Contract reports {} campaigns, listing the first {}",
                count, MAX_LISTED_CAMPAIGNS
            );
        }
        let mut campaigns = Vec::new();
        for id in 0..count.min(MAX_LISTED_CAMPAIGNS) {
            match self.campaign(id).await {
                Ok(campaign) => campaigns.push(campaign),
                Err(e) => warn!("Skipping campaign {}: {}", id, e),
            }
        }
        Ok(campaigns)
    }

    #[instrument(skip(self))]
    pub async fn campaign_stats(&self, id: u64) -> Result<CampaignStats> {
        self.ensure_campaign_exists(id).await?;
        let raw = self
            .call(&getCampaignStatsCall {
                campaignId: U256::from(id),
            })
            .await?;
        contract::decode_stats(raw)
    }

    #[instrument(skip(self, campaign), fields(title = %campaign.title))]
    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<TxReceipt> {
        campaign.validate()?;
        let receipt = self
            .transact(&createCampaignCall {
                title: campaign.title.clone(),
                category: campaign.category.clone(),
                reward: campaign.reward.clone(),
                imageUrl: campaign.image_url.clone(),
                location: campaign.location.clone(),
                expiry: U256::from(campaign.expiry),
                tags: campaign.tags.clone(),
            })
            .await?;
        info!("Campaign created in tx {}", receipt.tx_hash);
        Ok(receipt)
    }

    /// Redeem (burn) a claimed proof
    #[instrument(skip(self))]
    pub async fn burn_proof(&self, from: Address, campaign_id: u64) -> Result<TxReceipt> {
        self.ensure_campaign_exists(campaign_id).await?;
        self.transact(&burnProofCall {
            _from: from,
            _campaignId: U256::from(campaign_id),
        })
        .await
    }
}

impl std::fmt::Debug for ChainSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSession")
            .field("network", &self.network.name)
            .field("contract", &self.contract)
            .field("account", &self.account)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Bring the wallet onto `network`, registering the network when it is unknown
async fn ensure_network(wallet: &dyn WalletProvider, network: &NetworkDescriptor) -> Result<()> {
    let current = wallet
        .chain_id()
        .await
        .map_err(|e| PerksError::WrongNetwork(format!("could not read network id: {e}")))?;
    if current == network.chain_id {
        return Ok(());
    }

    info!(
        "Wallet on chain {:#x}, switching to {} ({})",
        current,
        network.name,
        network.chain_id_hex()
    );

    match wallet.switch_chain(network.chain_id).await {
        Ok(()) => {}
        Err(e) if e.is_unrecognized_chain() => {
            info!("{} unknown to wallet, adding it", network.name);
            wallet.add_chain(network).await.map_err(|e| {
                PerksError::WrongNetwork(format!("failed to add {}: {}", network.name, e))
            })?;
            wallet.switch_chain(network.chain_id).await.map_err(|e| {
                PerksError::WrongNetwork(format!("failed to switch to {}: {}", network.name, e))
            })?;
        }
        Err(e) => {
            return Err(PerksError::WrongNetwork(format!(
                "failed to switch to {}: {}",
                network.name, e
            )));
        }
    }

    let actual = wallet
        .chain_id()
        .await
        .map_err(|e| PerksError::WrongNetwork(format!("could not read network id: {e}")))?;
    if actual != network.chain_id {
        return Err(PerksError::WrongNetwork(format!(
            "wallet is on chain {:#x} after switching, expected {}",
            actual,
            network.chain_id_hex()
        )));
    }
    Ok(())
}

/// The address must hold code and answer `currentCampaignId`
async fn ensure_contract(wallet: &dyn WalletProvider, contract: Address) -> Result<()> {
    let code = wallet.code_at(contract).await?;
    if code.is_empty() {
        return Err(PerksError::ContractNotDeployed(format!(
            "no contract deployed at {contract}"
        )));
    }

    let output = wallet
        .call(&CallRequest::new(contract, currentCampaignIdCall {}.abi_encode()))
        .await?;
    currentCampaignIdCall::abi_decode_returns(&output).map_err(|e| {
        PerksError::ContractNotDeployed(format!(
            "contract at {contract} does not answer currentCampaignId: {e}"
        ))
    })?;
    debug!("Contract verified at {}", contract);
    Ok(())
}

async fn resolve_account(wallet: &dyn WalletProvider) -> Result<Address> {
    let accounts = wallet.request_accounts().await.map_err(|e| {
        if e.is_user_rejection() {
            PerksError::NoAccount("account access was rejected".into())
        } else {
            PerksError::Chain(e)
        }
    })?;
    accounts
        .first()
        .copied()
        .ok_or_else(|| PerksError::NoAccount("no account authorized".into()))
}
