//! Wallet abstraction
//!
//! `WalletProvider` is the EIP-1193-shaped surface the claim pipeline talks to:
//! account permission, network switching, read calls, gas queries and transaction
//! submission. `RpcWallet` implements it on top of an alloy HTTP provider and an
//! optional local signing key.

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::chain::network::NetworkDescriptor;
use crate::config::AppConfig;
use crate::error::{ChainError, PerksError, Result};

/// A call or transaction against the chain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
}

impl CallRequest {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn gas(mut self, gas_limit: u64, gas_price: u128) -> Self {
        self.gas_limit = Some(gas_limit);
        self.gas_price = Some(gas_price);
        self
    }

    fn to_transaction_request(&self) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_to(self.to)
            .with_input(self.data.clone())
            .with_value(self.value);
        if let Some(from) = self.from {
            tx = tx.with_from(from);
        }
        if let Some(gas_limit) = self.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.with_gas_price(gas_price);
        }
        tx
    }
}

/// Inclusion acknowledgment for a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Authorized accounts; may prompt the user (`eth_requestAccounts`)
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, ChainError>;

    async fn chain_id(&self) -> std::result::Result<u64, ChainError>;

    /// `wallet_switchEthereumChain`; fails with code 4902 for unknown chains
    async fn switch_chain(&self, chain_id: u64) -> std::result::Result<(), ChainError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, network: &NetworkDescriptor) -> std::result::Result<(), ChainError>;

    async fn call(&self, request: &CallRequest) -> std::result::Result<Bytes, ChainError>;

    async fn estimate_gas(&self, request: &CallRequest) -> std::result::Result<u64, ChainError>;

    async fn gas_price(&self) -> std::result::Result<u128, ChainError>;

    async fn balance(&self, account: Address) -> std::result::Result<U256, ChainError>;

    /// Deployed bytecode at `address`; empty for externally owned accounts
    async fn code_at(&self, address: Address) -> std::result::Result<Bytes, ChainError>;

    /// Sign and broadcast; returns the transaction hash
    async fn send_transaction(&self, request: &CallRequest)
        -> std::result::Result<B256, ChainError>;

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> std::result::Result<Option<TxReceipt>, ChainError>;
}

struct ActiveConnection {
    rpc_url: String,
    provider: DynProvider,
}

/// JSON-RPC backed wallet with an optional local key
pub struct RpcWallet {
    signer: Option<EthereumWallet>,
    account: Option<Address>,
    networks: RwLock<HashMap<u64, NetworkDescriptor>>,
    active: RwLock<ActiveConnection>,
}

impl RpcWallet {
    /// Connect to `rpc_url`, signing with `private_key` when given.
    ///
    /// The key string is zeroized once parsed.
    pub fn connect(rpc_url: &str, private_key: Option<&str>) -> Result<Self> {
        let (signer, account) = match private_key {
            Some(key) => {
                let mut secure_key = key.trim().trim_start_matches("0x").to_string();
                let parsed = secure_key
                    .parse::<PrivateKeySigner>()
                    .map_err(|e| PerksError::Wallet(format!("Invalid private key: {}", e)));
                secure_key.zeroize();
                let signer = parsed?;
                let address = signer.address();
                info!("Wallet initialized: {} (private key zeroized from memory)", address);
                (Some(EthereumWallet::from(signer)), Some(address))
            }
            None => (None, None),
        };

        let provider = build_provider(rpc_url, signer.as_ref())?;

        Ok(Self {
            signer,
            account,
            networks: RwLock::new(HashMap::new()),
            active: RwLock::new(ActiveConnection {
                rpc_url: rpc_url.to_string(),
                provider,
            }),
        })
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub async fn rpc_url(&self) -> String {
        self.active.read().await.rpc_url.clone()
    }

    async fn provider(&self) -> DynProvider {
        self.active.read().await.provider.clone()
    }
}

fn build_provider(rpc_url: &str, signer: Option<&EthereumWallet>) -> Result<DynProvider> {
    let provider = match signer {
        Some(wallet) => {
            let url = rpc_url
                .parse()
                .map_err(|e| PerksError::Wallet(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
            ProviderBuilder::new()
                .wallet(wallet.clone())
                .connect_http(url)
                .erased()
        }
        None => {
            let url = rpc_url
                .parse()
                .map_err(|e| PerksError::Wallet(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
            ProviderBuilder::new().connect_http(url).erased()
        }
    };
    Ok(provider)
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, ChainError> {
        Ok(self.account.into_iter().collect())
    }

    async fn chain_id(&self) -> std::result::Result<u64, ChainError> {
        Ok(self.provider().await.get_chain_id().await?)
    }

    async fn switch_chain(&self, chain_id: u64) -> std::result::Result<(), ChainError> {
        if self.chain_id().await.ok() == Some(chain_id) {
            return Ok(());
        }

        let network = self
            .networks
            .read()
            .await
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| ChainError::unrecognized_chain(chain_id))?;

        let mut last_error = ChainError::new(format!(
            "No RPC endpoint configured for chain {}",
            network.chain_id_hex()
        ));
        for rpc_url in &network.rpc_urls {
            let provider = build_provider(rpc_url, self.signer.as_ref())
                .map_err(|e| ChainError::new(e.to_string()))?;
            match provider.get_chain_id().await {
                Ok(actual) if actual == chain_id => {
                    info!("Switched wallet to {} via {}", network.name, rpc_url);
                    *self.active.write().await = ActiveConnection {
                        rpc_url: rpc_url.clone(),
                        provider,
                    };
                    return Ok(());
                }
                Ok(actual) => {
                    warn!(
                        "RPC {} reports chain {} instead of {}",
                        rpc_url, actual, chain_id
                    );
                    last_error = ChainError::new(format!(
                        "RPC endpoint {} serves chain {} instead of {}",
                        rpc_url, actual, chain_id
                    ));
                }
                Err(e) => {
                    warn!("RPC {} unreachable: {}", rpc_url, e);
                    last_error = e.into();
                }
            }
        }
        Err(last_error)
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> std::result::Result<(), ChainError> {
        if network.rpc_urls.is_empty() {
            return Err(ChainError::new("Network has no RPC endpoints").with_rpc_code(-32602));
        }
        debug!("Registering network {} ({})", network.name, network.chain_id_hex());
        self.networks
            .write()
            .await
            .insert(network.chain_id, network.clone());
        Ok(())
    }

    async fn call(&self, request: &CallRequest) -> std::result::Result<Bytes, ChainError> {
        let tx = request.to_transaction_request();
        Ok(self.provider().await.call(tx).await?)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> std::result::Result<u64, ChainError> {
        let tx = request.to_transaction_request();
        Ok(self.provider().await.estimate_gas(tx).await?)
    }

    async fn gas_price(&self) -> std::result::Result<u128, ChainError> {
        Ok(self.provider().await.get_gas_price().await?)
    }

    async fn balance(&self, account: Address) -> std::result::Result<U256, ChainError> {
        Ok(self.provider().await.get_balance(account).await?)
    }

    async fn code_at(&self, address: Address) -> std::result::Result<Bytes, ChainError> {
        Ok(self.provider().await.get_code_at(address).await?)
    }

    async fn send_transaction(
        &self,
        request: &CallRequest,
    ) -> std::result::Result<B256, ChainError> {
        if self.signer.is_none() {
            return Err(ChainError::new("Wallet has no signing key").with_rpc_code(4100));
        }
        let tx = request.to_transaction_request();
        let pending = self.provider().await.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> std::result::Result<Option<TxReceipt>, ChainError> {
        let receipt = self
            .provider()
            .await
            .get_transaction_receipt(tx_hash)
            .await?;
        Ok(receipt.map(|r| TxReceipt {
            tx_hash: r.transaction_hash,
            block_number: r.block_number,
            success: r.status(),
        }))
    }
}

/// Locate a wallet for this process.
///
/// Uses `wallet.rpc_url` (falling back to the configured network's first RPC endpoint)
/// and an optional `PERKS_PRIVATE_KEY` / `PRIVATE_KEY`. Returns `None` when no endpoint
/// is available at all.
pub fn detect_wallet(config: &AppConfig) -> Result<Option<Arc<dyn WalletProvider>>> {
    let rpc_url = config
        .wallet
        .rpc_url
        .clone()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.network.rpc_urls.first().cloned());

    let Some(rpc_url) = rpc_url else {
        return Ok(None);
    };

    let mut private_key = std::env::var("PERKS_PRIVATE_KEY")
        .or_else(|_| std::env::var("PRIVATE_KEY"))
        .ok()
        .filter(|v| !v.trim().is_empty());

    let wallet = RpcWallet::connect(&rpc_url, private_key.as_deref());
    if let Some(key) = private_key.as_mut() {
        key.zeroize();
    }

    Ok(Some(Arc::new(wallet?)))
}

impl std::fmt::Debug for RpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWallet")
            .field("account", &self.account)
            .finish()
    }
}
