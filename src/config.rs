use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::chain::network::{NativeCurrency, NetworkDescriptor};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub contract: ContractConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Target chain id (XRPL EVM Sidechain = 1440002)
    pub chain_id: u64,
    /// Human-readable network name used when registering the chain with a wallet
    pub name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub explorer_urls: Vec<String>,
}

fn default_currency_decimals() -> u8 {
    18
}

impl NetworkConfig {
    pub fn descriptor(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            chain_id: self.chain_id,
            name: self.name.clone(),
            currency: NativeCurrency {
                name: self.currency_name.clone(),
                symbol: self.currency_symbol.clone(),
                decimals: self.currency_decimals,
            },
            rpc_urls: self.rpc_urls.clone(),
            explorer_urls: self.explorer_urls.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployed ProofPerks contract address
    pub address: String,
}

/// Largest accepted gas limit or price margin, in percent
pub const MAX_GAS_MARGIN_PCT: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Gas limit used when live estimation fails
    #[serde(default = "default_gas_limit")]
    pub default_limit: u64,
    /// Gas price (gwei) used when the price query fails
    #[serde(default = "default_gas_price_gwei")]
    pub default_price_gwei: u64,
    /// Safety margin added to estimated gas limits, in percent
    #[serde(default = "default_limit_margin_pct")]
    pub limit_margin_pct: u64,
    /// Safety margin added to queried gas prices, in percent
    #[serde(default = "default_price_margin_pct")]
    pub price_margin_pct: u64,
}

fn default_gas_limit() -> u64 {
    200_000
}

fn default_gas_price_gwei() -> u64 {
    25
}

fn default_limit_margin_pct() -> u64 {
    20
}

fn default_price_margin_pct() -> u64 {
    10
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            default_limit: default_gas_limit(),
            default_price_gwei: default_gas_price_gwei(),
            limit_margin_pct: default_limit_margin_pct(),
            price_margin_pct: default_price_margin_pct(),
        }
    }
}

impl GasConfig {
    pub fn default_price_wei(&self) -> u128 {
        u128::from(self.default_price_gwei) * 1_000_000_000
    }
}

/// Wallet connection settings. Keys are never read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Endpoint the wallet is currently connected to; defaults to the first
    /// `network.rpc_urls` entry
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Poll interval while waiting for receipts, in milliseconds
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
}

fn default_receipt_poll_ms() -> u64 {
    2_000
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            receipt_poll_ms: default_receipt_poll_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP API binds to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// JSON file backing the preferences store
    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,
    /// Native-currency amount paid per opt-in reward
    #[serde(default = "default_reward_amount")]
    pub reward_amount: Decimal,
    /// Gas limit for reward transfers
    #[serde(default = "default_reward_gas_limit")]
    pub reward_gas_limit: u64,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_preferences_path() -> String {
    "preferences.json".to_string()
}

fn default_reward_amount() -> Decimal {
    Decimal::TWO
}

fn default_reward_gas_limit() -> u64 {
    100_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            preferences_path: default_preferences_path(),
            reward_amount: default_reward_amount(),
            reward_gas_limit: default_reward_gas_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of the preferences / reward backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Request timeout for backend calls in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Self::default_config();

        let builder = Config::builder()
            // Start with the XRPL EVM sidechain defaults
            .set_default("network.chain_id", defaults.network.chain_id)?
            .set_default("network.name", defaults.network.name.clone())?
            .set_default("network.currency_name", defaults.network.currency_name.clone())?
            .set_default(
                "network.currency_symbol",
                defaults.network.currency_symbol.clone(),
            )?
            .set_default("network.currency_decimals", 18)?
            .set_default("network.rpc_urls", defaults.network.rpc_urls.clone())?
            .set_default("network.explorer_urls", defaults.network.explorer_urls.clone())?
            .set_default("contract.address", defaults.contract.address.clone())?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PERKS_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PERKS_CONTRACT__ADDRESS, etc.)
            .add_source(
                Environment::with_prefix("PERKS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("network.rpc_urls")
                    .with_list_parse_key("network.explorer_urls")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Defaults for the XRPL EVM sidechain deployment
    pub fn default_config() -> Self {
        Self {
            network: NetworkConfig {
                chain_id: 1_440_002,
                name: "XRPL EVM Sidechain".to_string(),
                currency_name: "XRP".to_string(),
                currency_symbol: "XRP".to_string(),
                currency_decimals: 18,
                rpc_urls: vec!["https://rpc-evm-sidechain.xrpl.org".to_string()],
                explorer_urls: vec!["https://evm-sidechain.xrpl.org".to_string()],
            },
            contract: ContractConfig {
                address: "0x171499691FcF4d6DA32749f81a9293bb2726b478".to_string(),
            },
            gas: GasConfig::default(),
            wallet: WalletConfig::default(),
            api: ApiConfig::default(),
            services: ServicesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.network.chain_id == 0 {
            errors.push("network.chain_id must be non-zero".to_string());
        }

        if self.network.rpc_urls.is_empty() {
            errors.push("network.rpc_urls must list at least one endpoint".to_string());
        }

        for rpc in &self.network.rpc_urls {
            if url::Url::parse(rpc).is_err() {
                errors.push(format!("network.rpc_urls contains an invalid URL: {rpc}"));
            }
        }

        if self
            .contract
            .address
            .parse::<alloy::primitives::Address>()
            .is_err()
        {
            errors.push(format!(
                "contract.address is not a valid address: {}",
                self.contract.address
            ));
        }

        if self.gas.default_limit == 0 {
            errors.push("gas.default_limit must be positive".to_string());
        }

        if self.gas.default_price_gwei == 0 {
            errors.push("gas.default_price_gwei must be positive".to_string());
        }

        if self.gas.limit_margin_pct > MAX_GAS_MARGIN_PCT {
            errors.push(format!(
                "gas.limit_margin_pct must be at most {MAX_GAS_MARGIN_PCT}"
            ));
        }

        if self.gas.price_margin_pct > MAX_GAS_MARGIN_PCT {
            errors.push(format!(
                "gas.price_margin_pct must be at most {MAX_GAS_MARGIN_PCT}"
            ));
        }

        if let Some(rpc) = &self.wallet.rpc_url {
            if url::Url::parse(rpc).is_err() {
                errors.push(format!("wallet.rpc_url is not a valid URL: {rpc}"));
            }
        }

        if self.api.reward_amount <= Decimal::ZERO {
            errors.push("api.reward_amount must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
