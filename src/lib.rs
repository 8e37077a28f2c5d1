pub mod analytics;
pub mod api;
pub mod chain;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod tx;

pub use chain::{ChainSession, NetworkDescriptor, SimulatedWallet, WalletProvider};
pub use config::AppConfig;
pub use error::{ChainError, PerksError, Result};
pub use tx::{classify, classify_error, validate, ClaimOrchestrator, ErrorKind, GasEstimator};
