use alloy::primitives::Bytes;
use thiserror::Error;

/// EIP-1193 code returned when the user declines a wallet request
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code returned when the wallet does not know the requested chain
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Main error type for the claim pipeline
#[derive(Error, Debug)]
pub enum PerksError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Chain client adapter errors
    #[error("No wallet available: {0}")]
    NoWallet(String),

    #[error("Wrong network: {0}")]
    WrongNetwork(String),

    #[error("No authorized account: {0}")]
    NoAccount(String),

    #[error("Chain session is closed")]
    SessionClosed,

    #[error("No contract deployed: {0}")]
    ContractNotDeployed(String),

    // Parameter validation errors
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("Invalid campaign ID: {0}")]
    InvalidCampaignId(String),

    #[error("Invalid campaign data: {0}")]
    InvalidCampaignData(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Claim orchestration errors
    #[error("Claim already in progress for campaign {campaign_id} and {recipient}")]
    ClaimInProgress {
        recipient: String,
        campaign_id: String,
    },

    // Raw chain failures, classified by `tx::classifier`
    #[error("{0}")]
    Chain(#[from] ChainError),

    #[error("ABI decode error: {0}")]
    Abi(String),

    // Backend service errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Crypto/signing errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PerksError
pub type Result<T> = std::result::Result<T, PerksError>;

/// Low-level failure reported by the wallet or the RPC node.
///
/// Mirrors the shape wallets and JSON-RPC nodes hand back: an optional symbolic code
/// (`ACTION_REJECTED`), an optional numeric RPC/EIP-1193 code, a message, and revert
/// data when the node returned any.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("{message}")]
pub struct ChainError {
    pub code: Option<String>,
    pub rpc_code: Option<i64>,
    pub message: String,
    pub data: Option<Bytes>,
}

impl ChainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_rpc_code(mut self, rpc_code: i64) -> Self {
        self.rpc_code = Some(rpc_code);
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// The user declined the request in the wallet
    pub fn user_rejected() -> Self {
        Self::new("user rejected the request")
            .with_code("ACTION_REJECTED")
            .with_rpc_code(USER_REJECTED_CODE)
    }

    /// The wallet does not know the requested chain
    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self::new(format!("Unrecognized chain ID {chain_id:#x}"))
            .with_rpc_code(UNRECOGNIZED_CHAIN_CODE)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code.as_deref() == Some("ACTION_REJECTED") || self.rpc_code == Some(USER_REJECTED_CODE)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.rpc_code == Some(UNRECOGNIZED_CHAIN_CODE)
    }
}

impl From<alloy::transports::TransportError> for ChainError {
    fn from(err: alloy::transports::TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self {
                code: None,
                rpc_code: Some(payload.code),
                message: payload.message.to_string(),
                data: payload.as_revert_data(),
            },
            None => Self::new(err.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for PerksError {
    fn from(err: alloy::sol_types::Error) -> Self {
        PerksError::Abi(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_matches_symbolic_and_numeric_codes() {
        assert!(ChainError::user_rejected().is_user_rejection());
        assert!(ChainError::new("denied")
            .with_code("ACTION_REJECTED")
            .is_user_rejection());
        assert!(ChainError::new("denied").with_rpc_code(4001).is_user_rejection());
        assert!(!ChainError::new("denied").with_rpc_code(-32000).is_user_rejection());
    }

    #[test]
    fn unrecognized_chain_carries_4902() {
        let err = ChainError::unrecognized_chain(1_440_002);
        assert!(err.is_unrecognized_chain());
        assert!(err.message.contains("0x15f902"));
    }

    #[test]
    fn chain_error_displays_message() {
        let err: PerksError = ChainError::new("insufficient funds for gas").into();
        assert_eq!(err.to_string(), "insufficient funds for gas");
    }
}
