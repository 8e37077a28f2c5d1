//! Error classification
//!
//! Maps raw wallet/RPC failures into a small taxonomy for display. Rules are checked
//! in priority order and the first match wins.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolInterface;
use serde::Serialize;
use std::fmt;

use crate::chain::contract::IProofPerks::IProofPerksErrors;
use crate::error::{ChainError, PerksError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "user_rejection")]
    UserRejection,
    #[serde(rename = "insufficient_funds")]
    InsufficientFunds,
    #[serde(rename = "nonce_error")]
    NonceError,
    AlreadyClaimed,
    CampaignExpired,
    InvalidCampaign,
    #[serde(rename = "contract_error")]
    ContractError,
    #[serde(rename = "unknown_error")]
    UnknownError,
    NoWallet,
    WrongNetwork,
    NoAccount,
    InvalidAddress,
    InvalidCampaignId,
    SessionClosed,
    ClaimInProgress,
    #[serde(rename = "validation_error")]
    ValidationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UserRejection => "user_rejection",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::NonceError => "nonce_error",
            ErrorKind::AlreadyClaimed => "AlreadyClaimed",
            ErrorKind::CampaignExpired => "CampaignExpired",
            ErrorKind::InvalidCampaign => "InvalidCampaign",
            ErrorKind::ContractError => "contract_error",
            ErrorKind::UnknownError => "unknown_error",
            ErrorKind::NoWallet => "NoWallet",
            ErrorKind::WrongNetwork => "WrongNetwork",
            ErrorKind::NoAccount => "NoAccount",
            ErrorKind::InvalidAddress => "InvalidAddress",
            ErrorKind::InvalidCampaignId => "InvalidCampaignId",
            ErrorKind::SessionClosed => "SessionClosed",
            ErrorKind::ClaimInProgress => "ClaimInProgress",
            ErrorKind::ValidationError => "validation_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded arguments of a contract custom error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum RevertArgs {
    AlreadyClaimed { user: Address, campaign_id: U256 },
    CampaignExpired { campaign_id: U256, expiry_time: U256 },
    InvalidCampaign { campaign_id: U256 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub args: Option<RevertArgs>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            args: None,
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

struct Rule {
    matches: fn(&ChainError) -> bool,
    classify: fn(&ChainError) -> ClassifiedError,
}

fn message_contains(err: &ChainError, needle: &str) -> bool {
    err.message.to_lowercase().contains(needle)
}

const RULES: &[Rule] = &[
    Rule {
        matches: ChainError::is_user_rejection,
        classify: |_| {
            ClassifiedError::new(
                ErrorKind::UserRejection,
                "Transaction was rejected by the user",
            )
        },
    },
    Rule {
        matches: |e| message_contains(e, "insufficient funds"),
        classify: |_| ClassifiedError::new(ErrorKind::InsufficientFunds, "Insufficient funds for gas"),
    },
    Rule {
        matches: |e| message_contains(e, "nonce too low"),
        classify: |_| {
            ClassifiedError::new(
                ErrorKind::NonceError,
                "Transaction nonce is too low. Please reset your wallet.",
            )
        },
    },
    Rule {
        matches: |e| e.data.is_some(),
        classify: decode_revert,
    },
    Rule {
        matches: |_| true,
        classify: |e| ClassifiedError::new(ErrorKind::UnknownError, e.message.clone()),
    },
];

/// Decode contract custom errors; anything undecodable is a generic contract error
fn decode_revert(err: &ChainError) -> ClassifiedError {
    let data = err.data.as_ref().map(|b| b.as_ref()).unwrap_or_default();
    let (kind, args) = match IProofPerksErrors::abi_decode(data) {
        Ok(IProofPerksErrors::AlreadyClaimed(e)) => (
            ErrorKind::AlreadyClaimed,
            RevertArgs::AlreadyClaimed {
                user: e.user,
                campaign_id: e.campaignId,
            },
        ),
        Ok(IProofPerksErrors::CampaignExpired(e)) => (
            ErrorKind::CampaignExpired,
            RevertArgs::CampaignExpired {
                campaign_id: e.campaignId,
                expiry_time: e.expiryTime,
            },
        ),
        Ok(IProofPerksErrors::InvalidCampaign(e)) => (
            ErrorKind::InvalidCampaign,
            RevertArgs::InvalidCampaign {
                campaign_id: e.campaignId,
            },
        ),
        Err(_) => return ClassifiedError::new(ErrorKind::ContractError, err.message.clone()),
    };

    ClassifiedError {
        kind,
        message: format!("Contract error: {}", kind.as_str()),
        args: Some(args),
    }
}

/// Classify a raw wallet/RPC failure
pub fn classify(raw: &ChainError) -> ClassifiedError {
    RULES
        .iter()
        .find(|rule| (rule.matches)(raw))
        .map(|rule| (rule.classify)(raw))
        .unwrap_or_else(|| ClassifiedError::new(ErrorKind::UnknownError, raw.message.clone()))
}

/// Classify any pipeline error; raw chain failures go through `classify`
pub fn classify_error(err: &PerksError) -> ClassifiedError {
    let kind = match err {
        PerksError::Chain(raw) => return classify(raw),
        PerksError::NoWallet(_) => ErrorKind::NoWallet,
        PerksError::WrongNetwork(_) => ErrorKind::WrongNetwork,
        PerksError::NoAccount(_) => ErrorKind::NoAccount,
        PerksError::InvalidAddress(_) => ErrorKind::InvalidAddress,
        PerksError::InvalidCampaignId(_) => ErrorKind::InvalidCampaignId,
        PerksError::SessionClosed => ErrorKind::SessionClosed,
        PerksError::ContractNotDeployed(_) => ErrorKind::ContractError,
        PerksError::ClaimInProgress { .. } => ErrorKind::ClaimInProgress,
        PerksError::Validation(_) | PerksError::InvalidCampaignData(_) => {
            ErrorKind::ValidationError
        }
        _ => ErrorKind::UnknownError,
    };
    ClassifiedError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contract::{AlreadyClaimed, CampaignExpired, InvalidCampaign};
    use alloy::sol_types::SolError;

    #[test]
    fn action_rejected_is_user_rejection() {
        let err = ChainError::new("user rejected transaction").with_code("ACTION_REJECTED");
        let classified = classify(&err);
        assert_eq!(classified.kind, ErrorKind::UserRejection);
        assert_eq!(classified.message, "Transaction was rejected by the user");
    }

    #[test]
    fn rejection_wins_over_message_rules() {
        let err = ChainError::new("insufficient funds, and the user said no").with_rpc_code(4001);
        assert_eq!(classify(&err).kind, ErrorKind::UserRejection);
    }

    #[test]
    fn message_rules() {
        let funds = ChainError::new("insufficient funds for gas * price + value");
        assert_eq!(classify(&funds).kind, ErrorKind::InsufficientFunds);
        assert_eq!(classify(&funds).message, "Insufficient funds for gas");

        let nonce = ChainError::new("nonce too low: next nonce 5, tx nonce 4");
        assert_eq!(classify(&nonce).kind, ErrorKind::NonceError);
    }

    #[test]
    fn already_claimed_revert_is_decoded() {
        let user = Address::repeat_byte(0xab);
        let data = AlreadyClaimed {
            user,
            campaignId: U256::from(3u64),
        }
        .abi_encode();
        let err = ChainError::new("execution reverted").with_data(data);

        let classified = classify(&err);
        assert_eq!(classified.kind, ErrorKind::AlreadyClaimed);
        assert_eq!(classified.message, "Contract error: AlreadyClaimed");
        assert_eq!(
            classified.args,
            Some(RevertArgs::AlreadyClaimed {
                user,
                campaign_id: U256::from(3u64)
            })
        );
    }

    #[test]
    fn other_custom_errors_are_decoded() {
        let expired = ChainError::new("execution reverted").with_data(
            CampaignExpired {
                campaignId: U256::from(1u64),
                expiryTime: U256::from(1_700_000_000u64),
            }
            .abi_encode(),
        );
        assert_eq!(classify(&expired).kind, ErrorKind::CampaignExpired);

        let invalid = ChainError::new("execution reverted").with_data(
            InvalidCampaign {
                campaignId: U256::from(99u64),
            }
            .abi_encode(),
        );
        assert_eq!(classify(&invalid).kind, ErrorKind::InvalidCampaign);
    }

    #[test]
    fn undecodable_revert_fails_open() {
        let err = ChainError::new("execution reverted: custom").with_data(vec![0xde, 0xad]);
        let classified = classify(&err);
        assert_eq!(classified.kind, ErrorKind::ContractError);
        assert_eq!(classified.message, "execution reverted: custom");
        assert!(classified.args.is_none());
    }

    #[test]
    fn everything_else_is_unknown() {
        let classified = classify(&ChainError::new("connection reset"));
        assert_eq!(classified.kind, ErrorKind::UnknownError);
        assert_eq!(classified.message, "connection reset");
    }

    #[test]
    fn pipeline_errors_map_to_kinds() {
        let classified = classify_error(&PerksError::ContractNotDeployed("0x00".into()));
        assert_eq!(classified.kind, ErrorKind::ContractError);

        let classified = classify_error(&PerksError::NoWallet("none".into()));
        assert_eq!(classified.kind, ErrorKind::NoWallet);

        let classified = classify_error(&PerksError::InvalidAddress("0x123".into()));
        assert_eq!(classified.kind, ErrorKind::InvalidAddress);

        let classified = classify_error(&ChainError::user_rejected().into());
        assert_eq!(classified.kind, ErrorKind::UserRejection);
    }

    #[test]
    fn serializes_with_wire_names() {
        let classified = classify(&ChainError::user_rejected());
        let json = serde_json::to_value(&classified).unwrap();
        assert_eq!(json["type"], "user_rejection");
        assert!(json.get("data").is_none());
    }
}
