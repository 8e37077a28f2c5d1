use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Campaign id as it arrives from callers: a number, a decimal/hex string, or a float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CampaignIdInput {
    Integer(i128),
    Float(f64),
    Text(String),
}

impl From<u64> for CampaignIdInput {
    fn from(v: u64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<i64> for CampaignIdInput {
    fn from(v: i64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<i32> for CampaignIdInput {
    fn from(v: i32) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<f64> for CampaignIdInput {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CampaignIdInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CampaignIdInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl fmt::Display for CampaignIdInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// Opaque claim payload: raw bytes or a string (UTF-8 text or `0x` hex)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadInput {
    Bytes(Vec<u8>),
    Text(String),
}

impl PayloadInput {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(b) => b.is_empty(),
            Self::Text(s) => s.is_empty(),
        }
    }
}

impl From<Vec<u8>> for PayloadInput {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&str> for PayloadInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PayloadInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One claim attempt, built per call and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub to: String,
    pub campaign_id: CampaignIdInput,
    #[serde(default)]
    pub encrypted_data: Option<PayloadInput>,
}

impl ClaimRequest {
    pub fn new(to: impl Into<String>, campaign_id: impl Into<CampaignIdInput>) -> Self {
        Self {
            to: to.into(),
            campaign_id: campaign_id.into(),
            encrypted_data: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<PayloadInput>) -> Self {
        self.encrypted_data = Some(payload.into());
        self
    }
}

/// Chain-ready `mintProof` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedParams {
    pub to: Address,
    pub campaign_id: U256,
    pub encrypted_data: Bytes,
}

/// Gas limit, gas price and the derived cost of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCostEstimate {
    pub gas_limit: u64,
    pub gas_price: u128,
    pub cost_wei: U256,
    /// Cost in whole native-currency units, e.g. "0.005"
    pub cost_native: String,
    /// Gas price for display, e.g. "27.5 gwei"
    pub gas_price_gwei: String,
}

/// Claim orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    Idle,
    /// Querying the existing balance (idempotency guard)
    Checking,
    /// Estimating gas limit and price
    Estimating,
    /// Transaction handed to the wallet for signing and broadcast
    Submitting,
    /// Waiting for inclusion
    Confirming,
    Success,
    Failed,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimState::Idle => "IDLE",
            ClaimState::Checking => "CHECKING",
            ClaimState::Estimating => "ESTIMATING",
            ClaimState::Submitting => "SUBMITTING",
            ClaimState::Confirming => "CONFIRMING",
            ClaimState::Success => "SUCCESS",
            ClaimState::Failed => "FAILED",
        }
    }

    /// Status line shown to the user while the claim runs
    pub fn status_message(&self) -> &'static str {
        match self {
            ClaimState::Idle => "Ready to claim",
            ClaimState::Checking => "Checking existing claims...",
            ClaimState::Estimating => "Estimating transaction cost...",
            ClaimState::Submitting => "Waiting for wallet confirmation...",
            ClaimState::Confirming => "Waiting for the transaction to be confirmed...",
            ClaimState::Success => "Claim complete",
            ClaimState::Failed => "Claim failed",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: ClaimState) -> bool {
        use ClaimState::*;

        match (self, target) {
            (Idle, Checking) => true,
            (Idle, Failed) => true, // Invalid parameters

            (Checking, Estimating) => true,
            (Checking, Success) => true, // Already claimed
            (Checking, Failed) => true,

            (Estimating, Submitting) => true,
            (Estimating, Failed) => true,

            (Submitting, Confirming) => true,
            (Submitting, Failed) => true,

            (Confirming, Success) => true,
            (Confirming, Failed) => true,

            // Explicit retry
            (Success, Idle) => true,
            (Failed, Idle) => true,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimState::Success | ClaimState::Failed)
    }
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Successful end of a claim attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// The recipient already holds the proof; nothing was submitted
    AlreadyClaimed { recipient: Address, campaign_id: U256 },
    /// A new proof was minted
    Minted {
        recipient: Address,
        campaign_id: U256,
        tx_hash: B256,
        block_number: Option<u64>,
        cost: TransactionCostEstimate,
    },
}

impl ClaimOutcome {
    pub fn is_already_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::AlreadyClaimed { .. })
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            ClaimOutcome::Minted { tx_hash, .. } => Some(*tx_hash),
            ClaimOutcome::AlreadyClaimed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        use ClaimState::*;
        let path = [Idle, Checking, Estimating, Submitting, Confirming, Success];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn submission_cannot_be_skipped() {
        assert!(!ClaimState::Checking.can_transition_to(ClaimState::Confirming));
        assert!(!ClaimState::Estimating.can_transition_to(ClaimState::Success));
        assert!(!ClaimState::Failed.can_transition_to(ClaimState::Submitting));
    }

    #[test]
    fn campaign_id_input_deserializes_any_shape() {
        let parsed: ClaimRequest =
            serde_json::from_str(r#"{"to":"0xabc","campaignId":"7"}"#).unwrap();
        assert_eq!(parsed.campaign_id, CampaignIdInput::Text("7".to_string()));

        let parsed: ClaimRequest = serde_json::from_str(r#"{"to":"0xabc","campaignId":7}"#).unwrap();
        assert_eq!(parsed.campaign_id, CampaignIdInput::Integer(7));

        let parsed: ClaimRequest =
            serde_json::from_str(r#"{"to":"0xabc","campaignId":7.5}"#).unwrap();
        assert_eq!(parsed.campaign_id, CampaignIdInput::Float(7.5));
        assert!(parsed.encrypted_data.is_none());
    }
}
