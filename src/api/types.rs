use serde::{Deserialize, Serialize};

use crate::analytics::{CampaignData, Insights};

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

// ============================================================================
// Preferences Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesQuery {
    pub wallet_address: String,
    pub campaign_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasSharedResponse {
    pub has_shared: bool,
}

// ============================================================================
// Reward Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRewardRequest {
    #[serde(default)]
    pub to_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRewardResponse {
    pub success: bool,
    pub transaction_hash: String,
    /// Native-currency amount, e.g. "2.0"
    pub amount: String,
    pub block_number: Option<u64>,
    pub from: String,
    pub to: String,
}

// ============================================================================
// Analysis Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub campaign_data: CampaignData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub insights: Insights,
}
