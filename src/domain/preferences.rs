use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PerksError, Result};

/// Which channels a holder agreed to be contacted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingPreferences {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub push: bool,
}

/// Contact details shared by a campaign participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInRecord {
    pub wallet_address: String,
    pub campaign_id: u64,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub preferences: MarketingPreferences,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl OptInRecord {
    pub fn new(wallet_address: impl Into<String>, campaign_id: u64, email: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            campaign_id,
            email: email.into(),
            phone: String::new(),
            preferences: MarketingPreferences::default(),
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(PerksError::Validation("email is required".to_string()));
        }
        if !email.contains('@') {
            return Err(PerksError::Validation(format!("invalid email: {email}")));
        }
        Ok(())
    }

    /// Records are unique per (wallet, campaign); wallet comparison ignores case
    pub fn same_participant(&self, wallet_address: &str, campaign_id: u64) -> bool {
        self.campaign_id == campaign_id && self.wallet_address.eq_ignore_ascii_case(wallet_address)
    }
}
