use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PerksError, Result};

/// Usage counters maintained by the contract's mint/burn calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCounters {
    pub minted: u64,
    pub claimed: u64,
    pub burned: u64,
    pub views: u64,
}

impl CampaignCounters {
    /// Counters must satisfy minted >= claimed >= burned
    pub fn validate(&self) -> Result<()> {
        if self.claimed > self.minted {
            return Err(PerksError::InvalidCampaignData(format!(
                "claimed ({}) exceeds minted ({})",
                self.claimed, self.minted
            )));
        }
        if self.burned > self.claimed {
            return Err(PerksError::InvalidCampaignData(format!(
                "burned ({}) exceeds claimed ({})",
                self.burned, self.claimed
            )));
        }
        Ok(())
    }

    /// Claimed as a percentage of minted, one decimal place
    pub fn claim_rate(&self) -> Decimal {
        percentage(self.claimed, self.minted)
    }

    /// Burned as a percentage of minted, one decimal place
    pub fn burn_rate(&self) -> Decimal {
        percentage(self.burned, self.minted)
    }
}

/// `part / whole * 100`, rounded to one decimal; zero when `whole` is zero
pub fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO.round_dp(1);
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(1)
}

/// A business-defined claim offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: u64,
    pub title: String,
    pub category: String,
    pub reward: String,
    pub image_url: Option<String>,
    pub location: String,
    pub expiry: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub counters: CampaignCounters,
}

impl Campaign {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= now)
    }
}

/// Aggregate stats returned by `getCampaignStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    pub unique_claimers: u64,
    pub total_minted: u64,
    pub total_claimed: u64,
    pub total_burned: u64,
}

impl CampaignStats {
    pub fn claim_rate(&self) -> Decimal {
        percentage(self.total_claimed, self.total_minted)
    }

    pub fn burn_rate(&self) -> Decimal {
        percentage(self.total_burned, self.total_minted)
    }
}

/// Campaign expiry as accepted on creation: a unix timestamp or a `YYYY-MM-DD` date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry(pub DateTime<Utc>);

impl Expiry {
    pub fn unix_seconds(&self) -> u64 {
        self.0.timestamp().max(0) as u64
    }
}

impl FromStr for Expiry {
    type Err = PerksError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(secs) = raw.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0)
                .map(Expiry)
                .ok_or_else(|| PerksError::Validation(format!("expiry out of range: {raw}")));
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            PerksError::Validation(format!(
                "expiry must be a unix timestamp or YYYY-MM-DD date ({raw}): {e}"
            ))
        })?;
        date.and_hms_opt(23, 59, 59)
            .map(|dt| Expiry(dt.and_utc()))
            .ok_or_else(|| PerksError::Validation(format!("invalid expiry date: {raw}")))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

/// Parameters for `createCampaign`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub title: String,
    pub category: String,
    pub reward: String,
    pub image_url: String,
    pub location: String,
    pub expiry: u64,
    pub tags: Vec<String>,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PerksError::Validation("campaign title is required".to_string()));
        }
        if self.reward.trim().is_empty() {
            return Err(PerksError::Validation("campaign reward is required".to_string()));
        }
        Ok(())
    }
}
