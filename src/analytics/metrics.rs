use chrono::{DateTime, Local, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::{instrument, warn};

use crate::chain::ChainSession;
use crate::domain::{percentage, Campaign, CampaignStats};
use crate::error::Result;

/// Where live numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// `getCampaignStats`
    Contract,
    /// Counters from `getCampaignById`; unique claimers unknown
    CampaignCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAnalytics {
    pub unique_claimers: u64,
    pub total_minted: u64,
    pub total_claimed: u64,
    pub total_burned: u64,
    pub claim_rate: Decimal,
    pub burn_rate: Decimal,
    pub source: StatsSource,
}

impl LiveAnalytics {
    pub fn from_stats(stats: CampaignStats) -> Self {
        Self {
            unique_claimers: stats.unique_claimers,
            total_minted: stats.total_minted,
            total_claimed: stats.total_claimed,
            total_burned: stats.total_burned,
            claim_rate: stats.claim_rate(),
            burn_rate: stats.burn_rate(),
            source: StatsSource::Contract,
        }
    }

    pub fn from_campaign(campaign: &Campaign) -> Self {
        let c = campaign.counters;
        Self {
            unique_claimers: 0,
            total_minted: c.minted,
            total_claimed: c.claimed,
            total_burned: c.burned,
            claim_rate: c.claim_rate(),
            burn_rate: c.burn_rate(),
            source: StatsSource::CampaignCounters,
        }
    }

    /// Share of claims made by returning users, one decimal place
    pub fn repeat_rate(&self) -> Decimal {
        repeat_rate(self.total_claimed, self.unique_claimers)
    }
}

/// `(claimed - unique) / claimed * 100`; zero when nothing was claimed
pub fn repeat_rate(total_claimed: u64, unique_claimers: u64) -> Decimal {
    percentage(total_claimed.saturating_sub(unique_claimers), total_claimed)
}

/// Live analytics for a campaign.
///
/// The campaign must exist. When `getCampaignStats` fails the campaign's own
/// counters are used instead.
#[instrument(skip(session))]
pub async fn live_campaign_analytics(session: &ChainSession, id: u64) -> Result<LiveAnalytics> {
    let campaign = session.campaign(id).await?;
    match session.campaign_stats(id).await {
        Ok(stats) => Ok(LiveAnalytics::from_stats(stats)),
        Err(e) => {
            warn!("Detailed stats unavailable for campaign {}, using counters: {}", id, e);
            Ok(LiveAnalytics::from_campaign(&campaign))
        }
    }
}

/// How long a holder waited between claim and redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RedeemWindow {
    #[serde(rename = "0-1 hour")]
    UnderOneHour,
    #[serde(rename = "1-6 hours")]
    OneToSixHours,
    #[serde(rename = "6-24 hours")]
    SixToTwentyFourHours,
    #[serde(rename = "24+ hours")]
    OverADay,
}

impl RedeemWindow {
    /// Bucket an elapsed time in seconds; zero means unknown
    pub fn from_elapsed_secs(secs: u64) -> Option<Self> {
        const HOUR: u64 = 3_600;
        match secs {
            0 => None,
            s if s < HOUR => Some(Self::UnderOneHour),
            s if s < 6 * HOUR => Some(Self::OneToSixHours),
            s if s < 24 * HOUR => Some(Self::SixToTwentyFourHours),
            _ => Some(Self::OverADay),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderOneHour => "0-1 hour",
            Self::OneToSixHours => "1-6 hours",
            Self::SixToTwentyFourHours => "6-24 hours",
            Self::OverADay => "24+ hours",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        [
            Self::UnderOneHour,
            Self::OneToSixHours,
            Self::SixToTwentyFourHours,
            Self::OverADay,
        ]
        .into_iter()
        .find(|w| w.as_str() == label)
    }
}

impl fmt::Display for RedeemWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the day a proof was burned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl BurnPeriod {
    /// 05-12 morning, 12-17 afternoon, otherwise evening
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    /// Period of a unix timestamp in local time; zero means unknown
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        if secs == 0 {
            return None;
        }
        DateTime::from_timestamp(secs, 0)
            .map(|utc| Self::from_hour(utc.with_timezone(&Local).hour()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for BurnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CampaignCounters;
    use rust_decimal_macros::dec;

    #[test]
    fn redeem_window_buckets() {
        assert_eq!(RedeemWindow::from_elapsed_secs(0), None);
        assert_eq!(
            RedeemWindow::from_elapsed_secs(59 * 60),
            Some(RedeemWindow::UnderOneHour)
        );
        assert_eq!(
            RedeemWindow::from_elapsed_secs(3_600),
            Some(RedeemWindow::OneToSixHours)
        );
        assert_eq!(
            RedeemWindow::from_elapsed_secs(23 * 3_600),
            Some(RedeemWindow::SixToTwentyFourHours)
        );
        assert_eq!(
            RedeemWindow::from_elapsed_secs(24 * 3_600),
            Some(RedeemWindow::OverADay)
        );
        assert_eq!(RedeemWindow::parse("1-6 hours"), Some(RedeemWindow::OneToSixHours));
    }

    #[test]
    fn burn_period_by_hour() {
        assert_eq!(BurnPeriod::from_hour(4), BurnPeriod::Evening);
        assert_eq!(BurnPeriod::from_hour(5), BurnPeriod::Morning);
        assert_eq!(BurnPeriod::from_hour(12), BurnPeriod::Afternoon);
        assert_eq!(BurnPeriod::from_hour(17), BurnPeriod::Evening);
        assert_eq!(BurnPeriod::from_timestamp(0), None);
    }

    #[test]
    fn counters_fallback_has_no_unique_claimers() {
        let campaign = Campaign {
            id: 1,
            title: "Coffee".into(),
            category: String::new(),
            reward: "Free Coffee".into(),
            image_url: None,
            location: "Downtown".into(),
            expiry: None,
            tags: vec![],
            counters: CampaignCounters {
                minted: 8,
                claimed: 4,
                burned: 1,
                views: 20,
            },
        };
        let live = LiveAnalytics::from_campaign(&campaign);
        assert_eq!(live.unique_claimers, 0);
        assert_eq!(live.claim_rate, dec!(50.0));
        assert_eq!(live.burn_rate, dec!(12.5));
        assert_eq!(live.source, StatsSource::CampaignCounters);
    }

    #[test]
    fn repeat_rate_guards_zero_claims() {
        assert_eq!(repeat_rate(0, 0), Decimal::ZERO);
        assert_eq!(repeat_rate(10, 7), dec!(30.0));
    }
}
