//! Rule-based campaign insights

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analytics::metrics::{repeat_rate, BurnPeriod, LiveAnalytics, RedeemWindow};
use crate::domain::Campaign;

/// Metrics block of an analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    /// Claimed / minted, percent
    pub conversion_rate: Decimal,
    /// Burned / minted, percent
    pub redemption_rate: Decimal,
    #[serde(default)]
    pub total_claimed: u64,
    #[serde(default)]
    pub unique_claimers: u64,
    #[serde(default)]
    pub burn_time_distribution: Option<String>,
    #[serde(default)]
    pub time_to_redeem: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: String,
    pub metrics: CampaignMetrics,
}

impl CampaignData {
    pub fn from_live(
        campaign: &Campaign,
        live: &LiveAnalytics,
        burn_period: Option<BurnPeriod>,
        redeem_window: Option<RedeemWindow>,
    ) -> Self {
        Self {
            title: Some(campaign.title.clone()),
            location: campaign.location.clone(),
            metrics: CampaignMetrics {
                conversion_rate: live.claim_rate,
                redemption_rate: live.burn_rate,
                total_claimed: live.total_claimed,
                unique_claimers: live.unique_claimers,
                burn_time_distribution: burn_period.map(|p| p.as_str().to_string()),
                time_to_redeem: redeem_window.map(|w| w.as_str().to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Performance {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "needs improvement")]
    NeedsImprovement,
}

impl Performance {
    pub fn rate(conversion: Decimal, redemption: Decimal) -> Self {
        if conversion > dec!(70) && redemption > dec!(60) {
            Self::Excellent
        } else if conversion > dec!(50) && redemption > dec!(40) {
            Self::Good
        } else if conversion < dec!(30) || redemption < dec!(20) {
            Self::NeedsImprovement
        } else {
            Self::Moderate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::NeedsImprovement => "needs improvement",
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

pub fn analyze(data: &CampaignData) -> Insights {
    Insights {
        summary: summary(&data.metrics),
        findings: findings(data),
        recommendations: recommendations(&data.metrics),
    }
}

fn summary(metrics: &CampaignMetrics) -> String {
    let performance = Performance::rate(metrics.conversion_rate, metrics.redemption_rate);
    format!(
        "Campaign shows {} performance with a {}% conversion rate and {}% redemption rate. \
         {} unique users have participated in this campaign.",
        performance,
        metrics.conversion_rate.normalize(),
        metrics.redemption_rate.normalize(),
        metrics.unique_claimers
    )
}

fn findings(data: &CampaignData) -> Vec<Finding> {
    let metrics = &data.metrics;
    let mut findings = vec![Finding {
        title: "User Engagement".to_string(),
        description: user_engagement(metrics),
    }];

    if let Some(distribution) = &metrics.burn_time_distribution {
        findings.push(Finding {
            title: "Usage Patterns".to_string(),
            description: usage_patterns(distribution, metrics.time_to_redeem.as_deref()),
        });
    }

    let penetration = if metrics.total_claimed > 100 {
        "strong"
    } else {
        "moderate"
    };
    findings.push(Finding {
        title: "Location Analysis".to_string(),
        description: format!(
            "Campaign performance in {} shows {} local market penetration.",
            data.location, penetration
        ),
    });

    findings
}

fn user_engagement(metrics: &CampaignMetrics) -> String {
    let rate = repeat_rate(metrics.total_claimed, metrics.unique_claimers);
    if rate > dec!(20) {
        format!("High user loyalty with {rate:.1}% repeat claims, indicating strong campaign appeal.")
    } else if rate > dec!(10) {
        format!("Moderate user retention with {rate:.1}% repeat claims.")
    } else {
        format!(
            "Limited repeat engagement at {rate:.1}%, suggesting opportunity for loyalty initiatives."
        )
    }
}

fn usage_patterns(distribution: &str, time_to_redeem: Option<&str>) -> String {
    let peak = match BurnPeriod::parse(distribution) {
        Some(BurnPeriod::Morning) => "concentrated in morning hours",
        Some(BurnPeriod::Afternoon) => "highest during afternoon",
        Some(BurnPeriod::Evening) => "peaks in evening hours",
        None => "varied throughout the day",
    };
    let speed = match time_to_redeem.and_then(RedeemWindow::parse) {
        Some(RedeemWindow::UnderOneHour) => "very quick",
        Some(RedeemWindow::OneToSixHours) => "same-day",
        Some(RedeemWindow::SixToTwentyFourHours) => "next-day",
        _ => "delayed",
    };
    format!("Usage is {peak} with {speed} redemption patterns.")
}

fn recommendations(metrics: &CampaignMetrics) -> Vec<String> {
    let mut recs = Vec::new();

    if metrics.conversion_rate < dec!(50) {
        recs.push("Consider enhancing campaign visibility and value proposition".to_string());
        recs.push("Implement targeted marketing to increase claim rate".to_string());
    }

    if metrics.redemption_rate < dec!(40) {
        recs.push("Simplify redemption process to improve completion rate".to_string());
        recs.push("Send reminders to users who haven't redeemed their claims".to_string());
    }

    if let Some(distribution) = &metrics.burn_time_distribution {
        recs.push(format!(
            "Optimize campaign timing for {distribution} period performance"
        ));
    }

    if metrics.total_claimed < 100 {
        recs.push("Expand local marketing efforts to increase market penetration".to_string());
    }

    recs.push("Monitor user feedback and adjust campaign parameters accordingly".to_string());
    recs.push("Consider implementing a loyalty program for repeat customers".to_string());
    recs
}
