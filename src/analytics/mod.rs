//! Campaign analytics: live stats with fallback, time buckets and rule-based insights

pub mod insights;
pub mod metrics;

pub use insights::{analyze, CampaignData, CampaignMetrics, Finding, Insights, Performance};
pub use metrics::{
    live_campaign_analytics, repeat_rate, BurnPeriod, LiveAnalytics, RedeemWindow, StatsSource,
};
