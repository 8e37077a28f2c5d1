//! `proofperks analytics` and `proofperks classify`

use alloy::primitives::Bytes;
use anyhow::{Context, Result};
use clap::Args;

use super::output::{self, print_kv};
use super::CliContext;
use crate::analytics::{
    analyze, live_campaign_analytics, BurnPeriod, CampaignData, Insights, RedeemWindow,
};
use crate::error::ChainError;
use crate::services::BackendClient;
use crate::tx::classify;

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    pub campaign_id: u64,

    /// Peak burn period (morning, afternoon, evening)
    #[arg(long)]
    pub burn_period: Option<String>,

    /// Typical claim-to-redeem window (0-1 hour, 1-6 hours, 6-24 hours, 24+ hours)
    #[arg(long)]
    pub time_to_redeem: Option<String>,

    /// Ask the analysis service instead of computing insights locally
    #[arg(long)]
    pub remote: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Error message as reported by the wallet or node
    pub message: String,

    /// Symbolic code, e.g. ACTION_REJECTED
    #[arg(long)]
    pub code: Option<String>,

    /// Numeric RPC / EIP-1193 code, e.g. 4001
    #[arg(long, allow_hyphen_values = true)]
    pub rpc_code: Option<i64>,

    /// Revert data (0x hex)
    #[arg(long)]
    pub data: Option<String>,
}

pub async fn run_analytics(ctx: &CliContext, args: AnalyticsArgs) -> Result<()> {
    let burn_period = args
        .burn_period
        .as_deref()
        .map(|p| BurnPeriod::parse(p).with_context(|| format!("unknown burn period {p:?}")))
        .transpose()?;
    let redeem_window = args
        .time_to_redeem
        .as_deref()
        .map(|w| RedeemWindow::parse(w).with_context(|| format!("unknown redeem window {w:?}")))
        .transpose()?;

    let session = ctx.session(false).await?;
    let campaign = session.campaign(args.campaign_id).await?;
    let live = live_campaign_analytics(&session, args.campaign_id).await?;
    let data = CampaignData::from_live(&campaign, &live, burn_period, redeem_window);

    let insights: Insights = if args.remote {
        BackendClient::from_config(&ctx.config.services)?
            .analyze(&data)
            .await?
    } else {
        analyze(&data)
    };

    if args.json {
        return output::print_item(&serde_json::json!({
            "analytics": live,
            "insights": insights,
        }));
    }

    println!("\n\x1b[36m{}\x1b[0m", campaign.title);
    print_kv("Unique claimers", live.unique_claimers);
    print_kv("Minted", live.total_minted);
    print_kv("Claimed", live.total_claimed);
    print_kv("Burned", live.total_burned);
    print_kv("Claim rate", format!("{}%", live.claim_rate));
    print_kv("Burn rate", format!("{}%", live.burn_rate));
    print_kv("Repeat rate", format!("{:.1}%", live.repeat_rate()));

    println!("\n{}", insights.summary);
    for finding in &insights.findings {
        println!("\n  \x1b[1m{}\x1b[0m\n  {}", finding.title, finding.description);
    }
    println!("\nRecommendations:");
    for rec in &insights.recommendations {
        println!("  - {rec}");
    }
    Ok(())
}

pub fn run_classify(args: ClassifyArgs) -> Result<()> {
    let mut raw = ChainError::new(args.message);
    if let Some(code) = args.code {
        raw = raw.with_code(code);
    }
    if let Some(rpc_code) = args.rpc_code {
        raw = raw.with_rpc_code(rpc_code);
    }
    if let Some(data) = args.data {
        let data: Bytes = data.parse().context("revert data must be 0x hex")?;
        raw = raw.with_data(data);
    }
    output::print_item(&classify(&raw))
}
