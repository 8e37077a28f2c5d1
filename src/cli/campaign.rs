//! Campaign commands
//!
//! proofperks campaign show <id>     - Show one campaign with live stats
//! proofperks campaign list          - List all campaigns
//! proofperks campaign create ...    - Create a campaign (owner only)

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use super::output::{self, print_kv, OutputMode};
use super::CliContext;
use crate::analytics::live_campaign_analytics;
use crate::domain::{Campaign, Expiry, NewCampaign};

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// Show a campaign
    Show {
        id: u64,

        #[arg(long)]
        json: bool,
    },

    /// List all campaigns
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create a campaign
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        reward: String,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long, default_value = "")]
        location: String,

        /// Unix timestamp or YYYY-MM-DD; no expiry if omitted
        #[arg(long)]
        expiry: Option<Expiry>,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
pub struct CampaignRow {
    pub id: u64,
    pub title: String,
    pub reward: String,
    pub location: String,
    pub expiry: String,
    pub minted: u64,
    pub claimed: u64,
    pub burned: u64,
}

impl From<&Campaign> for CampaignRow {
    fn from(c: &Campaign) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            reward: c.reward.clone(),
            location: c.location.clone(),
            expiry: c
                .expiry
                .map(|e| e.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".into()),
            minted: c.counters.minted,
            claimed: c.counters.claimed,
            burned: c.counters.burned,
        }
    }
}

impl CampaignCommands {
    pub async fn run(self, ctx: &CliContext) -> Result<()> {
        match self {
            Self::Show { id, json } => show_campaign(ctx, id, json).await,
            Self::List { json } => list_campaigns(ctx, json).await,
            Self::Create {
                title,
                category,
                reward,
                image_url,
                location,
                expiry,
                tags,
            } => {
                let campaign = NewCampaign {
                    title,
                    category,
                    reward,
                    image_url,
                    location,
                    expiry: expiry.map(|e| e.unix_seconds()).unwrap_or(0),
                    tags: tags
                        .into_iter()
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect(),
                };
                create_campaign(ctx, campaign).await
            }
        }
    }
}

async fn show_campaign(ctx: &CliContext, id: u64, json: bool) -> Result<()> {
    let session = ctx.session(false).await?;
    let campaign = session.campaign(id).await?;
    let live = live_campaign_analytics(&session, id).await?;

    if json {
        return output::print_item(&serde_json::json!({
            "campaign": campaign,
            "analytics": live,
        }));
    }

    println!("\n\x1b[36m{}\x1b[0m (#{})", campaign.title, campaign.id);
    print_kv("Category", &campaign.category);
    print_kv("Reward", &campaign.reward);
    print_kv("Location", &campaign.location);
    if let Some(expiry) = campaign.expiry {
        print_kv("Expires", expiry.format("%Y-%m-%d %H:%M UTC"));
    }
    if !campaign.tags.is_empty() {
        print_kv("Tags", campaign.tags.join(", "));
    }
    print_kv("Views", campaign.counters.views);
    print_kv("Minted", live.total_minted);
    print_kv("Claimed", format!("{} ({}%)", live.total_claimed, live.claim_rate));
    print_kv("Burned", format!("{} ({}%)", live.total_burned, live.burn_rate));
    print_kv("Unique claimers", live.unique_claimers);
    Ok(())
}

async fn list_campaigns(ctx: &CliContext, json: bool) -> Result<()> {
    let session = ctx.session(false).await?;
    let rows: Vec<CampaignRow> = session.campaigns().await?.iter().map(Into::into).collect();
    output::print_items(&rows, OutputMode::from_json_flag(json))
}

async fn create_campaign(ctx: &CliContext, campaign: NewCampaign) -> Result<()> {
    campaign.validate()?;
    let session = ctx.session(true).await?;
    let receipt = session.create_campaign(&campaign).await?;
    if !receipt.success {
        anyhow::bail!("createCampaign transaction {} reverted", receipt.tx_hash);
    }

    println!("\x1b[32m✓ Campaign created\x1b[0m");
    print_kv("Title", &campaign.title);
    print_kv("Transaction", receipt.tx_hash);
    print_kv("Campaigns", session.campaign_count().await?);
    Ok(())
}
