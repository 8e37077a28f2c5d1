//! ProofPerks CLI
//!
//! Commands:
//! - `proofperks claim` - Mint a proof for a recipient
//! - `proofperks campaign` - Show, list and create campaigns
//! - `proofperks estimate` - Estimate the cost of a claim
//! - `proofperks analytics` - Live campaign analytics and insights
//! - `proofperks classify` - Classify a raw wallet/RPC error
//! - `proofperks serve` - Run the preferences/reward/analysis API
//! - `proofperks reward` - Pay opt-in rewards
//! - `proofperks opt-in` - Share contact preferences for a campaign

pub mod analytics;
pub mod campaign;
pub mod claim;
pub mod output;
pub mod service;

use alloy::primitives::{address, Address, U256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::chain::{ChainSession, SimulatedWallet};
use crate::config::AppConfig;
use crate::domain::NewCampaign;

/// Account used by `--simulate`
pub const SIMULATED_ACCOUNT: Address = address!("5eed00000000000000000000000000000000beef");

/// ProofPerks claim pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "proofperks")]
#[command(author, version, about = "Claim and manage ProofPerks proofs on the XRPL EVM sidechain")]
pub struct Cli {
    /// Configuration directory (default.toml, <PERKS_ENV>.toml)
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    /// Run against an in-memory wallet and contract instead of a node
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mint a proof for a recipient (no-op if they already hold it)
    Claim(claim::ClaimArgs),

    /// Campaign management
    #[command(subcommand)]
    Campaign(campaign::CampaignCommands),

    /// Estimate gas and native cost of a claim
    Estimate(claim::EstimateArgs),

    /// Live analytics and insights for a campaign
    Analytics(analytics::AnalyticsArgs),

    /// Classify a raw wallet/RPC error into the user-facing taxonomy
    Classify(analytics::ClassifyArgs),

    /// Run the HTTP API (preferences, reward payout, analysis)
    Serve(service::ServeArgs),

    /// Reward payouts
    #[command(subcommand)]
    Reward(service::RewardCommands),

    /// Share contact preferences for a campaign
    OptIn(service::OptInArgs),
}

impl Commands {
    /// Long-running commands get the full logging stack
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Serve(_))
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = AppConfig::load_from(&self.config_dir)
            .with_context(|| format!("loading config from {}", self.config_dir.display()))?;
        if let Err(errors) = config.validate() {
            anyhow::bail!("invalid configuration:\n  {}", errors.join("\n  "));
        }

        let ctx = CliContext {
            config,
            simulate: self.simulate,
        };
        match self.command {
            Commands::Claim(args) => claim::run_claim(&ctx, args).await,
            Commands::Campaign(cmd) => cmd.run(&ctx).await,
            Commands::Estimate(args) => claim::run_estimate(&ctx, args).await,
            Commands::Analytics(args) => analytics::run_analytics(&ctx, args).await,
            Commands::Classify(args) => analytics::run_classify(args),
            Commands::Serve(args) => service::run_serve(&ctx, args).await,
            Commands::Reward(cmd) => cmd.run(&ctx).await,
            Commands::OptIn(args) => service::run_opt_in(&ctx, args).await,
        }
    }
}

/// Settings shared by every command
pub struct CliContext {
    pub config: AppConfig,
    pub simulate: bool,
}

impl CliContext {
    /// Open a chain session, simulated or against the configured wallet
    pub async fn session(&self, require_signer: bool) -> Result<ChainSession> {
        if self.simulate {
            return simulated_session(&self.config).await;
        }
        Ok(ChainSession::from_config(&self.config, require_signer).await?)
    }
}

/// A session on an in-memory contract seeded with demo campaigns
pub async fn simulated_session(config: &AppConfig) -> Result<ChainSession> {
    let network = config.network.descriptor();
    let wallet = demo_campaigns()
        .into_iter()
        .fold(SimulatedWallet::new(network.clone()), |wallet, campaign| {
            wallet.with_campaign(campaign)
        })
        .with_account(SIMULATED_ACCOUNT)
        .with_native_balance(
            SIMULATED_ACCOUNT,
            U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64)),
        );

    let contract: Address = config
        .contract
        .address
        .parse()
        .context("contract.address is invalid")?;
    info!("Using simulated wallet {} on {}", SIMULATED_ACCOUNT, network.name);
    let session = ChainSession::connect(Some(Arc::new(wallet)), network, contract, true)
        .await?
        .with_receipt_poll(Duration::from_millis(10));
    Ok(session)
}

fn demo_campaigns() -> Vec<NewCampaign> {
    let campaign = |title: &str, category: &str, reward: &str, location: &str, tags: &[&str]| {
        NewCampaign {
            title: title.to_string(),
            category: category.to_string(),
            reward: reward.to_string(),
            image_url: String::new(),
            location: location.to_string(),
            expiry: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    };
    vec![
        campaign(
            "Coffee Shop Rewards",
            "Food & Beverage",
            "Free Coffee",
            "Downtown",
            &["coffee", "drinks", "food"],
        ),
        campaign(
            "Gym Membership Discount",
            "Fitness",
            "50% Off Monthly Membership",
            "Citywide",
            &["fitness", "health", "gym"],
        ),
        campaign(
            "Book Store Points",
            "Retail",
            "500 Loyalty Points",
            "Mall",
            &["books", "reading", "retail"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_simulate_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "proofperks",
            "claim",
            "0x0000000000000000000000000000000000000001",
            "0",
            "--simulate",
        ])
        .unwrap();
        assert!(cli.simulate);
        assert!(matches!(cli.command, Commands::Claim(_)));
    }

    #[test]
    fn campaign_subcommands_parse() {
        let cli = Cli::try_parse_from(["proofperks", "campaign", "show", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Campaign(campaign::CampaignCommands::Show { id: 2, .. })
        ));
        assert!(!cli.command.is_long_running());
    }

    #[tokio::test]
    async fn simulated_session_has_demo_campaigns() {
        let session = simulated_session(&AppConfig::default_config()).await.unwrap();
        assert_eq!(session.campaign_count().await.unwrap(), 3);
        assert_eq!(session.account(), Some(SIMULATED_ACCOUNT));
    }
}
