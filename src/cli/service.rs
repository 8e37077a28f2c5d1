//! Backend commands
//!
//! proofperks serve              - Run the preferences/reward/analysis API
//! proofperks reward send <to>   - Pay an opt-in reward
//! proofperks opt-in ...         - Share contact preferences for a campaign

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use super::output::{self, print_kv};
use super::{simulated_session, CliContext};
use crate::api::{create_router, AppState, PreferenceStore};
use crate::domain::{MarketingPreferences, OptInRecord};
use crate::services::{BackendClient, RewardPayer};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address; defaults to api.bind
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RewardCommands {
    /// Send the configured reward amount to an address
    Send {
        to: String,

        /// Go through the reward service instead of paying locally
        #[arg(long)]
        remote: bool,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct OptInArgs {
    /// Participant wallet address
    pub wallet: String,

    pub campaign_id: u64,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// Agree to email marketing
    #[arg(long)]
    pub marketing_email: bool,

    /// Agree to SMS marketing
    #[arg(long)]
    pub marketing_sms: bool,

    /// Agree to push notifications
    #[arg(long)]
    pub marketing_push: bool,

    /// Only report whether this wallet already shared its details
    #[arg(long)]
    pub check: bool,
}

pub async fn run_serve(ctx: &CliContext, args: ServeArgs) -> Result<()> {
    let state = if ctx.simulate {
        let session = simulated_session(&ctx.config).await?;
        let reward = RewardPayer::new(
            session,
            ctx.config.api.reward_amount,
            ctx.config.api.reward_gas_limit,
        )?;
        AppState::new(PreferenceStore::in_memory(), Some(reward))
    } else {
        AppState::from_config(&ctx.config).await?
    };

    let bind = args.bind.unwrap_or_else(|| ctx.config.api.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind}"))?;

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("🚀 API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

impl RewardCommands {
    pub async fn run(self, ctx: &CliContext) -> Result<()> {
        match self {
            Self::Send { to, remote, json } => {
                let response = if remote {
                    BackendClient::from_config(&ctx.config.services)?
                        .send_reward(&to)
                        .await?
                } else {
                    local_payer(ctx).await?.pay(Some(&to)).await?
                };

                if json {
                    return output::print_item(&response);
                }
                println!("\x1b[32m✓ Reward sent\x1b[0m");
                print_kv("Amount", &response.amount);
                print_kv("From", &response.from);
                print_kv("To", &response.to);
                print_kv("Transaction", &response.transaction_hash);
                Ok(())
            }
        }
    }
}

async fn local_payer(ctx: &CliContext) -> Result<RewardPayer> {
    if ctx.simulate {
        let session = simulated_session(&ctx.config).await?;
        return Ok(RewardPayer::new(
            session,
            ctx.config.api.reward_amount,
            ctx.config.api.reward_gas_limit,
        )?);
    }
    RewardPayer::from_env(&ctx.config)
        .await?
        .context("BUSINESS_PRIVATE_KEY is not set")
}

pub async fn run_opt_in(ctx: &CliContext, args: OptInArgs) -> Result<()> {
    let client = BackendClient::from_config(&ctx.config.services)?;

    if args.check {
        let shared = client.has_shared(&args.wallet, args.campaign_id).await?;
        print_kv("Shared", shared);
        return Ok(());
    }

    let email = args
        .email
        .context("--email is required to share preferences")?;
    let mut record = OptInRecord::new(args.wallet, args.campaign_id, email);
    record.phone = args.phone.unwrap_or_default();
    record.preferences = MarketingPreferences {
        email: args.marketing_email,
        sms: args.marketing_sms,
        push: args.marketing_push,
    };
    record.validate()?;

    let response = client.save_preferences(&record).await?;
    println!("\x1b[32m✓ {}\x1b[0m", response.message);
    Ok(())
}
