//! `proofperks claim` and `proofperks estimate`

use anyhow::Result;
use clap::Args;
use tokio::task::JoinHandle;
use tracing::info;

use super::output::print_kv;
use super::CliContext;
use crate::domain::{ClaimOutcome, ClaimRequest, ClaimState};
use crate::tx::gas::{estimate_cost, GasEstimator};
use crate::tx::{validate, ClaimOrchestrator};

#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Recipient address (0x + 40 hex)
    pub to: String,

    /// Campaign id (decimal or 0x hex)
    pub campaign_id: String,

    /// Payload stored with the proof (UTF-8 text or 0x hex); a timestamp record if omitted
    #[arg(long)]
    pub payload: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Recipient address
    pub to: String,

    /// Campaign id
    pub campaign_id: String,

    #[arg(long)]
    pub json: bool,
}

fn claim_request(to: &str, campaign_id: &str, payload: Option<String>) -> ClaimRequest {
    let request = ClaimRequest::new(to, campaign_id);
    match payload {
        Some(payload) => request.with_payload(payload),
        None => request,
    }
}

pub async fn run_claim(ctx: &CliContext, args: ClaimArgs) -> Result<()> {
    let session = ctx.session(true).await?;
    let orchestrator = ClaimOrchestrator::new(GasEstimator::new(ctx.config.gas.clone()));
    let request = claim_request(&args.to, &args.campaign_id, args.payload);

    let progress = print_progress(&orchestrator, args.json);
    let result = orchestrator.claim(&session, &request).await;
    progress.abort();

    match result {
        Ok(outcome) => {
            if args.json {
                return super::output::print_item(&outcome);
            }
            match &outcome {
                ClaimOutcome::AlreadyClaimed {
                    recipient,
                    campaign_id,
                } => {
                    println!("\x1b[33m● {recipient} already holds the proof for campaign {campaign_id}\x1b[0m");
                }
                ClaimOutcome::Minted {
                    tx_hash,
                    block_number,
                    cost,
                    ..
                } => {
                    println!("\x1b[32m✓ Proof minted\x1b[0m");
                    print_kv("Transaction", tx_hash);
                    if let Some(url) = session.network().tx_url(&tx_hash.to_string()) {
                        print_kv("Explorer", url);
                    }
                    print_kv(
                        "Block",
                        block_number.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
                    );
                    print_kv(
                        "Cost",
                        format!("{} {}", cost.cost_native, session.network().currency.symbol),
                    );
                }
            }
            Ok(())
        }
        Err(failure) => {
            if args.json {
                super::output::print_item(&failure.error)?;
            } else {
                println!("\x1b[31m✗ {}\x1b[0m", failure.error.message);
                print_kv("Type", failure.kind());
                print_kv("Stage", failure.stage);
            }
            Err(failure.into())
        }
    }
}

/// Echo state changes while the claim runs
fn print_progress(orchestrator: &ClaimOrchestrator, quiet: bool) -> JoinHandle<()> {
    let mut status = orchestrator.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            if quiet || current.state.is_terminal() || current.state == ClaimState::Idle {
                continue;
            }
            println!("  … {}", current.message);
        }
    })
}

pub async fn run_estimate(ctx: &CliContext, args: EstimateArgs) -> Result<()> {
    let params = validate(&claim_request(&args.to, &args.campaign_id, None))?;
    let session = ctx.session(false).await?;
    let estimator = GasEstimator::new(ctx.config.gas.clone());

    let gas_limit = estimator.estimate_gas(&session, &params).await?;
    let gas_price = estimator.current_gas_price(&session).await?;
    let cost = estimate_cost(gas_limit, gas_price, session.network().currency.decimals);
    info!("Estimated claim for {} on campaign {}", params.to, params.campaign_id);

    if args.json {
        return super::output::print_item(&cost);
    }
    print_kv("Gas limit", cost.gas_limit);
    print_kv("Gas price", &cost.gas_price_gwei);
    print_kv(
        "Estimated cost",
        format!("{} {}", cost.cost_native, session.network().currency.symbol),
    );
    Ok(())
}
