//! Claim orchestration
//!
//! Drives one claim attempt through
//! `Idle -> Checking -> Estimating -> Submitting -> Confirming -> {Success | Failed}`.
//! An existing proof short-circuits to `Success` without submitting anything, so
//! repeating a claim is always safe. Failed attempts are terminal; callers retry
//! explicitly.

use alloy::primitives::{Address, U256};
use dashmap::DashSet;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::chain::contract::encode_mint_proof;
use crate::chain::{CallRequest, ChainSession};
use crate::domain::{ClaimOutcome, ClaimRequest, ClaimState, NormalizedParams};
use crate::error::PerksError;
use crate::tx::classifier::{classify_error, ClassifiedError, ErrorKind, RevertArgs};
use crate::tx::gas::{estimate_cost, GasEstimator};
use crate::tx::validator;

/// Status published while a claim runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimStatus {
    pub state: ClaimState,
    pub message: String,
}

impl ClaimStatus {
    fn of(state: ClaimState) -> Self {
        Self {
            state,
            message: state.status_message().to_string(),
        }
    }
}

/// A failed attempt: the state it failed in and the classified cause
#[derive(Debug, Clone, Error)]
#[error("claim failed while {stage}: {error}")]
pub struct ClaimFailure {
    pub stage: ClaimState,
    pub error: ClassifiedError,
}

impl ClaimFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }
}

/// Removes the (recipient, campaign) key when the attempt ends
struct InFlightGuard<'a> {
    set: &'a DashSet<(Address, U256)>,
    key: (Address, U256),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

struct Attempt<'a> {
    state: ClaimState,
    status: &'a watch::Sender<ClaimStatus>,
}

impl<'a> Attempt<'a> {
    fn start(status: &'a watch::Sender<ClaimStatus>) -> Self {
        status.send_replace(ClaimStatus::of(ClaimState::Idle));
        Self {
            state: ClaimState::Idle,
            status,
        }
    }

    fn advance(&mut self, next: ClaimState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected claim transition {} -> {}", self.state, next);
        }
        self.state = next;
        self.status.send_replace(ClaimStatus::of(next));
    }

    fn fail(&mut self, error: ClassifiedError) -> ClaimFailure {
        let stage = self.state;
        warn!("Claim failed while {}: {}", stage, error);
        if !self.state.can_transition_to(ClaimState::Failed) {
            warn!("Unexpected claim transition {} -> FAILED", self.state);
        }
        self.state = ClaimState::Failed;
        self.status.send_replace(ClaimStatus {
            state: ClaimState::Failed,
            message: error.message.clone(),
        });
        ClaimFailure { stage, error }
    }

    fn fail_with(&mut self, err: &PerksError) -> ClaimFailure {
        self.fail(classify_error(err))
    }
}

pub struct ClaimOrchestrator {
    gas: GasEstimator,
    in_flight: DashSet<(Address, U256)>,
    status: watch::Sender<ClaimStatus>,
}

impl Default for ClaimOrchestrator {
    fn default() -> Self {
        Self::new(GasEstimator::default())
    }
}

impl ClaimOrchestrator {
    pub fn new(gas: GasEstimator) -> Self {
        let (status, _) = watch::channel(ClaimStatus::of(ClaimState::Idle));
        Self {
            gas,
            in_flight: DashSet::new(),
            status,
        }
    }

    /// Follow the state of the running (or last) attempt
    pub fn subscribe(&self) -> watch::Receiver<ClaimStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ClaimStatus {
        self.status.borrow().clone()
    }

    pub fn is_in_flight(&self, recipient: Address, campaign_id: U256) -> bool {
        self.in_flight.contains(&(recipient, campaign_id))
    }

    /// Run one claim attempt
    #[instrument(skip(self, session, request), fields(to = %request.to, campaign_id = %request.campaign_id))]
    pub async fn claim(
        &self,
        session: &ChainSession,
        request: &ClaimRequest,
    ) -> std::result::Result<ClaimOutcome, ClaimFailure> {
        let params = match session
            .ensure_active()
            .and_then(|_| validator::validate(request))
        {
            Ok(params) => params,
            Err(e) => {
                return Err(ClaimFailure {
                    stage: ClaimState::Idle,
                    error: classify_error(&e),
                })
            }
        };

        let key = (params.to, params.campaign_id);
        if !self.in_flight.insert(key) {
            let err = PerksError::ClaimInProgress {
                recipient: params.to.to_string(),
                campaign_id: params.campaign_id.to_string(),
            };
            return Err(ClaimFailure {
                stage: ClaimState::Idle,
                error: classify_error(&err),
            });
        }
        let _guard = InFlightGuard {
            set: &self.in_flight,
            key,
        };

        let mut attempt = Attempt::start(&self.status);
        self.run(session, &params, &mut attempt).await
    }

    async fn run(
        &self,
        session: &ChainSession,
        params: &NormalizedParams,
        attempt: &mut Attempt<'_>,
    ) -> std::result::Result<ClaimOutcome, ClaimFailure> {
        // Checking
        attempt.advance(ClaimState::Checking);
        let balance = session
            .balance_of(params.to, params.campaign_id)
            .await
            .map_err(|e| attempt.fail_with(&e))?;
        if balance > U256::ZERO {
            info!(
                "{} already holds proof for campaign {}",
                params.to, params.campaign_id
            );
            attempt.advance(ClaimState::Success);
            return Ok(ClaimOutcome::AlreadyClaimed {
                recipient: params.to,
                campaign_id: params.campaign_id,
            });
        }

        let campaign_count = session
            .current_campaign_id()
            .await
            .map_err(|e| attempt.fail_with(&e))?;
        if params.campaign_id >= campaign_count {
            return Err(attempt.fail(ClassifiedError {
                kind: ErrorKind::InvalidCampaign,
                message: format!(
                    "Campaign {} does not exist ({} campaigns)",
                    params.campaign_id, campaign_count
                ),
                args: Some(RevertArgs::InvalidCampaign {
                    campaign_id: params.campaign_id,
                }),
            }));
        }

        // Estimating
        attempt.advance(ClaimState::Estimating);
        let gas_limit = self
            .gas
            .estimate_gas(session, params)
            .await
            .map_err(|e| attempt.fail_with(&e))?;
        let gas_price = self
            .gas
            .current_gas_price(session)
            .await
            .map_err(|e| attempt.fail_with(&e))?;
        let cost = estimate_cost(gas_limit, gas_price, session.network().currency.decimals);
        info!(
            "Claim cost: {} {} (limit {}, price {})",
            cost.cost_native, session.network().currency.symbol, gas_limit, cost.gas_price_gwei
        );

        // Submitting
        attempt.advance(ClaimState::Submitting);
        let request = CallRequest::new(session.contract_address(), encode_mint_proof(params))
            .gas(gas_limit, gas_price);
        let tx_hash = session
            .send(request)
            .await
            .map_err(|e| attempt.fail_with(&e))?;

        // Confirming
        attempt.advance(ClaimState::Confirming);
        let receipt = session
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| attempt.fail_with(&e))?;
        if !receipt.success {
            return Err(attempt.fail(ClassifiedError::new(
                ErrorKind::ContractError,
                format!("Transaction {} reverted", tx_hash),
            )));
        }

        info!(
            "Proof minted for {} on campaign {} in tx {} (block {:?})",
            params.to, params.campaign_id, tx_hash, receipt.block_number
        );
        attempt.advance(ClaimState::Success);
        Ok(ClaimOutcome::Minted {
            recipient: params.to,
            campaign_id: params.campaign_id,
            tx_hash,
            block_number: receipt.block_number,
            cost,
        })
    }
}
