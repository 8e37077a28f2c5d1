//! Gas limit and price estimation with safety margins
//!
//! Live values get a margin on top; failures fall back to configured defaults once,
//! with a warning. There are no retries.

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use tracing::{debug, instrument, warn};

use crate::chain::contract::encode_mint_proof;
use crate::chain::{CallRequest, ChainSession};
use crate::config::GasConfig;
use crate::domain::{NormalizedParams, TransactionCostEstimate};
use crate::error::Result;

/// `value * (100 + pct) / 100` without overflow
pub fn with_margin_u64(value: u64, pct: u64) -> u64 {
    let scaled = u128::from(value) * u128::from(100u64.saturating_add(pct)) / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Never returns less than `value`
pub fn with_margin_u128(value: u128, pct: u64) -> u128 {
    let factor = u128::from(100u64.saturating_add(pct));
    match value.checked_mul(factor) {
        Some(scaled) => scaled / 100,
        None => (value / 100).saturating_mul(factor).max(value),
    }
}

#[derive(Debug, Clone)]
pub struct GasEstimator {
    config: GasConfig,
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(GasConfig::default())
    }
}

impl GasEstimator {
    pub fn new(config: GasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GasConfig {
        &self.config
    }

    /// Simulated gas for `mintProof(params)` plus the limit margin, or the default
    /// limit when simulation fails
    #[instrument(skip(self, session, params), fields(campaign_id = %params.campaign_id))]
    pub async fn estimate_gas(
        &self,
        session: &ChainSession,
        params: &NormalizedParams,
    ) -> Result<u64> {
        session.ensure_active()?;

        let mut request = CallRequest::new(session.contract_address(), encode_mint_proof(params));
        if let Some(from) = session.account() {
            request = request.from(from);
        }

        match session.estimate_gas(&request).await {
            Ok(estimate) => {
                let limit = with_margin_u64(estimate, self.config.limit_margin_pct);
                debug!("Gas estimate {} -> limit {}", estimate, limit);
                Ok(limit)
            }
            Err(e) => {
                warn!(
                    "Gas estimation failed, using default limit {}: {}",
                    self.config.default_limit, e
                );
                Ok(self.config.default_limit)
            }
        }
    }

    /// Network gas price plus the price margin, or the default price on failure
    #[instrument(skip(self, session))]
    pub async fn current_gas_price(&self, session: &ChainSession) -> Result<u128> {
        session.ensure_active()?;

        match session.gas_price().await {
            Ok(price) => Ok(with_margin_u128(price, self.config.price_margin_pct)),
            Err(e) => {
                warn!(
                    "Gas price query failed, using default {} gwei: {}",
                    self.config.default_price_gwei, e
                );
                Ok(self.config.default_price_wei())
            }
        }
    }
}

/// `limit * price` in wei, formatted in native units of `decimals`
pub fn estimate_cost(gas_limit: u64, gas_price: u128, decimals: u8) -> TransactionCostEstimate {
    let cost_wei = U256::from(gas_limit) * U256::from(gas_price);
    TransactionCostEstimate {
        gas_limit,
        gas_price,
        cost_wei,
        cost_native: format_amount(cost_wei, decimals),
        gas_price_gwei: format!("{} gwei", format_amount(U256::from(gas_price), 9)),
    }
}

/// Render a base-unit amount with `decimals` places, trailing zeros trimmed
pub fn format_amount(amount: U256, decimals: u8) -> String {
    match format_units(amount, decimals) {
        Ok(formatted) => trim_zeros(&formatted),
        Err(_) => amount.to_string(),
    }
}

fn trim_zeros(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    let trimmed = formatted.trim_end_matches('0');
    match trimmed.strip_suffix('.') {
        Some(whole) => format!("{whole}.0"),
        None => trimmed.to_string(),
    }
}
