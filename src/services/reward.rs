//! Opt-in reward payouts from the business wallet

use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument};
use zeroize::Zeroize;

use crate::api::types::SendRewardResponse;
use crate::chain::{CallRequest, ChainSession, RpcWallet, WalletProvider};
use crate::config::AppConfig;
use crate::error::{PerksError, Result};
use crate::tx::gas::format_amount;
use crate::tx::validator::parse_address;

/// Pays a fixed native-currency amount to participants who opted in
pub struct RewardPayer {
    session: ChainSession,
    amount_wei: U256,
    amount: String,
    gas_limit: u64,
}

impl RewardPayer {
    /// `session` must carry a signing account
    pub fn new(session: ChainSession, amount: Decimal, gas_limit: u64) -> Result<Self> {
        session.signer()?;
        if amount <= Decimal::ZERO {
            return Err(PerksError::Validation(format!(
                "reward amount must be positive: {amount}"
            )));
        }
        let decimals = session.network().currency.decimals;
        let amount_wei = parse_units(&amount.to_string(), decimals)
            .map_err(|e| PerksError::Validation(format!("invalid reward amount {amount}: {e}")))?
            .get_absolute();
        Ok(Self {
            amount: format_amount(amount_wei, decimals),
            session,
            amount_wei,
            gas_limit,
        })
    }

    /// Business wallet from `BUSINESS_PRIVATE_KEY`; `None` when the key is not set
    pub async fn from_env(config: &AppConfig) -> Result<Option<Self>> {
        let Ok(mut key) = std::env::var("BUSINESS_PRIVATE_KEY") else {
            return Ok(None);
        };
        if key.trim().is_empty() {
            return Ok(None);
        }

        let rpc_url = config
            .wallet
            .rpc_url
            .clone()
            .or_else(|| config.network.rpc_urls.first().cloned())
            .ok_or_else(|| PerksError::NoWallet("no RPC endpoint configured".into()))?;
        let wallet = RpcWallet::connect(&rpc_url, Some(&key));
        key.zeroize();
        let wallet: Arc<dyn WalletProvider> = Arc::new(wallet?);

        let contract: Address = config.contract.address.parse().map_err(|e| {
            PerksError::Validation(format!("contract.address is invalid: {e}"))
        })?;
        let session =
            ChainSession::connect(Some(wallet), config.network.descriptor(), contract, true)
                .await?;
        let payer = Self::new(session, config.api.reward_amount, config.api.reward_gas_limit)?;
        info!(
            "Business wallet setup successful. Address: {}",
            payer.session.account().unwrap_or_default()
        );
        Ok(Some(payer))
    }

    pub fn session(&self) -> &ChainSession {
        &self.session
    }

    /// Formatted payout amount, e.g. "2.0"
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Send the reward to `to_address` and wait for inclusion
    #[instrument(skip(self))]
    pub async fn pay(&self, to_address: Option<&str>) -> Result<SendRewardResponse> {
        let to_raw = to_address
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PerksError::Validation("Recipient address is required".into()))?;
        let to = parse_address(to_raw)?;

        let from = self.session.signer()?;
        if to == from {
            return Err(PerksError::Validation(
                "Invalid recipient address - Cannot send to business wallet".into(),
            ));
        }

        let balance = self.session.native_balance(from).await?;
        info!(
            "Business wallet balance: {} {}",
            format_amount(balance, self.session.network().currency.decimals),
            self.session.network().currency.symbol
        );
        if balance < self.amount_wei {
            error!("Insufficient balance in business wallet");
            return Err(PerksError::Service(
                "Insufficient balance in business wallet".into(),
            ));
        }

        info!(
            "Sending {} {} from {} to {}",
            self.amount,
            self.session.network().currency.symbol,
            from,
            to
        );
        let request = CallRequest::new(to, Bytes::new())
            .value(self.amount_wei)
            .gas_limit(self.gas_limit);
        let tx_hash = self.session.send(request).await?;
        info!("Transaction sent! Hash: {}", tx_hash);

        let receipt = self.session.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(PerksError::Service(format!(
                "reward transaction {tx_hash} reverted"
            )));
        }
        info!("Transaction confirmed! Block: {:?}", receipt.block_number);

        Ok(SendRewardResponse {
            success: true,
            transaction_hash: tx_hash.to_string(),
            amount: self.amount.clone(),
            block_number: receipt.block_number,
            from: from.to_string(),
            to: to_raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{NetworkDescriptor, SimulatedWallet};
    use alloy::primitives::address;

    const BUSINESS: Address = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");

    async fn payer(balance: U256) -> RewardPayer {
        let wallet = SimulatedWallet::new(NetworkDescriptor::xrpl_evm_sidechain())
            .with_account(BUSINESS)
            .with_native_balance(BUSINESS, balance);
        let session = ChainSession::connect(
            Some(Arc::new(wallet)),
            NetworkDescriptor::xrpl_evm_sidechain(),
            Address::ZERO,
            true,
        )
        .await
        .unwrap();
        RewardPayer::new(session, Decimal::TWO, 100_000).unwrap()
    }

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[tokio::test]
    async fn pays_two_xrp() {
        let payer = payer(ether(10)).await;
        assert_eq!(payer.amount(), "2.0");

        let to = format!("{:?}", Address::repeat_byte(0x11));
        let response = payer.pay(Some(&to)).await.unwrap();
        assert!(response.success);
        assert_eq!(response.amount, "2.0");
        assert_eq!(response.to, to);
        assert!(response.block_number.is_some());
        assert_eq!(
            payer
                .session()
                .native_balance(Address::repeat_byte(0x11))
                .await
                .unwrap(),
            ether(2)
        );
    }

    #[tokio::test]
    async fn rejects_bad_recipients() {
        let payer = payer(ether(10)).await;

        assert!(matches!(payer.pay(None).await, Err(PerksError::Validation(_))));
        assert!(matches!(
            payer.pay(Some("0x123")).await,
            Err(PerksError::InvalidAddress(_))
        ));
        let own = format!("{:?}", BUSINESS);
        assert!(matches!(
            payer.pay(Some(&own)).await,
            Err(PerksError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn refuses_when_underfunded() {
        let payer = payer(ether(1)).await;
        let to = format!("{:?}", Address::repeat_byte(0x11));
        assert!(matches!(payer.pay(Some(&to)).await, Err(PerksError::Service(_))));
    }
}
