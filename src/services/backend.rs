//! HTTP client for the ProofPerks backend (preferences, reward payout, analysis)

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::analytics::{CampaignData, Insights};
use crate::api::types::{
    AnalyzeRequest, AnalyzeResponse, ErrorResponse, HasSharedResponse, SaveResponse,
    SendRewardRequest, SendRewardResponse,
};
use crate::config::ServicesConfig;
use crate::domain::OptInRecord;
use crate::error::{PerksError, Result};

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("proofperks/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| PerksError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(&config.backend_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Store opt-in details; a record for the same wallet and campaign is `Duplicate`
    #[instrument(skip(self, record), fields(wallet = %record.wallet_address, campaign_id = record.campaign_id))]
    pub async fn save_preferences(&self, record: &OptInRecord) -> Result<SaveResponse> {
        let response = self
            .http
            .post(self.url("/api/preferences"))
            .json(record)
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            let body: ErrorResponse = response.json().await?;
            return Err(PerksError::Duplicate(body.error));
        }
        read_json(response).await
    }

    #[instrument(skip(self))]
    pub async fn has_shared(&self, wallet_address: &str, campaign_id: u64) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/api/preferences"))
            .query(&[
                ("walletAddress", wallet_address.to_string()),
                ("campaignId", campaign_id.to_string()),
            ])
            .send()
            .await?;
        let body: HasSharedResponse = read_json(response).await?;
        Ok(body.has_shared)
    }

    #[instrument(skip(self))]
    pub async fn send_reward(&self, to_address: &str) -> Result<SendRewardResponse> {
        let response = self
            .http
            .post(self.url("/api/send-reward"))
            .json(&SendRewardRequest {
                to_address: Some(to_address.to_string()),
            })
            .send()
            .await?;
        read_json(response).await
    }

    #[instrument(skip(self, campaign_data))]
    pub async fn analyze(&self, campaign_data: &CampaignData) -> Result<Insights> {
        let response = self
            .http
            .post(self.url("/api/analyze"))
            .json(&AnalyzeRequest {
                campaign_data: campaign_data.clone(),
            })
            .send()
            .await?;
        let body: AnalyzeResponse = read_json(response).await?;
        Ok(body.insights)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!("Backend responded {}: {} bytes", status, body.len());

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(PerksError::Service(format!("{}: {}", status, message)));
    }
    Ok(serde_json::from_str(&body)?)
}
