use std::sync::Arc;

use crate::api::store::PreferenceStore;
use crate::config::AppConfig;
use crate::error::Result;
use crate::services::RewardPayer;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Opt-in records
    pub preferences: Arc<PreferenceStore>,

    /// Business wallet payer (only set when BUSINESS_PRIVATE_KEY is present)
    pub reward: Option<Arc<RewardPayer>>,
}

impl AppState {
    pub fn new(preferences: PreferenceStore, reward: Option<RewardPayer>) -> Self {
        Self {
            preferences: Arc::new(preferences),
            reward: reward.map(Arc::new),
        }
    }

    /// Open the preferences file and set up the business wallet from the environment
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let preferences = PreferenceStore::open(&config.api.preferences_path).await?;
        let reward = RewardPayer::from_env(config).await?;
        if reward.is_none() {
            tracing::warn!("BUSINESS_PRIVATE_KEY not set, reward payouts disabled");
        }
        Ok(Self::new(preferences, reward))
    }

    pub fn with_reward(mut self, reward: RewardPayer) -> Self {
        self.reward = Some(Arc::new(reward));
        self
    }
}
