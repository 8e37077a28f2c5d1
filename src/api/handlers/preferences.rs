use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use tracing::{error, info};

use super::{error_response, rejection_response, ApiError};
use crate::api::{state::AppState, types::*};
use crate::domain::OptInRecord;
use crate::error::PerksError;

/// POST /api/preferences
pub async fn save_preferences(
    State(state): State<AppState>,
    body: std::result::Result<Json<OptInRecord>, JsonRejection>,
) -> std::result::Result<Json<SaveResponse>, ApiError> {
    let Json(record) = body.map_err(rejection_response)?;
    if record.wallet_address.trim().is_empty() {
        return Err(error_response(&PerksError::Validation(
            "walletAddress is required".into(),
        )));
    }
    record.validate().map_err(|e| error_response(&e))?;

    let wallet = record.wallet_address.clone();
    let campaign_id = record.campaign_id;
    state.preferences.insert(record).await.map_err(|e| {
        if !matches!(e, PerksError::Duplicate(_)) {
            error!("Error saving preferences: {}", e);
        }
        error_response(&e)
    })?;

    info!("Saved preferences for {} on campaign {}", wallet, campaign_id);
    Ok(Json(SaveResponse {
        success: true,
        message: "Preferences saved successfully".to_string(),
    }))
}

/// GET /api/preferences?walletAddress=0x..&campaignId=1
pub async fn has_shared(
    State(state): State<AppState>,
    Query(query): Query<PreferencesQuery>,
) -> Json<HasSharedResponse> {
    let has_shared = state
        .preferences
        .has_shared(&query.wallet_address, query.campaign_id)
        .await;
    Json(HasSharedResponse { has_shared })
}
