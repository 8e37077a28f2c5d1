use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use super::{api_error, error_response, rejection_response, ApiError};
use crate::api::{state::AppState, types::*};

/// POST /api/send-reward
pub async fn send_reward(
    State(state): State<AppState>,
    body: std::result::Result<Json<SendRewardRequest>, JsonRejection>,
) -> std::result::Result<Json<SendRewardResponse>, ApiError> {
    let Json(request) = body.map_err(rejection_response)?;
    let Some(payer) = state.reward.as_ref() else {
        error!("Business wallet not configured");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Business wallet not configured",
        ));
    };

    info!("Starting reward transaction to {:?}", request.to_address);
    match payer.pay(request.to_address.as_deref()).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Error sending reward: {}", e);
            Err(error_response(&e))
        }
    }
}
