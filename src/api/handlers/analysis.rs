use axum::{extract::rejection::JsonRejection, Json};

use super::{rejection_response, ApiError};
use crate::analytics::analyze;
use crate::api::types::{AnalyzeRequest, AnalyzeResponse};

/// POST /api/analyze
pub async fn analyze_campaign(
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body.map_err(rejection_response)?;
    Ok(Json(AnalyzeResponse {
        insights: analyze(&request.campaign_data),
    }))
}
