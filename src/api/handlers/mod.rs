use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

use crate::api::types::ErrorResponse;
use crate::error::PerksError;

pub mod analysis;
pub mod preferences;
pub mod reward;

pub use analysis::*;
pub use preferences::*;
pub use reward::*;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Unreadable request bodies get the same JSON error shape as every other failure
pub(crate) fn rejection_response(rejection: JsonRejection) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Map a crate error onto an HTTP status
pub(crate) fn error_response(err: &PerksError) -> ApiError {
    let status = match err {
        PerksError::Validation(_)
        | PerksError::InvalidAddress(_)
        | PerksError::InvalidCampaignId(_)
        | PerksError::Json(_) => StatusCode::BAD_REQUEST,
        PerksError::Duplicate(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match err {
        PerksError::InvalidAddress(_) => "Invalid wallet address format".to_string(),
        PerksError::Validation(msg) | PerksError::Duplicate(msg) | PerksError::Service(msg) => {
            msg.clone()
        }
        other => other.to_string(),
    };
    api_error(status, message)
}
