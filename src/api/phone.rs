use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::lookup::{FieldMap, LookupResult};
use crate::middleware::{ApiResult, AppError, not_blank, validation_failed};
use crate::scoring::phone::{PhoneReputation, UNKNOWN_COUNTRY_MESSAGE, reputation};

const EMPTY_PHONE_MESSAGE: &str = "Please enter a phone number";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRequest {
    #[validate(
        length(max = 32, message = "Phone number must be at most 32 characters"),
        custom(function = "not_blank")
    )]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneResponse {
    pub data: FieldMap,
    pub source: String,
}

impl From<LookupResult> for PhoneResponse {
    fn from(result: LookupResult) -> Self {
        Self {
            data: result.data,
            source: result.source,
        }
    }
}

/// Validate a number: NumVerify when configured, heuristic report otherwise
pub async fn track_phone(
    State(state): State<AppState>,
    Json(req): Json<PhoneRequest>,
) -> ApiResult<PhoneResponse> {
    req.validate()
        .map_err(|e| validation_failed(EMPTY_PHONE_MESSAGE, e))?;
    let result = state
        .phone
        .validate(&req.phone_number)
        .await
        .map_err(AppError::from)?;
    Ok(Json(result.into()))
}

pub async fn phone_reputation(Json(req): Json<PhoneRequest>) -> ApiResult<PhoneReputation> {
    req.validate()
        .map_err(|e| validation_failed(EMPTY_PHONE_MESSAGE, e))?;
    let report = reputation(req.phone_number.trim())
        .ok_or_else(|| AppError::Validation(UNKNOWN_COUNTRY_MESSAGE.to_string()))?;
    Ok(Json(report))
}
