use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::lookup::FieldMap;
use crate::middleware::{ApiResult, AppError};
use crate::scoring::username;

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UsernameResponse {
    pub data: FieldMap,
}

/// Score a username against the platform table. Purely local: no platform
/// is contacted.
pub async fn track_username(Json(req): Json<UsernameRequest>) -> ApiResult<UsernameResponse> {
    let name = req.username.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Please enter a username".to_string()).into());
    }
    let data = username::search(name, Utc::now())
        .map_err(|message| AppError::Validation(message.to_string()))?;
    tracing::debug!("Username search for {} found {:?}", name, data.get("Profiles Found"));
    Ok(Json(UsernameResponse { data }))
}
