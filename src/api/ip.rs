use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::lookup::LookupResult;
use crate::middleware::{ApiResult, AppError, not_blank, validation_failed};
use crate::scoring::threat::ThreatProfile;

const EMPTY_IP_MESSAGE: &str = "Please enter an IP address";

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct IpRequest {
    // longest textual IPv6 form is 45 characters
    #[validate(
        length(max = 45, message = "IP address must be at most 45 characters"),
        custom(function = "not_blank")
    )]
    pub ip: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DarkWebResponse {
    pub ip: String,
    pub dark_web_mentions: u32,
    pub last_dark_web_mention: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CurrentIpResponse {
    pub ip: String,
}

// ============================================
// Handlers
// ============================================

/// Geolocate an IP (primary provider, one fallback hop)
pub async fn track_ip(
    State(state): State<AppState>,
    Json(req): Json<IpRequest>,
) -> ApiResult<LookupResult> {
    req.validate()
        .map_err(|e| validation_failed(EMPTY_IP_MESSAGE, e))?;
    let ip = req.ip.trim().to_string();
    tracing::debug!("IP lookup for {}", ip);
    let result = state.geo.lookup(&ip).await.map_err(AppError::from)?;
    Ok(Json(result))
}

/// Reputation profile; simulated when AbuseIPDB is not reachable
pub async fn threat_ip(
    State(state): State<AppState>,
    Json(req): Json<IpRequest>,
) -> ApiResult<ThreatProfile> {
    req.validate()
        .map_err(|e| validation_failed(EMPTY_IP_MESSAGE, e))?;
    let ip = req.ip.trim().to_string();
    Ok(Json(state.threat.check(&ip).await))
}

pub async fn dark_web_ip(
    State(state): State<AppState>,
    Json(req): Json<IpRequest>,
) -> ApiResult<DarkWebResponse> {
    req.validate()
        .map_err(|e| validation_failed(EMPTY_IP_MESSAGE, e))?;
    let ip = req.ip.trim().to_string();
    let profile = state.threat.check(&ip).await;
    Ok(Json(DarkWebResponse {
        ip,
        dark_web_mentions: profile.dark_web_mentions,
        last_dark_web_mention: profile.last_dark_web_mention,
    }))
}

pub async fn my_ip(State(state): State<AppState>) -> ApiResult<CurrentIpResponse> {
    let ip = state.geo.current_ip().await.map_err(AppError::from)?;
    Ok(Json(CurrentIpResponse { ip }))
}
