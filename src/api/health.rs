use axum::{Json, extract::State};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceStatus,
}

/// Which providers have credentials. Unconfigured ones fall back to the
/// synthetic branches, so the service is still healthy without them.
#[derive(Serialize)]
pub struct ServiceStatus {
    pub abuseipdb: bool,
    pub numverify: bool,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}

/// Lightweight liveness check. No outbound calls.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let abuseipdb = state.threat.is_configured();
    let numverify = state.config.numverify_api_key.is_some();

    Json(HealthResponse {
        status: if abuseipdb && numverify {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceStatus {
            abuseipdb,
            numverify,
        },
    })
}
