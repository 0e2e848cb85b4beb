use axum::{
    Json,
    extract::{Multipart, State, WebSocketUpgrade},
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use super::upload::read_form;
use crate::middleware::{ApiResult, AppError, not_blank, validation_failed};
use crate::scoring::file_risk::{
    AnalysisReport, FileProperties, SecurityVerdict, analyze_file, security_rating,
};
use crate::transport::relay::UploadOutcome;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct PrepareSendRequest {
    #[validate(
        length(max = 253, message = "Host must be at most 253 characters"),
        custom(function = "not_blank")
    )]
    pub host: String,
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
    #[validate(length(min = 1, max = 128, message = "Password must be 1 to 128 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSendResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PrepareReceiveRequest {
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
    #[validate(length(min = 1, max = 128, message = "Password must be 1 to 128 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareReceiveResponse {
    pub success: bool,
    /// Uploads already staged for this password
    pub pending_files: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    /// True when a receiver was already connected and got the file directly
    pub delivered: bool,
    /// Receiver address given to `prepare-send`
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct IntegrityResponse {
    pub report: AnalysisReport,
    pub verdict: SecurityVerdict,
    pub properties: FileProperties,
}

// ============================================
// REST handlers
// ============================================

pub async fn prepare_send(
    State(state): State<AppState>,
    Json(req): Json<PrepareSendRequest>,
) -> ApiResult<PrepareSendResponse> {
    req.validate()
        .map_err(|e| validation_failed("Please enter host, port and password", e))?;
    let session_id = state
        .hub
        .prepare_send(req.host.trim(), req.port, &req.password)
        .await;
    Ok(Json(PrepareSendResponse { session_id }))
}

/// Multipart upload with `file` and `sessionId` parts
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut form = read_form(multipart, state.config.max_upload_bytes).await?;
    let raw_id = form
        .field("sessionId")
        .ok_or_else(|| AppError::Validation("Missing sessionId".to_string()))?;
    let session_id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| AppError::Validation("sessionId is not a valid UUID".to_string()))?;
    let file = form.require_file()?;

    let session = state
        .hub
        .take_session(session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

    let (host, port) = (session.host.clone(), session.port);
    let outcome = state
        .hub
        .stage_upload(session, file.name, file.bytes)
        .await
        .map_err(AppError::from)?;

    Ok(Json(UploadResponse {
        success: true,
        delivered: outcome == UploadOutcome::Delivered,
        host,
        port,
    }))
}

pub async fn prepare_receive(
    State(state): State<AppState>,
    Json(req): Json<PrepareReceiveRequest>,
) -> ApiResult<PrepareReceiveResponse> {
    req.validate()
        .map_err(|e| validation_failed("Please enter port and password", e))?;
    let pending_files = state.hub.pending_for(&req.password).await;
    tracing::info!(port = req.port, pending_files, "Receiver prepared");
    Ok(Json(PrepareReceiveResponse {
        success: true,
        pending_files,
    }))
}

/// Simulated multi-vendor scan of an uploaded file
pub async fn check_integrity(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<IntegrityResponse> {
    let mut form = read_form(multipart, state.config.max_upload_bytes).await?;
    let file = form.require_file()?;
    Ok(Json(integrity_for(&file.name, &file.content_type, &file.bytes)))
}

/// Shared with the file security page.
pub fn integrity_for(name: &str, content_type: &str, bytes: &[u8]) -> IntegrityResponse {
    let mut rng = rand::thread_rng();
    let (report, properties) = analyze_file(name, content_type, bytes, &mut rng);
    let verdict = security_rating(&report);
    tracing::info!(
        file = %name,
        size = bytes.len(),
        rating = ?verdict.rating,
        "File integrity check"
    );
    IntegrityResponse {
        report,
        verdict,
        properties,
    }
}

// ============================================
// Relay sockets
// ============================================

pub async fn send_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    let limit = hub.frame_limit();
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| async move { hub.serve_sender(socket).await })
}

pub async fn receive_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    let limit = hub.frame_limit();
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| async move { hub.serve_receiver(socket).await })
}
