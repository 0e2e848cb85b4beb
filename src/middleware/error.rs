use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::lookup::LookupError;
use crate::transport::TransferError;

#[derive(Serialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Handler result type. Errors carry the status and the JSON body together.
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected before any network call
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("session {0} not found or expired")]
    SessionNotFound(String),

    #[error("file exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },

    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::Lookup(LookupError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Lookup(_) => StatusCode::BAD_GATEWAY,
            AppError::Transfer(TransferError::NoReceiver) => StatusCode::CONFLICT,
            AppError::Transfer(TransferError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Transfer(TransferError::StagingFull { .. }) => StatusCode::CONFLICT,
            AppError::Transfer(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "INVALID_INPUT",
            AppError::Lookup(LookupError::Validation(_)) => "INVALID_INPUT",
            AppError::Lookup(_) => "PROVIDER_FAILED",
            AppError::Transfer(TransferError::StagingFull { .. }) => "STAGING_FULL",
            AppError::Transfer(_) => "TRANSFER_FAILED",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            AppError::Multipart(_) => "INVALID_MULTIPART",
        }
    }
}

impl From<AppError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: AppError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::warn!("Request failed upstream: {}", err);
        }
        (status, Json(ErrorResponse::new(err.to_string(), err.code())))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Json<ErrorResponse>) = self.into();
        (status, body).into_response()
    }
}

/// `validator` rule: the field must contain something besides whitespace.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Map `validator` failures onto the 400 response with the offending fields
/// listed in `details`. The first rule that carries its own message (fields
/// in name order) wins over `fallback`, which covers blank input.
pub fn validation_failed(
    fallback: &str,
    errors: validator::ValidationErrors,
) -> (StatusCode, Json<ErrorResponse>) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| fallback.to_string());
    let names: Vec<String> = fields.iter().map(|(k, _)| k.to_string()).collect();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, "INVALID_INPUT").with_details(names.join(", "))),
    )
}
