// ============================================
// Backend client
// ============================================
//
// Typed client for the REST surface. Every call resolves to an
// `ApiResponse` instead of an error: transport problems become a message
// with status 0 so callers can show them directly.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::transport::Notifier;

pub const TIMEOUT_MESSAGE: &str = "Request timed out. The backend server is not responding.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// HTTP status, or 0 when no response was received
    pub status: u16,
}

impl<T> ApiResponse<T> {
    fn failure(error: impl Into<String>, status: u16) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentIp {
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ack {
    pub success: bool,
}

/// Toast texts for [`report`].
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    pub loading: &'a str,
    pub success: &'a str,
    pub error: &'a str,
}

impl Default for Messages<'_> {
    fn default() -> Self {
        Self {
            loading: "Processing...",
            success: "Operation successful",
            error: "Operation failed",
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn connect_message(&self) -> String {
        format!(
            "Cannot connect to the backend server. Please ensure that:\n\
             1. The backend is running on {}\n\
             2. CORS is properly configured on the backend\n\
             3. There are no network issues between frontend and backend",
            self.base_url
        )
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResponse<T> {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return self.transport_failure(e),
        };

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(|b| b.get("message").or_else(|| b.get("error")))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
            return ApiResponse::failure(message, status.as_u16());
        }

        if status == StatusCode::NO_CONTENT {
            return ApiResponse {
                data: serde_json::from_value(json!({})).ok(),
                error: None,
                status: status.as_u16(),
            };
        }

        match response.json::<T>().await {
            Ok(data) => ApiResponse {
                data: Some(data),
                error: None,
                status: status.as_u16(),
            },
            Err(e) if e.is_timeout() => ApiResponse::failure(TIMEOUT_MESSAGE, 0),
            Err(e) => ApiResponse::failure(format!("Invalid response body: {}", e), status.as_u16()),
        }
    }

    fn transport_failure<T>(&self, e: reqwest::Error) -> ApiResponse<T> {
        tracing::error!("API request failed: {}", e);
        if e.is_timeout() {
            ApiResponse::failure(TIMEOUT_MESSAGE, 0)
        } else if e.is_connect() {
            ApiResponse::failure(self.connect_message(), 0)
        } else {
            ApiResponse::failure(e.to_string(), 0)
        }
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> ApiResponse<T> {
        self.execute(self.http.post(self.url(path)).json(&body)).await
    }

    pub async fn track_ip(&self, ip: &str) -> ApiResponse<Value> {
        self.post_json("/api/track/ip", json!({ "ip": ip })).await
    }

    pub async fn ip_threat_intelligence(&self, ip: &str) -> ApiResponse<Value> {
        self.post_json("/api/threat/ip", json!({ "ip": ip })).await
    }

    pub async fn check_dark_web_for_ip(&self, ip: &str) -> ApiResponse<Value> {
        self.post_json("/api/darkweb/ip", json!({ "ip": ip })).await
    }

    pub async fn track_phone(&self, phone_number: &str) -> ApiResponse<Value> {
        self.post_json("/api/track/phone", json!({ "phoneNumber": phone_number }))
            .await
    }

    pub async fn phone_reputation(&self, phone_number: &str) -> ApiResponse<Value> {
        self.post_json("/api/phone/reputation", json!({ "phoneNumber": phone_number }))
            .await
    }

    pub async fn track_username(&self, username: &str) -> ApiResponse<Value> {
        self.post_json("/api/track/username", json!({ "username": username }))
            .await
    }

    pub async fn current_ip(&self) -> ApiResponse<CurrentIp> {
        self.execute(self.http.get(self.url("/api/my-ip"))).await
    }

    pub async fn initiate_file_send(
        &self,
        host: &str,
        port: u16,
        password: &str,
    ) -> ApiResponse<SessionCreated> {
        self.post_json(
            "/api/file/prepare-send",
            json!({ "host": host, "port": port, "password": password }),
        )
        .await
    }

    pub async fn upload_file(
        &self,
        session_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ApiResponse<Ack> {
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(filename.to_string()))
            .text("sessionId", session_id.to_string());
        self.execute(self.http.post(self.url("/api/file/upload")).multipart(form))
            .await
    }

    pub async fn prepare_file_receive(&self, port: u16, password: &str) -> ApiResponse<Ack> {
        self.post_json(
            "/api/file/prepare-receive",
            json!({ "port": port, "password": password }),
        )
        .await
    }

    pub async fn check_file_integrity(&self, filename: &str, bytes: Vec<u8>) -> ApiResponse<Value> {
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(filename.to_string()));
        self.execute(
            self.http
                .post(self.url("/api/file/check-integrity"))
                .multipart(form),
        )
        .await
    }
}

/// Surface a response through a notifier: one loading toast, then either
/// the success or the error toast. Returns the data on success.
pub fn report<T>(
    response: ApiResponse<T>,
    notifier: &dyn Notifier,
    messages: &Messages<'_>,
) -> Option<T> {
    notifier.loading(messages.loading);
    notifier.dismiss();
    match (response.error, response.data) {
        (Some(error), _) => {
            notifier.error(&format!("{}: {}", messages.error, error));
            None
        }
        (None, Some(data)) => {
            notifier.success(messages.success);
            Some(data)
        }
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::peer::{Notification, RecordingNotifier};

    #[test]
    fn report_shows_error_with_prefix() {
        let notifier = RecordingNotifier::new();
        let response: ApiResponse<Value> = ApiResponse::failure("HTTP error 500", 500);
        let data = report(
            response,
            &notifier,
            &Messages {
                error: "IP lookup failed",
                ..Messages::default()
            },
        );
        assert!(data.is_none());
        assert_eq!(notifier.errors(), vec!["IP lookup failed: HTTP error 500".to_string()]);
    }

    #[test]
    fn report_returns_data_on_success() {
        let notifier = RecordingNotifier::new();
        let response = ApiResponse {
            data: Some(CurrentIp {
                ip: "203.0.113.7".into(),
            }),
            error: None,
            status: 200,
        };
        let data = report(response, &notifier, &Messages::default()).unwrap();
        assert_eq!(data.ip, "203.0.113.7");
        assert_eq!(
            notifier.events().last(),
            Some(&Notification::Success("Operation successful".into()))
        );
    }

    #[tokio::test]
    async fn refused_connection_has_status_zero() {
        let client = BackendClient::new("http://127.0.0.1:1").unwrap();
        let response = client.track_ip("8.8.8.8").await;
        assert_eq!(response.status, 0);
        assert!(response.error.unwrap().starts_with("Cannot connect to the backend server"));
    }
}
