mod common;

use std::time::Duration;

use axum::{Json, Router, routing::post};
use cyberlink_api::client::{BackendClient, Messages, TIMEOUT_MESSAGE, report};
use cyberlink_api::transport::peer::{Notification, RecordingNotifier};
use serde_json::json;

use common::{offline_config, serve, spawn_app};

#[tokio::test]
async fn slow_backend_yields_timeout_message() {
    let slow = Router::new().route(
        "/api/track/username",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "data": {} }))
        }),
    );
    let addr = serve(slow).await;
    let client =
        BackendClient::with_timeout(&format!("http://{}", addr), Duration::from_millis(200))
            .unwrap();

    let response = client.track_username("johndoe42").await;
    assert_eq!(response.error.as_deref(), Some(TIMEOUT_MESSAGE));
    assert_eq!(response.status, 0);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn api_errors_surface_the_server_message() {
    let addr = spawn_app(offline_config()).await;
    let client = BackendClient::new(&format!("http://{}", addr)).unwrap();

    let response = client.track_ip("").await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error.as_deref(), Some("Please enter an IP address"));

    let notifier = RecordingNotifier::new();
    let messages = Messages {
        loading: "Tracking IP address...",
        success: "IP address tracked successfully",
        error: "Failed to track IP",
    };
    assert!(report(response, &notifier, &messages).is_none());
    assert_eq!(
        notifier.errors(),
        vec!["Failed to track IP: Please enter an IP address".to_string()]
    );
    assert!(!notifier
        .events()
        .iter()
        .any(|n| matches!(n, Notification::Success(_))));
}

#[tokio::test]
async fn high_risk_executable_is_flagged() {
    let addr = spawn_app(offline_config()).await;
    let client = BackendClient::new(&format!("http://{}", addr)).unwrap();

    let response = client
        .check_file_integrity("payload.exe", vec![0x4d; 20 * 1024])
        .await;
    let body = response.data.expect("integrity report");
    let stats = &body["report"]["data"]["attributes"]["stats"];
    let hits = stats["malicious"].as_u64().unwrap() + stats["suspicious"].as_u64().unwrap();
    assert!(hits > 0);
    assert_eq!(body["properties"]["riskLevel"], "high");
    assert_ne!(body["verdict"]["rating"], "safe");
}

#[tokio::test]
async fn plain_text_is_clean() {
    let addr = spawn_app(offline_config()).await;
    let client = BackendClient::new(&format!("http://{}", addr)).unwrap();

    let response = client
        .check_file_integrity("notes.txt", b"meeting at noon".to_vec())
        .await;
    let body = response.data.expect("integrity report");
    let stats = &body["report"]["data"]["attributes"]["stats"];
    assert_eq!(stats["malicious"], 0);
    assert_eq!(stats["suspicious"], 0);
    assert_eq!(body["verdict"]["rating"], "safe");
}
