mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    response::Response,
    routing::get,
};
use cyberlink_api::config::ProviderUrls;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{app, offline_config, serve};

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_missing_keys_as_degraded() {
    let response = app(offline_config()).oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["abuseipdb"], false);
    assert_eq!(body["services"]["numverify"], false);
}

#[tokio::test]
async fn unknown_route_renders_not_found_page() {
    let response = app(offline_config())
        .oneshot(get_request("/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));
}

#[tokio::test]
async fn blank_ip_is_rejected_before_any_lookup() {
    let response = app(offline_config())
        .oneshot(post_json("/api/track/ip", json!({ "ip": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["error"], "Please enter an IP address");
}

#[tokio::test]
async fn overlong_ip_names_the_length_rule() {
    let response = app(offline_config())
        .oneshot(post_json("/api/track/ip", json!({ "ip": "1".repeat(60) })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["error"], "IP address must be at most 45 characters");
    assert_eq!(body["details"], "ip");
}

#[tokio::test]
async fn malformed_ip_hits_each_provider_once() {
    let primary_hits = Arc::new(AtomicUsize::new(0));
    let fallback_hits = Arc::new(AtomicUsize::new(0));

    let primary = primary_hits.clone();
    let fallback = fallback_hits.clone();
    let mock = Router::new()
        .route(
            "/ipwho/{ip}",
            get(move |Path(_ip): Path<String>| {
                let hits = primary.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "success": false, "message": "Invalid IP address" }))
                }
            }),
        )
        .route(
            "/ipapi/{ip}/json/",
            get(move |Path(_ip): Path<String>| {
                let hits = fallback.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "error": true, "reason": "Invalid IP Address" }))
                }
            }),
        );
    let addr = serve(mock).await;

    let mut config = offline_config();
    config.providers = ProviderUrls {
        ipwho_base_url: format!("http://{}/ipwho", addr),
        ipapi_base_url: format!("http://{}/ipapi", addr),
        ..config.providers
    };

    let response = app(config)
        .oneshot(post_json("/api/track/ip", json!({ "ip": "999.1.1.1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["code"], "PROVIDER_FAILED");
    assert!(body["error"].as_str().unwrap().contains("Invalid IP address"));
    assert_eq!(primary_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
}

/// Mount a working ipapi.co stand-in under `/ipapi` and count its hits.
fn fallback_routes(router: Router, hits: Arc<AtomicUsize>) -> Router {
    router.route(
        "/ipapi/{ip}/json/",
        get(move |Path(ip): Path<String>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "ip": ip,
                    "country_name": "Australia",
                    "city": "Sydney",
                    "org": "CLOUDFLARENET",
                }))
            }
        }),
    )
}

async fn lookup_with(primary_base: String, mock: Router) -> Value {
    let addr = serve(mock).await;
    let mut config = offline_config();
    config.providers = ProviderUrls {
        ipwho_base_url: primary_base.replace("{addr}", &addr.to_string()),
        ipapi_base_url: format!("http://{}/ipapi", addr),
        ..config.providers
    };

    let response = app(config)
        .oneshot(post_json("/api/track/ip", json!({ "ip": "1.1.1.1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn primary_server_error_falls_back_once() {
    let fallback_hits = Arc::new(AtomicUsize::new(0));
    let mock = fallback_routes(
        Router::new().route(
            "/ipwho/{ip}",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        ),
        fallback_hits.clone(),
    );

    let body = lookup_with("http://{addr}/ipwho".to_string(), mock).await;
    assert_eq!(body["source"], "ipapi.co");
    assert_eq!(body["data"]["Country"], "Australia");
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn primary_non_json_body_falls_back_once() {
    let fallback_hits = Arc::new(AtomicUsize::new(0));
    let mock = fallback_routes(
        Router::new().route("/ipwho/{ip}", get(|| async { "<html>rate limited</html>" })),
        fallback_hits.clone(),
    );

    let body = lookup_with("http://{addr}/ipwho".to_string(), mock).await;
    assert_eq!(body["source"], "ipapi.co");
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_primary_falls_back_once() {
    let fallback_hits = Arc::new(AtomicUsize::new(0));
    let mock = fallback_routes(Router::new(), fallback_hits.clone());

    let body = lookup_with(common::DEAD_URL.to_string(), mock).await;
    assert_eq!(body["source"], "ipapi.co");
    assert_eq!(body["data"]["City"], "Sydney");
    assert_eq!(fallback_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn threat_profile_is_simulated_without_key() {
    let response = app(offline_config())
        .oneshot(post_json("/api/threat/ip", json!({ "ip": "8.8.8.8" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let score = body["abuseConfidenceScore"].as_u64().unwrap();
    assert!(score <= 100);
}

#[tokio::test]
async fn phone_without_key_uses_heuristic_report() {
    let response = app(offline_config())
        .oneshot(post_json(
            "/api/track/phone",
            json!({ "phoneNumber": "+14155552671" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "heuristic");
    assert_eq!(body["data"]["Source"], cyberlink_api::scoring::phone::FALLBACK_SOURCE);
    assert_eq!(body["data"]["Country"], "United States/Canada");
    assert_eq!(body["data"]["Country Prefix"], "+1");
    assert!(!body["data"]["Carrier"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn phone_with_unknown_country_code_is_rejected() {
    let response = app(offline_config())
        .oneshot(post_json("/api/phone/reputation", json!({ "phoneNumber": "+0001234" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn username_search_returns_summary_fields() {
    let response = app(offline_config())
        .oneshot(post_json("/api/track/username", json!({ "username": "johndoe42" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["Username"], "johndoe42");
    assert!(body["data"]["Profiles Found"].is_number());
}

#[tokio::test]
async fn invalid_username_is_bad_request() {
    let response = app(offline_config())
        .oneshot(post_json("/api/track/username", json!({ "username": "a!" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn username_page_renders_results() {
    let response = app(offline_config())
        .oneshot(get_request("/username-tracker?username=johndoe42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Username Tracker"));
    assert!(page.contains("johndoe42"));
}

#[tokio::test]
async fn upload_for_unknown_session_is_not_found() {
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"sessionId\"\r\n\r\n{id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary,
        id = uuid::Uuid::new_v4(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/file/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app(offline_config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn upload_echoes_the_prepared_receiver_address() {
    let router = app(offline_config());

    let created = router
        .clone()
        .oneshot(post_json(
            "/api/file/prepare-send",
            json!({ "host": "192.168.1.20", "port": 8765, "password": "s3cret" }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let session_id = body_json(created).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"sessionId\"\r\n\r\n{id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary,
        id = session_id,
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/file/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["delivered"], false);
    assert_eq!(body["host"], "192.168.1.20");
    assert_eq!(body["port"], 8765);
}
