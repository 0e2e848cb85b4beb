use axum::{
    Router,
    routing::{get, post},
};

use super::AppState;
use super::{file, ip, phone, username};

/// REST routes, mounted under `/api`
///
/// ## IP
/// - POST /track/ip - Geolocate an IP (ipwho.is, falls back to ipapi.co once)
/// - POST /threat/ip - AbuseIPDB reputation profile (simulated without a key)
/// - POST /darkweb/ip - Dark-web mention fields of the threat profile
/// - GET  /my-ip - Public IP of this host
///
/// ## Phone
/// - POST /track/phone - NumVerify validation with heuristic fallback
/// - POST /phone/reputation - Deterministic spam-score guess
///
/// ## Username
/// - POST /track/username - Platform presence guess for a username
///
/// ## Files
/// - POST /file/prepare-send - Register a sender, returns a session id
/// - POST /file/upload - Multipart upload for a prepared session
/// - POST /file/prepare-receive - Check for uploads staged under a password
/// - POST /file/check-integrity - Simulated multi-vendor file scan
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ========================================
        // IP lookups
        // ========================================
        .route("/track/ip", post(ip::track_ip))
        .route("/threat/ip", post(ip::threat_ip))
        .route("/darkweb/ip", post(ip::dark_web_ip))
        .route("/my-ip", get(ip::my_ip))
        // ========================================
        // Phone
        // ========================================
        .route("/track/phone", post(phone::track_phone))
        .route("/phone/reputation", post(phone::phone_reputation))
        // ========================================
        // Username
        // ========================================
        .route("/track/username", post(username::track_username))
        // ========================================
        // File transfer and integrity
        // ========================================
        .route("/file/prepare-send", post(file::prepare_send))
        .route("/file/upload", post(file::upload_file))
        .route("/file/prepare-receive", post(file::prepare_receive))
        .route("/file/check-integrity", post(file::check_integrity))
}

/// WebSocket relay endpoints
///
/// - GET /send - Sender socket: metadata frame, then one binary frame
/// - GET /receive - Receiver socket: password frame, then wait for a file
pub fn relay_routes() -> Router<AppState> {
    Router::new()
        .route("/send", get(file::send_socket))
        .route("/receive", get(file::receive_socket))
}
