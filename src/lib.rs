//! CyberLink backend: OSINT lookups, heuristic scorers, a password-paired
//! file relay and the server-rendered pages that present them.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::get,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod client;
pub mod config;
pub mod lookup;
pub mod middleware;
pub mod pages;
pub mod presentation;
pub mod scoring;
pub mod transport;
pub mod utils;

use api::AppState;

/// Multipart framing on top of the file itself
const BODY_SLACK_BYTES: usize = 1024 * 1024;

/// Allowed origins from the comma-separated `FRONTEND_URL`.
pub fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origins: Vec<header::HeaderValue> = frontend_url
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        // Cache preflight requests for 1 hour
        .max_age(std::time::Duration::from_secs(3600))
}

/// Full application router: health, REST API, relay sockets and pages.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(BODY_SLACK_BYTES);
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ping", get(api::health::ping))
        // REST API
        .nest("/api", api::routes::api_routes())
        // File relay
        .merge(api::routes::relay_routes())
        // Pages
        .merge(pages::page_routes())
        .fallback(pages::not_found)
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
