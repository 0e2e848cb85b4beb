#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use cyberlink_api::api::AppState;
use cyberlink_api::build_router;
use cyberlink_api::config::{Config, ProviderUrls};

/// Nothing listens on port 1, so any provider call fails fast.
pub const DEAD_URL: &str = "http://127.0.0.1:1";

/// Config whose providers are all unreachable and unkeyed.
pub fn offline_config() -> Config {
    Config {
        providers: ProviderUrls {
            ipwho_base_url: DEAD_URL.to_string(),
            ipapi_base_url: DEAD_URL.to_string(),
            ipify_base_url: DEAD_URL.to_string(),
            ipinfo_base_url: DEAD_URL.to_string(),
            abuseipdb_base_url: DEAD_URL.to_string(),
            numverify_base_url: DEAD_URL.to_string(),
        },
        ..Config::default()
    }
}

pub fn app(config: Config) -> Router {
    let state = AppState::new(config).expect("http client");
    build_router(state)
}

/// Serve a router on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

pub async fn spawn_app(config: Config) -> SocketAddr {
    serve(app(config)).await
}
