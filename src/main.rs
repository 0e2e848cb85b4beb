use anyhow::Result;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cyberlink_api::{
    api::AppState,
    build_router,
    config::{Config, LogFormat},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables; the log format depends on them
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize tracing
    let (json, pretty) = match config.log_format() {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "cyberlink_api=info,tower_http=info".into()),
        ))
        .with(json)
        .with(pretty)
        .init();

    tracing::info!(
        "Loaded configuration ({:?}, request timeout {}s)",
        config.environment,
        config.request_timeout_secs
    );
    tracing::info!("CORS configured for origins: {}", config.frontend_url);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    let app_state = AppState::new(config)?;
    let app = build_router(app_state);

    tracing::info!("Starting server on {}", addr);

    // Graceful shutdown handling
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
