use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::lookup::{GeoLocator, PhoneValidator, ThreatIntel};
use crate::transport::TransferHub;

pub mod file;
pub mod health;
pub mod ip;
pub mod phone;
pub mod routes;
pub mod upload;
pub mod username;

// ============================================
// Application State
// ============================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub geo: GeoLocator,
    pub threat: ThreatIntel,
    pub phone: PhoneValidator,
    pub hub: TransferHub,
}

impl AppState {
    /// Build the adapters around one shared HTTP client. Every outbound call
    /// inherits the configured timeout.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("cyberlink-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let providers = &config.providers;
        let geo = GeoLocator::new(client.clone(), providers);
        let threat = ThreatIntel::new(
            client.clone(),
            &providers.abuseipdb_base_url,
            config.abuseipdb_api_key.clone(),
        );
        let phone = PhoneValidator::new(
            client,
            &providers.numverify_base_url,
            config.numverify_api_key.clone(),
        );
        let hub = TransferHub::new(config.max_upload_bytes as u64);

        if !threat.is_configured() {
            tracing::warn!("ABUSEIPDB_API_KEY not set - threat profiles will be simulated");
        }
        if config.numverify_api_key.is_none() {
            tracing::warn!("NUMVERIFY_API_KEY not set - phone reports will use the heuristic");
        }

        Ok(Self {
            config: Arc::new(config),
            geo,
            threat,
            phone,
            hub,
        })
    }
}
