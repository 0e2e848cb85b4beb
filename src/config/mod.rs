// Configuration module

use serde::Deserialize;

/// Default per-request timeout for outbound provider calls and the backend client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default cap on uploaded/transferred file size (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = crate::transport::protocol::MAX_TRANSFER_BYTES as usize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Comma-separated list of allowed CORS origins
    pub frontend_url: String,
    pub environment: Environment,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub abuseipdb_api_key: Option<String>,
    #[serde(default)]
    pub numverify_api_key: Option<String>,
    #[serde(flatten)]
    pub providers: ProviderUrls,
}

/// Base URLs of the third-party providers. Overridable so tests can point
/// the adapters at local mock servers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProviderUrls {
    pub ipwho_base_url: String,
    pub ipapi_base_url: String,
    pub ipify_base_url: String,
    pub ipinfo_base_url: String,
    pub abuseipdb_base_url: String,
    pub numverify_base_url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// How log lines are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Config::default();
        let p = &defaults.providers;

        let config = config::Config::builder()
            .set_default("server_host", defaults.server_host.clone())?
            .set_default("server_port", defaults.server_port as i64)?
            .set_default("frontend_url", defaults.frontend_url.clone())?
            .set_default("environment", "development")?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("ipwho_base_url", p.ipwho_base_url.clone())?
            .set_default("ipapi_base_url", p.ipapi_base_url.clone())?
            .set_default("ipify_base_url", p.ipify_base_url.clone())?
            .set_default("ipinfo_base_url", p.ipinfo_base_url.clone())?
            .set_default("abuseipdb_base_url", p.abuseipdb_base_url.clone())?
            .set_default("numverify_base_url", p.numverify_base_url.clone())?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        // An empty key in .env means "not configured"
        config.abuseipdb_api_key = config.abuseipdb_api_key.filter(|k| !k.trim().is_empty());
        config.numverify_api_key = config.numverify_api_key.filter(|k| !k.trim().is_empty());
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn log_format(&self) -> LogFormat {
        if self.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

impl Default for ProviderUrls {
    fn default() -> Self {
        Self {
            ipwho_base_url: "https://ipwho.is".to_string(),
            ipapi_base_url: "https://ipapi.co".to_string(),
            ipify_base_url: "https://api.ipify.org".to_string(),
            ipinfo_base_url: "https://ipinfo.io".to_string(),
            abuseipdb_base_url: "https://api.abuseipdb.com".to_string(),
            numverify_base_url: "https://apilayer.net".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            frontend_url: "http://localhost:8080".to_string(),
            environment: Environment::Development,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            abuseipdb_api_key: None,
            numverify_api_key: None,
            providers: ProviderUrls::default(),
        }
    }
}
