// IP geolocation: ipwho.is with ipapi.co as the single fallback hop,
// ipify/ipinfo for "what is my IP".

use reqwest::Client;
use serde_json::Value;

use super::{Coordinates, FieldMap, LookupError, LookupResult, is_present, yes_no};
use crate::config::ProviderUrls;

pub const PRIMARY_SOURCE: &str = "ipwho.is";
pub const FALLBACK_SOURCE: &str = "ipapi.co";

#[derive(Clone)]
pub struct GeoLocator {
    client: Client,
    ipwho_base_url: String,
    ipapi_base_url: String,
    ipify_base_url: String,
    ipinfo_base_url: String,
}

impl GeoLocator {
    pub fn new(client: Client, urls: &ProviderUrls) -> Self {
        Self {
            client,
            ipwho_base_url: trim_base(&urls.ipwho_base_url),
            ipapi_base_url: trim_base(&urls.ipapi_base_url),
            ipify_base_url: trim_base(&urls.ipify_base_url),
            ipinfo_base_url: trim_base(&urls.ipinfo_base_url),
        }
    }

    /// Look up an IP address. The primary provider is tried first; on any
    /// failure the fallback is tried exactly once.
    pub async fn lookup(&self, ip: &str) -> Result<LookupResult, LookupError> {
        let ip = ip.trim();
        if ip.is_empty() {
            return Err(LookupError::Validation(
                "Please enter an IP address".to_string(),
            ));
        }

        let primary = match self.lookup_primary(ip).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        tracing::warn!(ip = %ip, error = %primary, "Primary IP provider failed, trying fallback");

        self.lookup_fallback(ip)
            .await
            .map_err(|fallback| LookupError::Exhausted {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            })
    }

    async fn lookup_primary(&self, ip: &str) -> Result<LookupResult, LookupError> {
        let url = format!("{}/{}", self.ipwho_base_url, ip);
        let body = get_json(&self.client, &url).await?;
        parse_ipwho_response(&body, ip)
    }

    async fn lookup_fallback(&self, ip: &str) -> Result<LookupResult, LookupError> {
        let url = format!("{}/{}/json/", self.ipapi_base_url, ip);
        let body = get_json(&self.client, &url).await?;
        parse_ipapi_response(&body, ip)
    }

    /// Detect the caller-visible public IP of this host.
    pub async fn current_ip(&self) -> Result<String, LookupError> {
        let url = format!("{}?format=json", self.ipify_base_url);
        match get_json(&self.client, &url).await.and_then(extract_ip) {
            Ok(ip) => return Ok(ip),
            Err(e) => tracing::debug!(error = %e, "ipify failed, trying ipinfo"),
        }

        let url = format!("{}/json", self.ipinfo_base_url);
        get_json(&self.client, &url)
            .await
            .and_then(extract_ip)
            .map_err(|e| {
                tracing::warn!(error = %e, "Could not detect public IP");
                LookupError::Unavailable("Failed to fetch your IP address".to_string())
            })
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// GET a URL and decode the body as JSON. Non-2xx responses are failures.
pub(crate) async fn get_json(client: &Client, url: &str) -> Result<Value, LookupError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LookupError::Status(status.as_u16()));
    }
    resp.json::<Value>()
        .await
        .map_err(|e| LookupError::Parse(e.to_string()))
}

fn extract_ip(body: Value) -> Result<String, LookupError> {
    body.get("ip")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LookupError::Parse("response has no `ip` field".to_string()))
}

fn coordinates(body: &Value) -> Option<Coordinates> {
    let lat = body.get("latitude").filter(|v| is_present(v))?.as_f64()?;
    let lng = body.get("longitude").filter(|v| is_present(v))?.as_f64()?;
    Some(Coordinates { lat, lng })
}

/// Normalize an ipwho.is response.
#[doc(hidden)]
pub fn parse_ipwho_response(body: &Value, ip: &str) -> Result<LookupResult, LookupError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Invalid IP address");
        return Err(LookupError::Provider(reason.to_string()));
    }
    if !body.is_object() {
        return Err(LookupError::Parse("expected a JSON object".to_string()));
    }

    let mut data = FieldMap::new();
    data.insert(
        "IP Address",
        body.get("ip").cloned().unwrap_or_else(|| Value::from(ip)),
    );
    data.insert_present("Type", body.get("type"));
    data.insert_present("Continent", body.get("continent"));
    data.insert_present("Country", body.get("country"));
    data.insert_present("Country Code", body.get("country_code"));
    data.insert_present("Region", body.get("region"));
    data.insert_present("City", body.get("city"));
    data.insert_present("Postal Code", body.get("postal"));
    data.insert_present("Latitude", body.get("latitude"));
    data.insert_present("Longitude", body.get("longitude"));

    if let Some(tz) = body.get("timezone").filter(|v| v.is_object()) {
        let mut label = tz
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Some(abbr) = tz.get("abbr").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            label.push_str(&format!(" ({})", abbr));
        }
        data.insert("Timezone", label);
        data.insert_present("Timezone UTC", tz.get("utc"));
    }

    if let Some(conn) = body.get("connection").filter(|v| v.is_object()) {
        data.insert_present("ISP", conn.get("isp"));
        data.insert_present("Organization", conn.get("org"));
        data.insert_present("ASN", conn.get("asn"));
        data.insert_present("Domain", conn.get("domain"));
    }

    if let Some(currency) = body.get("currency").filter(|v| v.is_object()) {
        let name = currency.get("name").and_then(Value::as_str).filter(|s| !s.is_empty());
        let symbol = currency.get("symbol").and_then(Value::as_str).filter(|s| !s.is_empty());
        match (name, symbol) {
            (Some(n), Some(s)) => data.insert("Currency", format!("{} ({})", n, s)),
            (Some(n), None) => data.insert("Currency", n),
            (None, Some(s)) => data.insert("Currency", s),
            (None, None) => {}
        }
    }

    if let Some(security) = body.get("security").filter(|v| v.is_object()) {
        for (key, label) in [
            ("vpn", "VPN"),
            ("proxy", "Proxy"),
            ("tor", "Tor"),
            ("relay", "Relay"),
            ("hosting", "Hosting"),
        ] {
            if let Some(flag) = security.get(key).and_then(Value::as_bool) {
                data.insert(label, yes_no(flag));
            }
        }
    }

    Ok(LookupResult {
        data,
        coordinates: coordinates(body),
        source: PRIMARY_SOURCE.to_string(),
    })
}

/// Normalize an ipapi.co response.
#[doc(hidden)]
pub fn parse_ipapi_response(body: &Value, ip: &str) -> Result<LookupResult, LookupError> {
    if body.get("error").map(is_present).unwrap_or(false) {
        let reason = body
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("Invalid IP address");
        return Err(LookupError::Provider(reason.to_string()));
    }
    if !body.is_object() {
        return Err(LookupError::Parse("expected a JSON object".to_string()));
    }

    let mut data = FieldMap::new();
    data.insert(
        "IP Address",
        body.get("ip")
            .filter(|v| is_present(v))
            .cloned()
            .unwrap_or_else(|| Value::from(ip)),
    );
    data.insert_present("Country", body.get("country_name"));
    data.insert_present("Country Code", body.get("country_code"));
    data.insert_present("Region", body.get("region"));
    data.insert_present("City", body.get("city"));
    data.insert_present("Postal Code", body.get("postal"));
    data.insert_present("Latitude", body.get("latitude"));
    data.insert_present("Longitude", body.get("longitude"));
    data.insert_present("Timezone", body.get("timezone"));
    data.insert_present("ISP", body.get("org"));
    data.insert_present("ASN", body.get("asn"));
    data.insert_present("Currency", body.get("currency_name"));

    Ok(LookupResult {
        data,
        coordinates: coordinates(body),
        source: FALLBACK_SOURCE.to_string(),
    })
}
