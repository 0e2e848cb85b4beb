// AbuseIPDB reputation lookup. Any failure (or a missing API key) degrades to
// a simulated profile rather than an error.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::LookupError;
use crate::scoring::threat::{
    ThreatProfile, attack_types_from_categories, dark_web_for_score, simulated_profile,
};

pub const SOURCE: &str = "abuseipdb";

/// Reports older than this are ignored by the provider.
const MAX_AGE_IN_DAYS: u32 = 90;

#[derive(Debug, Clone, Deserialize)]
pub struct AbuseEnvelope {
    pub data: AbuseData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseData {
    #[serde(default)]
    pub abuse_confidence_score: Option<u8>,
    #[serde(default)]
    pub total_reports: Option<u32>,
    #[serde(default)]
    pub last_reported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_whitelisted: Option<bool>,
    #[serde(default)]
    pub usage_type: Option<String>,
    #[serde(default)]
    pub reports: Vec<AbuseReport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<u32>,
}

#[derive(Clone)]
pub struct ThreatIntel {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ThreatIntel {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Reputation profile for an IP. Never fails: provider problems fall
    /// back to a simulated profile.
    pub async fn check(&self, ip: &str) -> ThreatProfile {
        let fetched = self.fetch(ip).await;
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        match fetched {
            Ok(data) => profile_from_abuse(data, &mut rng, now),
            Err(e) => {
                tracing::info!(ip = %ip, reason = %e, "Using simulated threat profile");
                simulated_profile(&mut rng, now)
            }
        }
    }

    async fn fetch(&self, ip: &str) -> Result<AbuseData, LookupError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LookupError::Unavailable(
                "AbuseIPDB API key not configured".to_string(),
            ));
        };
        tracing::debug!("AbuseIPDB API key present (len={})", api_key.len());

        let url = format!("{}/api/v2/check", self.base_url);
        let max_age = MAX_AGE_IN_DAYS.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("ipAddress", ip), ("maxAgeInDays", max_age.as_str())])
            .header("Accept", "application/json")
            .header("Key", api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let envelope: AbuseEnvelope = resp
            .json()
            .await
            .map_err(|e| LookupError::Parse(format!("invalid AbuseIPDB payload: {}", e)))?;
        Ok(envelope.data)
    }
}

/// Build a profile from a real AbuseIPDB answer, synthesizing only the
/// dark-web fields.
pub fn profile_from_abuse<R: rand::Rng + ?Sized>(
    data: AbuseData,
    rng: &mut R,
    now: DateTime<Utc>,
) -> ThreatProfile {
    let score = data.abuse_confidence_score.unwrap_or(0).min(100);
    let recent_attack_types = attack_types_from_categories(
        data.reports
            .iter()
            .flat_map(|r| r.categories.iter().copied()),
    );
    let last_reported_at = data
        .reports
        .first()
        .and_then(|r| r.reported_at)
        .or(data.last_reported_at)
        .unwrap_or(now);
    let (dark_web_mentions, last_dark_web_mention) = dark_web_for_score(score, rng, now);

    ThreatProfile {
        abuse_confidence_score: score,
        total_reports: data.total_reports.unwrap_or(0),
        last_reported_at,
        is_whitelisted: data.is_whitelisted.unwrap_or(false),
        dark_web_mentions,
        usage_type: data
            .usage_type
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        recent_attack_types,
        last_dark_web_mention,
        source: SOURCE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FIXTURE: &str = r#"{
        "data": {
            "ipAddress": "118.25.6.39",
            "isPublic": true,
            "abuseConfidenceScore": 100,
            "usageType": "Data Center/Web Hosting/Transit",
            "isWhitelisted": false,
            "totalReports": 1764,
            "lastReportedAt": "2024-03-01T10:00:00+00:00",
            "reports": [
                { "reportedAt": "2024-03-02T12:30:00+00:00", "categories": [18, 22] },
                { "reportedAt": "2024-02-28T08:00:00+00:00", "categories": [14, 18, 15] }
            ]
        }
    }"#;

    #[test]
    fn abuse_fixture_maps_to_profile() {
        let envelope: AbuseEnvelope = serde_json::from_str(FIXTURE).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let profile = profile_from_abuse(envelope.data, &mut rng, Utc::now());

        assert_eq!(profile.abuse_confidence_score, 100);
        assert_eq!(profile.total_reports, 1764);
        assert_eq!(profile.usage_type, "Data Center/Web Hosting/Transit");
        assert_eq!(
            profile.recent_attack_types,
            ["Brute-Force", "SSH", "Port Scan", "Hacking"]
        );
        assert_eq!(
            profile.last_reported_at.to_rfc3339(),
            "2024-03-02T12:30:00+00:00"
        );
        assert!(profile.dark_web_mentions >= 1);
        assert!(profile.last_dark_web_mention.is_some());
        assert_eq!(profile.source, SOURCE);
    }

    #[test]
    fn sparse_answer_uses_defaults() {
        let envelope: AbuseEnvelope =
            serde_json::from_str(r#"{"data":{"abuseConfidenceScore":0}}"#).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let profile = profile_from_abuse(envelope.data, &mut rng, Utc::now());
        assert_eq!(profile.usage_type, "Unknown");
        assert_eq!(profile.dark_web_mentions, 0);
        assert!(profile.last_dark_web_mention.is_none());
        assert!(profile.recent_attack_types.is_empty());
    }

    #[tokio::test]
    async fn missing_key_falls_back_to_simulation() {
        let intel = ThreatIntel::new(Client::new(), "http://127.0.0.1:9", None);
        assert!(!intel.is_configured());
        let profile = intel.check("8.8.8.8").await;
        assert_eq!(profile.source, "simulated");
        assert!(profile.abuse_confidence_score <= 100);
    }
}
