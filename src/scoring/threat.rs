use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::Severity;

/// Scores above this get synthetic dark-web mentions.
const DARK_WEB_SCORE_THRESHOLD: u8 = 50;

/// Maximum number of distinct attack types reported.
pub const MAX_ATTACK_TYPES: usize = 5;

const USAGE_TYPES: [&str; 5] = ["Residential", "Data Center", "Business", "Hosting", "Mobile"];

const SIMULATED_ATTACK_TYPES: [&str; 5] = [
    "SQL Injection",
    "Brute Force",
    "DDoS",
    "Spam",
    "Port Scanning",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatProfile {
    /// Always within 0..=100
    pub abuse_confidence_score: u8,
    pub total_reports: u32,
    pub last_reported_at: DateTime<Utc>,
    pub is_whitelisted: bool,
    pub dark_web_mentions: u32,
    pub usage_type: String,
    pub recent_attack_types: Vec<String>,
    pub last_dark_web_mention: Option<DateTime<Utc>>,
    /// "abuseipdb" or "simulated"
    pub source: String,
}

impl ThreatProfile {
    pub fn level(&self) -> &'static str {
        threat_level_text(self.abuse_confidence_score)
    }

    pub fn severity(&self) -> Severity {
        severity_for_score(self.abuse_confidence_score)
    }
}

/// AbuseIPDB report category names.
pub fn attack_category_name(category: u32) -> String {
    let name = match category {
        1 => "DNS Compromise",
        2 => "DNS Poisoning",
        3 => "Fraud Orders",
        4 => "DDoS Attack",
        5 => "FTP Brute-Force",
        6 => "Ping of Death",
        7 => "Phishing",
        8 => "Fraud VoIP",
        9 => "Open Proxy",
        10 => "Web Spam",
        11 => "Email Spam",
        12 => "Blog Spam",
        13 => "VPN IP",
        14 => "Port Scan",
        15 => "Hacking",
        16 => "SQL Injection",
        17 => "Spoofing",
        18 => "Brute-Force",
        19 => "Bad Web Bot",
        20 => "Exploited Host",
        21 => "Web App Attack",
        22 => "SSH",
        23 => "IoT Targeted",
        other => return format!("Type {}", other),
    };
    name.to_string()
}

/// Distinct category names in first-seen order, capped at [`MAX_ATTACK_TYPES`].
pub fn attack_types_from_categories<I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = u32>,
{
    let mut seen = Vec::new();
    for category in categories {
        if !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen.into_iter()
        .map(attack_category_name)
        .take(MAX_ATTACK_TYPES)
        .collect()
}

pub fn threat_level_text(score: u8) -> &'static str {
    match score {
        0..=9 => "Clean",
        10..=24 => "Low Risk",
        25..=49 => "Medium Risk",
        50..=74 => "High Risk",
        _ => "Critical Risk",
    }
}

pub fn severity_for_score(score: u8) -> Severity {
    match score {
        0..=24 => Severity::Green,
        25..=49 => Severity::Yellow,
        50..=74 => Severity::Orange,
        _ => Severity::Red,
    }
}

/// Synthesize the dark-web fields for a real reputation score.
pub fn dark_web_for_score<R: Rng + ?Sized>(
    score: u8,
    rng: &mut R,
    now: DateTime<Utc>,
) -> (u32, Option<DateTime<Utc>>) {
    if score > DARK_WEB_SCORE_THRESHOLD {
        let mentions = rng.gen_range(1..=10);
        let days_ago = rng.gen_range(0..90);
        (mentions, Some(now - Duration::days(days_ago)))
    } else {
        (0, None)
    }
}

/// Fully synthetic profile, used when the reputation API is unreachable or
/// not configured.
pub fn simulated_profile<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> ThreatProfile {
    let abuse_confidence_score = rng.gen_range(0..=100u8);
    let total_reports = rng.gen_range(0..200);
    let last_reported_at = now - Duration::days(rng.gen_range(0..30));
    let is_whitelisted = rng.gen_bool(0.2);
    let dark_web_mentions = rng.gen_range(0..10);
    let usage_type = USAGE_TYPES
        .choose(rng)
        .copied()
        .unwrap_or("Residential")
        .to_string();
    let recent_attack_types = SIMULATED_ATTACK_TYPES
        .iter()
        .filter(|_| rng.gen_bool(0.5))
        .map(|s| s.to_string())
        .collect();
    let last_dark_web_mention = if rng.gen_bool(0.3) {
        Some(now - Duration::days(rng.gen_range(0..90)))
    } else {
        None
    };

    ThreatProfile {
        abuse_confidence_score,
        total_reports,
        last_reported_at,
        is_whitelisted,
        dark_web_mentions,
        usage_type,
        recent_attack_types,
        last_dark_web_mention,
        source: "simulated".to_string(),
    }
}
