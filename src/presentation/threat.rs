// Threat intelligence card shown under an IP lookup.

use chrono::{DateTime, Utc};

use super::escape_html;
use crate::lookup::Coordinates;
use crate::scoring::threat::ThreatProfile;

/// Mentions above this count are highlighted red instead of yellow.
const HEAVY_MENTIONS: u32 = 5;

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn render_threat_card(profile: &ThreatProfile, coordinates: Option<&Coordinates>) -> String {
    let color = profile.severity().hex();
    let score = profile.abuse_confidence_score;

    let reports = if profile.is_whitelisted {
        "Whitelisted IP".to_string()
    } else {
        format!(
            r#"{} reports <span class="muted">Last reported: {}</span>"#,
            profile.total_reports,
            format_date(&profile.last_reported_at)
        )
    };

    let attacks = if profile.recent_attack_types.is_empty() {
        String::new()
    } else {
        let badges: String = profile
            .recent_attack_types
            .iter()
            .map(|t| format!(r#"<span class="pill">{}</span>"#, escape_html(t)))
            .collect();
        format!(r#"<p>Recent Attack Types:</p><div class="pills">{}</div>"#, badges)
    };

    let dark_web = if profile.dark_web_mentions > 0 {
        let tone = if profile.dark_web_mentions > HEAVY_MENTIONS {
            "#dc2626"
        } else {
            "#f59e0b"
        };
        let last = profile
            .last_dark_web_mention
            .as_ref()
            .map(|d| format!(r#" <span class="muted">Last mention: {}</span>"#, format_date(d)))
            .unwrap_or_default();
        format!(
            r#"<p style="color: {}">{} mentions found on dark web forums{}</p>
    <p class="muted">This IP address has been mentioned in dark web forums and marketplaces, potentially indicating involvement in malicious activities.</p>"#,
            tone, profile.dark_web_mentions, last
        )
    } else {
        "<p>No mentions found on dark web forums</p>".to_string()
    };

    let map_link = coordinates
        .map(|c| {
            format!(
                r#"<p><a href="{}" target="_blank" rel="noopener noreferrer">View on map</a></p>"#,
                escape_html(&c.maps_url())
            )
        })
        .unwrap_or_default();

    format!(
        r#"<section class="card threat">
  <h2>Threat Intelligence</h2>
  <p class="muted">Security analysis and threat assessment for this IP address</p>
  <h3>Threat Assessment <span class="badge" style="background: {color}">{level}</span></h3>
  <progress value="{score}" max="100"></progress>
  <p class="muted">Confidence Score: {score}/100</p>
  <p>{reports}</p>
  <h3>Network Classification</h3>
  <p>Usage Type: <strong>{usage}</strong></p>
  {attacks}
  <h3>Dark Web Intelligence</h3>
  <div class="inset">
    {dark_web}
  </div>
  {map_link}
  <p class="muted small">Threat intelligence data is provided by AbuseIPDB when configured. Dark web data is simulated for demonstration purposes.</p>
</section>"#,
        color = color,
        level = profile.level(),
        score = score,
        reports = reports,
        usage = escape_html(&profile.usage_type),
        attacks = attacks,
        dark_web = dark_web,
        map_link = map_link,
    )
}
