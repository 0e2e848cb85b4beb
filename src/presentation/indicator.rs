// File verdict banner.

use super::escape_html;
use crate::scoring::file_risk::{Rating, SecurityVerdict};

pub fn render_security_indicator(verdict: &SecurityVerdict, file_hash: Option<&str>) -> String {
    let color = escape_html(&verdict.color);
    let icon = match verdict.rating {
        Rating::Safe => "&#10004;",
        Rating::Suspicious | Rating::Malicious => "&#9888;",
    };

    let flagged = if verdict.stats.detections > 0 {
        format!(
            r#" <span class="muted">({}/{} security vendors flagged this file)</span>"#,
            verdict.stats.detections, verdict.stats.total_vendors
        )
    } else {
        String::new()
    };

    let mut detections = String::new();
    if !verdict.detection_details.is_empty() {
        detections.push_str(
            "<div class=\"detections\"><div class=\"label\">Security Vendor Detections:</div><table><tbody>\n",
        );
        for detail in &verdict.detection_details {
            detections.push_str(&format!(
                "<tr><td class=\"key\">{}</td><td>{}</td></tr>\n",
                escape_html(&detail.vendor_name),
                escape_html(&detail.detection)
            ));
        }
        detections.push_str("</tbody></table></div>");
    }

    let hash = file_hash
        .map(|h| {
            format!(
                r#"<p class="hash">SHA-256: <code>{}</code></p>"#,
                escape_html(h)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="alert verdict" style="border-left: 4px solid {color}">
  <h3 style="color: {color}">{icon} {title}{flagged}</h3>
  <p>{message}</p>
  {detections}
  {hash}
</div>"#,
        color = color,
        icon = icon,
        title = verdict.rating.title(),
        flagged = flagged,
        message = escape_html(&verdict.message),
        detections = detections,
        hash = hash,
    )
}
