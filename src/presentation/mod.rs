// ============================================
// Presentation
// ============================================
//
// HTML fragments for lookup results, the file verdict and the threat card.
// Every value coming from a provider or a user goes through `escape_html`.

pub mod indicator;
pub mod table;
pub mod threat;

pub use indicator::render_security_indicator;
pub use table::{copy_text, render_result_table};
pub use threat::render_threat_card;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Alert box used for validation and provider errors.
pub fn render_alert(title: &str, message: &str) -> String {
    format!(
        r#"<div class="alert alert-error" role="alert"><strong>{}</strong><p>{}</p></div>"#,
        escape_html(title),
        escape_html(message).replace('\n', "<br/>")
    )
}
