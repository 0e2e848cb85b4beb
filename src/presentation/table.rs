// Generic result table for any `FieldMap`.

use serde_json::Value;

use super::escape_html;
use crate::lookup::{FieldMap, display_value};

/// Values that render as links.
pub fn is_link(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with("http://") || s.starts_with("https://"))
}

/// `key: value` lines, the text offered for copying.
pub fn copy_text(data: &FieldMap) -> String {
    data.iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Titled card with one row per field. Empty maps render nothing.
pub fn render_result_table(title: &str, data: &FieldMap) -> String {
    if data.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for (key, value) in data.iter() {
        let shown = escape_html(&display_value(value));
        let cell = if is_link(value) {
            format!(
                r#"<a href="{0}" target="_blank" rel="noopener noreferrer">{0}</a>"#,
                shown
            )
        } else {
            shown
        };
        rows.push_str(&format!(
            "<tr><td class=\"key\">{}</td><td>{}</td></tr>\n",
            escape_html(key),
            cell
        ));
    }

    format!(
        r#"<section class="card result">
  <h2>{title}</h2>
  <table><tbody>
{rows}  </tbody></table>
  <details><summary>Copy results</summary><textarea readonly rows="6">{copy}</textarea></details>
</section>"#,
        title = escape_html(title),
        rows = rows,
        copy = escape_html(&copy_text(data)),
    )
}
