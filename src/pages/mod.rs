// ============================================
// Server-rendered pages
// ============================================
//
// One HTML page per tool, sharing the layout below. Lookup pages take their
// input from the query string so results are linkable.

use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};

use crate::api::AppState;
use crate::presentation::escape_html;

pub mod files;
pub mod lookup;

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/ip-tracker", "IP Tracker"),
    ("/phone-tracker", "Phone Tracker"),
    ("/username-tracker", "Username Tracker"),
    ("/file-sharing", "File Sharing"),
    ("/file-security", "File Security"),
];

const FEATURES: &[(&str, &str, &str)] = &[
    (
        "/ip-tracker",
        "IP Address Tracker",
        "Track the geolocation and network details of any IP address.",
    ),
    (
        "/phone-tracker",
        "Phone Number Tracker",
        "Verify and analyze phone numbers from around the world.",
    ),
    (
        "/username-tracker",
        "Username Tracker",
        "Find social profiles associated with a username.",
    ),
    (
        "/file-sharing",
        "File Sharing",
        "Send files to a receiver that knows the shared password.",
    ),
    (
        "/file-security",
        "File Security Scanner",
        "Check files for potential security threats and malware.",
    ),
];

const STYLE: &str = r#"
    :root {
      --bg: #0b1220;
      --card: #131d33;
      --line: #263551;
      --text: #e5ecff;
      --muted: #9eb0d6;
      --accent: #5cc8ff;
      --error: #dc2626;
    }
    * { box-sizing: border-box; }
    body { margin: 0; font-family: Inter, Segoe UI, Roboto, sans-serif; background: var(--bg); color: var(--text); }
    header, footer { border-bottom: 1px solid var(--line); }
    footer { border-top: 1px solid var(--line); border-bottom: none; color: var(--muted); font-size: .85rem; }
    .container { max-width: 1100px; margin: 0 auto; padding: 20px 24px; }
    .brand { font-weight: 700; font-size: 1.3rem; color: var(--text); text-decoration: none; }
    nav { display: flex; flex-wrap: wrap; gap: 8px; margin-top: 12px; }
    nav a { color: var(--muted); text-decoration: none; padding: 6px 12px; border-radius: 999px; border: 1px solid transparent; }
    nav a.active { color: var(--text); border-color: var(--line); background: #0f1729; }
    .card { background: var(--card); border: 1px solid var(--line); border-radius: 14px; padding: 16px; margin-top: 16px; }
    .grid { display: grid; gap: 16px; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); }
    table { width: 100%; border-collapse: collapse; font-size: .9rem; }
    td { padding: 8px 10px; border-bottom: 1px solid var(--line); word-break: break-word; }
    td.key { color: var(--muted); width: 35%; }
    a { color: var(--accent); }
    label { display: block; margin: 10px 0 6px; color: var(--muted); font-size: .9rem; }
    input, button, textarea { width: 100%; border-radius: 10px; border: 1px solid var(--line); background: #0d1629; color: var(--text); padding: 10px 12px; }
    button { background: linear-gradient(90deg, #1b7cff, #2ca0ff); border: none; font-weight: 600; cursor: pointer; margin-top: 12px; }
    .muted { color: var(--muted); }
    .small { font-size: .8rem; }
    .alert { border-radius: 10px; padding: 12px 16px; margin-top: 16px; background: #1a1424; }
    .alert-error { border-left: 4px solid var(--error); }
    .badge, .pill { border-radius: 999px; padding: 2px 9px; font-size: .8rem; }
    .pill { border: 1px solid var(--line); margin-right: 6px; }
    .inset { background: #0f1729; border-radius: 10px; padding: 10px 14px; }
    progress { width: 100%; }
"#;

/// Wrap page content in the shared header, nav and footer.
pub fn layout(title: &str, active: &str, body: &str) -> Html<String> {
    let nav: String = NAV
        .iter()
        .map(|(path, label)| {
            let class = if *path == active { " class=\"active\"" } else { "" };
            format!(r#"<a href="{}"{}>{}</a>"#, path, class, label)
        })
        .collect();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>{title} | CyberLink</title>
  <style>{style}</style>
</head>
<body>
<header><div class="container">
  <a class="brand" href="/">CyberLink</a>
  <nav>{nav}</nav>
</div></header>
<main class="container">
{body}
</main>
<footer><div class="container">CyberLink OSINT toolkit. Lookups use public providers; some results are simulated and labelled as such.</div></footer>
</body>
</html>"#,
        title = escape_html(title),
        style = STYLE,
        nav = nav,
        body = body,
    ))
}

pub async fn index() -> Html<String> {
    let cards: String = FEATURES
        .iter()
        .map(|(path, title, description)| {
            format!(
                r#"<a class="card" href="{}"><h3>{}</h3><p class="muted">{}</p></a>"#,
                path, title, description
            )
        })
        .collect();
    let body = format!(
        r#"<h1>Cybersecurity Suite</h1>
<p class="muted">A set of OSINT tools for investigating IP addresses, phone numbers and usernames, plus file transfer and file risk checks.</p>
<div class="grid">{}</div>"#,
        cards
    );
    layout("Home", "/", &body)
}

pub async fn not_found() -> impl IntoResponse {
    let body = r#"<h1>Page Not Found</h1>
<p class="muted">The page you are looking for doesn't exist or has been moved.</p>
<p><a href="/">Return to Home</a></p>"#;
    (StatusCode::NOT_FOUND, layout("Not Found", "", body))
}

/// HTML routes. The 404 page is installed as the router fallback by the caller.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/ip-tracker", get(lookup::ip_tracker))
        .route("/phone-tracker", get(lookup::phone_tracker))
        .route("/username-tracker", get(lookup::username_tracker))
        .route(
            "/file-sharing",
            get(files::file_sharing).post(files::file_sharing_upload),
        )
        .route(
            "/file-security",
            get(files::file_security).post(files::file_security_check),
        )
}
