use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::Utc;
use serde::Deserialize;

use super::layout;
use crate::api::AppState;
use crate::presentation::{escape_html, render_alert, render_result_table, render_threat_card};
use crate::scoring::username;

#[derive(Debug, Default, Deserialize)]
pub struct IpQuery {
    pub ip: Option<String>,
    /// Any value triggers a lookup of this host's public IP
    pub mine: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhoneQuery {
    pub number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

fn search_form(action: &str, name: &str, label: &str, placeholder: &str, value: &str) -> String {
    format!(
        r#"<form class="card" method="get" action="{action}">
  <label for="{name}">{label}</label>
  <input id="{name}" name="{name}" placeholder="{placeholder}" value="{value}"/>
  <button type="submit">Search</button>
</form>"#,
        action = action,
        name = name,
        label = label,
        placeholder = placeholder,
        value = escape_html(value),
    )
}

/// Non-empty, trimmed query input
fn input(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn ip_tracker(State(state): State<AppState>, Query(query): Query<IpQuery>) -> Html<String> {
    let mut body = String::from(
        r#"<h1>IP Address Tracker</h1>
<p class="muted">Discover the geolocation, ISP and network details of any IP address.</p>"#,
    );

    let mut target = input(&query.ip).map(str::to_string);
    if target.is_none() && query.mine.is_some() {
        match state.geo.current_ip().await {
            Ok(ip) => target = Some(ip),
            Err(e) => body.push_str(&render_alert("Could not detect your IP", &e.to_string())),
        }
    }

    body.push_str(&search_form(
        "/ip-tracker",
        "ip",
        "IP address",
        "8.8.8.8",
        target.as_deref().unwrap_or_default(),
    ));
    body.push_str(r#"<p class="small"><a href="/ip-tracker?mine=1">Use my IP</a></p>"#);

    if let Some(ip) = target {
        let (location, threat) = tokio::join!(state.geo.lookup(&ip), state.threat.check(&ip));
        match location {
            Ok(result) => {
                body.push_str(&render_result_table("IP Information", &result.data));
                body.push_str(&render_threat_card(&threat, result.coordinates.as_ref()));
            }
            Err(e) => body.push_str(&render_alert("Failed to trace IP", &e.to_string())),
        }
    }

    layout("IP Tracker", "/ip-tracker", &body)
}

pub async fn phone_tracker(
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Html<String> {
    let number = input(&query.number);
    let mut body = String::from(
        r#"<h1>Phone Number Tracker</h1>
<p class="muted">Identify the country, carrier and line type of a phone number. Include the country code.</p>"#,
    );
    body.push_str(&search_form(
        "/phone-tracker",
        "number",
        "Phone number",
        "+1 415 555 2671",
        number.unwrap_or_default(),
    ));

    if let Some(number) = number {
        match state.phone.validate(number).await {
            Ok(result) => {
                body.push_str(&render_result_table("Phone Information", &result.data));
            }
            Err(e) => body.push_str(&render_alert("Phone analysis failed", &e.to_string())),
        }
    }

    layout("Phone Tracker", "/phone-tracker", &body)
}

pub async fn username_tracker(Query(query): Query<UsernameQuery>) -> Html<String> {
    let name = input(&query.username);
    let mut body = String::from(
        r#"<h1>Username Tracker</h1>
<p class="muted">Find social profiles that may be associated with a username. Results are an estimate; no platform is contacted.</p>"#,
    );
    body.push_str(&search_form(
        "/username-tracker",
        "username",
        "Username",
        "johndoe42",
        name.unwrap_or_default(),
    ));

    if let Some(name) = name {
        match username::search(name, Utc::now()) {
            Ok(data) => body.push_str(&render_result_table("Username Results", &data)),
            Err(message) => body.push_str(&render_alert("Invalid username", message)),
        }
    }

    layout("Username Tracker", "/username-tracker", &body)
}
