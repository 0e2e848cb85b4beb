use axum::{
    extract::{Multipart, State},
    response::Html,
};

use super::layout;
use crate::api::AppState;
use crate::api::file::integrity_for;
use crate::api::upload::read_form;
use crate::lookup::FieldMap;
use crate::middleware::AppError;
use crate::presentation::{escape_html, render_alert, render_result_table, render_security_indicator};
use crate::transport::relay::UploadOutcome;

const SHARING_INTRO: &str = r#"<h1>File Sharing</h1>
<p class="muted">Send a file to a receiver that knows the same password. The receiver connects to <code>/receive</code> on this server and waits; the sender connects to <code>/send</code> or uploads below.</p>
<div class="alert"><strong>About encryption</strong><p>Files travel over the WebSocket as plain bytes, so use <code>wss://</code> when the relay is not on your own machine. Uploads that wait here for a receiver are kept in memory encrypted with AES-256-GCM under the transfer password and are discarded after 10 minutes.</p></div>"#;

fn sharing_form() -> &'static str {
    r#"<form class="card" method="post" action="/file-sharing" enctype="multipart/form-data">
  <h2>Send a file</h2>
  <label for="host">Receiver host</label>
  <input id="host" name="host" placeholder="192.168.1.20" required/>
  <label for="port">Receiver port</label>
  <input id="port" name="port" type="number" min="1" max="65535" value="8765" required/>
  <label for="password">Transfer password</label>
  <input id="password" name="password" type="password" required/>
  <label for="file">File</label>
  <input id="file" name="file" type="file" required/>
  <button type="submit">Send file</button>
</form>
<section class="card">
  <h2>Receive a file</h2>
  <p class="muted">Open a WebSocket to <code>ws://&lt;this host&gt;/receive</code> and send <code>{"password": "..."}</code>. Keep the connection open until the transfer is complete.</p>
</section>"#
}

pub async fn file_sharing() -> Html<String> {
    let body = format!("{}{}", SHARING_INTRO, sharing_form());
    layout("File Sharing", "/file-sharing", &body)
}

pub async fn file_sharing_upload(State(state): State<AppState>, multipart: Multipart) -> Html<String> {
    let outcome = stage_from_form(&state, multipart).await;
    let notice = match outcome {
        Ok((name, receiver, UploadOutcome::Delivered)) => format!(
            r#"<div class="alert"><strong>File "{}" sent successfully!</strong><p>A receiver for {} was waiting and got the file.</p></div>"#,
            escape_html(&name),
            escape_html(&receiver)
        ),
        Ok((name, receiver, UploadOutcome::Staged)) => format!(
            r#"<div class="alert"><strong>File "{}" is ready.</strong><p>It will be delivered to the next receiver for {} that connects with the same password within 10 minutes.</p></div>"#,
            escape_html(&name),
            escape_html(&receiver)
        ),
        Err(e) => render_alert("Error sending file", &e.to_string()),
    };
    let body = format!("{}{}{}", SHARING_INTRO, notice, sharing_form());
    layout("File Sharing", "/file-sharing", &body)
}

async fn stage_from_form(
    state: &AppState,
    multipart: Multipart,
) -> Result<(String, String, UploadOutcome), AppError> {
    let mut form = read_form(multipart, state.config.max_upload_bytes).await?;
    let host = form.field("host").map(str::trim).unwrap_or_default().to_string();
    let password = form.field("password").unwrap_or_default().to_string();
    let port = form
        .field("port")
        .and_then(|p| p.trim().parse::<u16>().ok())
        .filter(|p| *p > 0);
    let (Some(port), false, false) = (port, host.is_empty(), password.is_empty()) else {
        return Err(AppError::Validation(
            "Please enter host, port and password".to_string(),
        ));
    };
    let file = form.require_file()?;

    let id = state.hub.prepare_send(&host, port, &password).await;
    let session = state
        .hub
        .take_session(id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
    let receiver = format!("{}:{}", session.host, session.port);
    let outcome = state
        .hub
        .stage_upload(session, file.name.clone(), file.bytes)
        .await?;
    Ok((file.name, receiver, outcome))
}

const SECURITY_INTRO: &str = r#"<h1>File Security Scanner</h1>
<p class="muted">Estimate the risk of a file from its type and size. The file never leaves this server; vendor results are simulated from those properties.</p>
<form class="card" method="post" action="/file-security" enctype="multipart/form-data">
  <label for="file">File</label>
  <input id="file" name="file" type="file" required/>
  <button type="submit">Check file</button>
</form>"#;

pub async fn file_security() -> Html<String> {
    layout("File Security", "/file-security", SECURITY_INTRO)
}

pub async fn file_security_check(State(state): State<AppState>, multipart: Multipart) -> Html<String> {
    let result = match read_form(multipart, state.config.max_upload_bytes).await {
        Ok(mut form) => form.require_file(),
        Err(e) => Err(e),
    };

    let section = match result {
        Ok(file) => {
            let check = integrity_for(&file.name, &file.content_type, &file.bytes);
            let props = &check.properties;
            let mut details = FieldMap::new();
            details.insert("File Name", file.name.as_str());
            details.insert("Type", props.mime_type.as_str());
            details.insert("Extension", props.extension.as_str());
            details.insert("Size", format!("{} bytes", props.size));
            details.insert("Risk Level", props.risk_level.as_str());
            details.insert("Size Risk", props.size_risk.as_str());
            format!(
                "{}{}",
                render_security_indicator(&check.verdict, Some(&check.report.data.id)),
                render_result_table("File Properties", &details)
            )
        }
        Err(e) => render_alert("Unable to complete security check", &e.to_string()),
    };

    let body = format!("{}{}", SECURITY_INTRO, section);
    layout("File Security", "/file-security", &body)
}
