// ============================================
// Transfer peers
// ============================================
//
// Client ends of the relay. Progress is reported through a `Notifier`; a
// failed transfer always produces exactly one error notification and an
// `Err`, never a panic.

use std::sync::Mutex;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};

use super::TransferError;
use super::protocol::{
    FRAME_SLACK, MAX_TRANSFER_BYTES, ReceiveRequest, RelayMessage, SendMetadata, decode, encode,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const SEND_CONNECT_FAILED: &str =
    "Failed to connect to receiver. Please check the host and port.";
pub const RECEIVE_CONNECT_FAILED: &str = "Failed to start file receiver. Please check the port.";

/// Where the relay listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Use `wss://` instead of `ws://`
    pub secure: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, path)
    }
}

/// Toast-style status sink.
pub trait Notifier: Send + Sync {
    fn loading(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn dismiss(&self);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn loading(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn dismiss(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Loading(String),
    Success(String),
    Error(String),
    Dismiss,
}

/// Keeps every notification in order. Used by callers that want to show
/// the history afterwards.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notification: Notification) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) {
        self.push(Notification::Loading(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }

    fn dismiss(&self) {
        self.push(Notification::Dismiss);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ============================================
// Sending
// ============================================

pub async fn send_file(
    endpoint: &Endpoint,
    file: &OutgoingFile,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<(), TransferError> {
    notifier.loading("Connecting to receiver...");
    match try_send(endpoint, file, password, notifier).await {
        Ok(()) => {
            notifier.dismiss();
            notifier.success(&format!("File \"{}\" sent successfully!", file.name));
            Ok(())
        }
        Err(e) => {
            tracing::warn!(url = %endpoint.url("/send"), error = %e, "Send failed");
            notifier.dismiss();
            notifier.error(&user_message(&e, SEND_CONNECT_FAILED));
            Err(e)
        }
    }
}

async fn try_send(
    endpoint: &Endpoint,
    file: &OutgoingFile,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<(), TransferError> {
    let mut ws = connect(&endpoint.url("/send")).await?;
    notifier.dismiss();
    notifier.loading("Preparing file for transfer...");

    let result = exchange_send(&mut ws, file, password, notifier).await;
    let _ = ws.close(None).await;
    result
}

async fn exchange_send(
    ws: &mut Socket,
    file: &OutgoingFile,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<(), TransferError> {
    let metadata = SendMetadata {
        filename: file.name.clone(),
        password: password.to_string(),
        size: file.bytes.len() as u64,
    };
    ws.send(Message::text(encode(&metadata)?))
        .await
        .map_err(socket_error)?;
    notifier.dismiss();
    notifier.loading("Sending file...");
    ws.send(Message::binary(file.bytes.clone()))
        .await
        .map_err(socket_error)?;

    // Relays may acknowledge the metadata with progress 0 before the upload
    // is confirmed; only 100 or an error ends the exchange.
    loop {
        match next_relay_message(ws).await? {
            RelayMessage::Error { error } => return Err(TransferError::Rejected(error)),
            RelayMessage::Progress { progress } => {
                notifier.dismiss();
                notifier.loading(&format!("Sending: {}%", progress));
                if progress >= 100 {
                    return Ok(());
                }
            }
            RelayMessage::Header { .. } | RelayMessage::Complete { .. } => continue,
        }
    }
}

// ============================================
// Receiving
// ============================================

pub async fn receive_file(
    endpoint: &Endpoint,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<ReceivedFile, TransferError> {
    notifier.loading("Starting file receiver...");
    match try_receive(endpoint, password, notifier).await {
        Ok(file) => {
            notifier.dismiss();
            notifier.success(&format!("File \"{}\" received successfully!", file.filename));
            Ok(file)
        }
        Err(e) => {
            tracing::warn!(url = %endpoint.url("/receive"), error = %e, "Receive failed");
            notifier.dismiss();
            notifier.error(&user_message(&e, RECEIVE_CONNECT_FAILED));
            Err(e)
        }
    }
}

async fn try_receive(
    endpoint: &Endpoint,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<ReceivedFile, TransferError> {
    let mut ws = connect(&endpoint.url("/receive")).await?;
    notifier.dismiss();
    notifier.loading("Waiting for incoming files...");

    let result = exchange_receive(&mut ws, password, notifier).await;
    let _ = ws.close(None).await;
    result
}

async fn exchange_receive(
    ws: &mut Socket,
    password: &str,
    notifier: &dyn Notifier,
) -> Result<ReceivedFile, TransferError> {
    let request = ReceiveRequest {
        password: password.to_string(),
    };
    ws.send(Message::text(encode(&request)?))
        .await
        .map_err(socket_error)?;

    let mut content: Option<Vec<u8>> = None;
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => match decode::<RelayMessage>(text.as_str())? {
                RelayMessage::Error { error } => return Err(TransferError::Rejected(error)),
                RelayMessage::Header { filename, .. } => {
                    notifier.dismiss();
                    notifier.loading(&format!("Receiving \"{}\"...", filename));
                }
                RelayMessage::Progress { progress } => {
                    notifier.dismiss();
                    notifier.loading(&format!("Receiving: {}%", progress));
                }
                RelayMessage::Complete { filename, .. } => {
                    let bytes = content.take().ok_or_else(|| {
                        TransferError::Protocol("completion arrived before file data".to_string())
                    })?;
                    return Ok(ReceivedFile { filename, bytes });
                }
            },
            Some(Ok(Message::Binary(bytes))) => {
                notifier.dismiss();
                notifier.loading("Saving received file...");
                content = Some(bytes.to_vec());
            }
            Some(Ok(Message::Close(_))) | None => return Err(TransferError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(socket_error(e)),
        }
    }
}

// ============================================
// Shared helpers
// ============================================

async fn connect(url: &str) -> Result<Socket, TransferError> {
    let limit = usize::try_from(MAX_TRANSFER_BYTES)
        .unwrap_or(usize::MAX)
        .saturating_add(FRAME_SLACK);
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(limit);
    config.max_frame_size = Some(limit);

    let (ws, _response) = connect_async_with_config(url, Some(config), false)
        .await
        .map_err(|e| TransferError::Connect(e.to_string()))?;
    Ok(ws)
}

async fn next_relay_message(ws: &mut Socket) -> Result<RelayMessage, TransferError> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return decode(text.as_str()),
            Some(Ok(Message::Close(_))) | None => return Err(TransferError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(socket_error(e)),
        }
    }
}

fn socket_error(e: tokio_tungstenite::tungstenite::Error) -> TransferError {
    TransferError::Socket(e.to_string())
}

fn user_message(error: &TransferError, connect_failed: &str) -> String {
    match error {
        TransferError::Connect(_) => connect_failed.to_string(),
        other => other.to_string(),
    }
}
