// Wire frames shared by the relay and the peers. Control frames are JSON
// text; file content always travels as a single binary frame.

use serde::{Deserialize, Serialize};

use super::TransferError;

/// Upper bound for a single transfer.
pub const MAX_TRANSFER_BYTES: u64 = 64 * 1024 * 1024;

/// Headroom on top of the file size for the socket message limit.
pub const FRAME_SLACK: usize = 64 * 1024;

/// First frame a sender writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMetadata {
    pub filename: String,
    pub password: String,
    pub size: u64,
}

/// First (and only) frame a receiver writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveRequest {
    pub password: String,
}

/// Frames written by the relay. Untagged so each one stays a flat object;
/// variant order matters for decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayMessage {
    Error { error: String },
    Complete { complete: bool, filename: String },
    Header { filename: String, size: u64 },
    Progress { progress: u8 },
}

impl RelayMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn complete(filename: impl Into<String>) -> Self {
        Self::Complete {
            complete: true,
            filename: filename.into(),
        }
    }

    pub fn to_text(&self) -> String {
        // Serializing these plain structs cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

pub fn encode<T: Serialize>(frame: &T) -> Result<String, TransferError> {
    serde_json::to_string(frame).map_err(|e| TransferError::Protocol(e.to_string()))
}

pub fn decode<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, TransferError> {
    serde_json::from_str(text).map_err(|e| TransferError::Protocol(format!("bad frame: {}", e)))
}
