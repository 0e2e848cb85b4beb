// ============================================
// File transport
// ============================================
//
// A password-paired WebSocket relay. Senders push one JSON metadata frame
// followed by one binary frame; receivers register with the same password
// and get the bytes forwarded. Nothing survives a dropped socket.

use thiserror::Error;

pub mod peer;
pub mod protocol;
pub mod relay;

pub use peer::{Endpoint, Notifier, OutgoingFile, ReceivedFile, receive_file, send_file};
pub use relay::TransferHub;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No receiver is waiting for this password")]
    NoReceiver,

    #[error("File is {size} bytes, the transfer limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Expected {expected} bytes but received {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Could not open the socket at all
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Socket error: {0}")]
    Socket(String),

    /// The other side sent an `{"error": ...}` frame
    #[error("{0}")]
    Rejected(String),

    #[error("Connection closed before the transfer completed")]
    Closed,

    /// A sender claimed this receiver and then failed before delivering
    #[error("Sender disconnected")]
    SenderDisconnected,

    /// Staging area for uploads without a receiver is full
    #[error("Too many files are waiting for a receiver ({limit} byte limit); try again later")]
    StagingFull { limit: u64 },

    #[error("Staged file could not be sealed or opened")]
    Crypto(#[from] crate::utils::encryption::EncryptionError),
}
