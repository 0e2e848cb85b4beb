// ============================================
// Transfer relay
// ============================================
//
// Pairs senders with receivers by password digest. A receiver socket waits
// on a oneshot channel; the first sender presenting the same password
// claims it and pushes the file through. Files uploaded over REST are kept
// sealed in memory until a matching receiver shows up or the TTL passes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::{Mutex, RwLock, oneshot};
use uuid::Uuid;

use super::TransferError;
use super::protocol::{FRAME_SLACK, ReceiveRequest, RelayMessage, SendMetadata, decode};
use crate::utils::{encryption, generate_session_id, password_digest};

/// How long a prepared session or a staged upload is kept
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// How long a rejected sender gets to finish its close handshake
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Caps on plaintext bytes held for receivers that have not connected yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingLimits {
    pub per_password: u64,
    pub total: u64,
}

impl StagingLimits {
    /// Two full-size uploads per password, four across the hub.
    pub fn for_upload_cap(max_bytes: u64) -> Self {
        Self {
            per_password: max_bytes.saturating_mul(2),
            total: max_bytes.saturating_mul(4),
        }
    }
}

#[derive(Debug)]
pub struct Delivery {
    pub filename: String,
    pub bytes: Bytes,
}

struct WaitingReceiver {
    id: u64,
    tx: oneshot::Sender<Delivery>,
}

struct StagedFile {
    filename: String,
    size: u64,
    /// nonce || ciphertext || tag
    sealed: Vec<u8>,
    staged_at: Instant,
}

/// A sender announced through `prepare-send`, waiting for its upload.
#[derive(Clone)]
pub struct PreparedSession {
    pub id: Uuid,
    /// Receiver address the sender named; echoed back with the upload result
    pub host: String,
    pub port: u16,
    digest: String,
    // needed to seal the upload; dropped with the session
    password: String,
    created_at: Instant,
}

impl std::fmt::Debug for PreparedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedSession")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Handed straight to a receiver that was already waiting
    Delivered,
    /// Sealed and kept for the next matching receiver
    Staged,
}

enum Registration {
    Ready(Delivery),
    Waiting {
        id: u64,
        digest: String,
        rx: oneshot::Receiver<Delivery>,
    },
}

#[derive(Default)]
struct Pairing {
    waiting: HashMap<String, VecDeque<WaitingReceiver>>,
    staged: HashMap<String, VecDeque<StagedFile>>,
}

impl Pairing {
    /// First receiver for the digest whose socket is still around.
    fn claim_receiver(&mut self, digest: &str) -> Option<oneshot::Sender<Delivery>> {
        let queue = self.waiting.get_mut(digest)?;
        let mut claimed = None;
        while let Some(receiver) = queue.pop_front() {
            if !receiver.tx.is_closed() {
                claimed = Some(receiver.tx);
                break;
            }
        }
        if queue.is_empty() {
            self.waiting.remove(digest);
        }
        claimed
    }

    fn take_staged(&mut self, digest: &str, ttl: Duration) -> Option<StagedFile> {
        let queue = self.staged.get_mut(digest)?;
        let mut found = None;
        while let Some(file) = queue.pop_front() {
            if file.staged_at.elapsed() < ttl {
                found = Some(file);
                break;
            }
        }
        if queue.is_empty() {
            self.staged.remove(digest);
        }
        found
    }

    /// Refuse a new staged file that would push either cap over its limit.
    fn check_room(
        &self,
        digest: &str,
        size: u64,
        limits: StagingLimits,
    ) -> Result<(), TransferError> {
        let for_password: u64 = self
            .staged
            .get(digest)
            .map_or(0, |queue| queue.iter().map(|f| f.size).sum());
        if for_password.saturating_add(size) > limits.per_password {
            return Err(TransferError::StagingFull {
                limit: limits.per_password,
            });
        }
        let total: u64 = self.staged.values().flatten().map(|f| f.size).sum();
        if total.saturating_add(size) > limits.total {
            return Err(TransferError::StagingFull {
                limit: limits.total,
            });
        }
        Ok(())
    }

    fn cancel(&mut self, digest: &str, id: u64) {
        if let Some(queue) = self.waiting.get_mut(digest) {
            queue.retain(|r| r.id != id);
            if queue.is_empty() {
                self.waiting.remove(digest);
            }
        }
    }
}

struct HubInner {
    pairing: Mutex<Pairing>,
    sessions: RwLock<HashMap<Uuid, PreparedSession>>,
    next_receiver_id: AtomicU64,
    max_bytes: u64,
    ttl: Duration,
    limits: StagingLimits,
}

#[derive(Clone)]
pub struct TransferHub {
    inner: Arc<HubInner>,
}

impl TransferHub {
    pub fn new(max_bytes: u64) -> Self {
        Self::with_ttl(max_bytes, SESSION_TTL)
    }

    pub fn with_ttl(max_bytes: u64, ttl: Duration) -> Self {
        Self::with_limits(max_bytes, ttl, StagingLimits::for_upload_cap(max_bytes))
    }

    pub fn with_limits(max_bytes: u64, ttl: Duration, limits: StagingLimits) -> Self {
        Self {
            inner: Arc::new(HubInner {
                pairing: Mutex::new(Pairing::default()),
                sessions: RwLock::new(HashMap::new()),
                next_receiver_id: AtomicU64::new(1),
                max_bytes,
                ttl,
                limits,
            }),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.inner.max_bytes
    }

    /// Largest WebSocket message the relay sockets should accept.
    pub fn frame_limit(&self) -> usize {
        usize::try_from(self.inner.max_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(FRAME_SLACK)
    }

    // ============================================
    // REST side: prepared sessions and staged uploads
    // ============================================

    pub async fn prepare_send(&self, host: &str, port: u16, password: &str) -> Uuid {
        self.purge_expired().await;
        let session = PreparedSession {
            id: generate_session_id(),
            host: host.to_string(),
            port,
            digest: password_digest(password),
            password: password.to_string(),
            created_at: Instant::now(),
        };
        let id = session.id;
        self.inner.sessions.write().await.insert(id, session);
        tracing::info!(session_id = %id, host = %host, port, "Prepared send session");
        id
    }

    /// Remove and return a live session. Each session accepts one upload.
    pub async fn take_session(&self, id: Uuid) -> Option<PreparedSession> {
        let session = self.inner.sessions.write().await.remove(&id)?;
        (session.created_at.elapsed() < self.inner.ttl).then_some(session)
    }

    pub async fn stage_upload(
        &self,
        session: PreparedSession,
        filename: String,
        bytes: Bytes,
    ) -> Result<UploadOutcome, TransferError> {
        let size = bytes.len() as u64;
        if size > self.inner.max_bytes {
            return Err(TransferError::TooLarge {
                size,
                limit: self.inner.max_bytes,
            });
        }

        self.purge_expired().await;
        let limits = self.inner.limits;
        let delivery = Delivery { filename, bytes };
        let delivery = {
            let mut pairing = self.inner.pairing.lock().await;
            let delivery = match pairing.claim_receiver(&session.digest) {
                Some(tx) => match tx.send(delivery) {
                    Ok(()) => {
                        tracing::info!(session_id = %session.id, size, "Upload delivered to waiting receiver");
                        return Ok(UploadOutcome::Delivered);
                    }
                    Err(returned) => returned,
                },
                None => delivery,
            };
            pairing.check_room(&session.digest, size, limits)?;
            delivery
        };

        let sealed = encryption::seal(&session.password, &delivery.bytes)?;
        let mut pairing = self.inner.pairing.lock().await;
        // another upload may have filled the area while this one was sealed
        pairing.check_room(&session.digest, size, limits)?;
        pairing
            .staged
            .entry(session.digest)
            .or_default()
            .push_back(StagedFile {
                filename: delivery.filename,
                size,
                sealed,
                staged_at: Instant::now(),
            });
        drop(pairing);
        tracing::info!(session_id = %session.id, size, "Upload staged for next receiver");
        Ok(UploadOutcome::Staged)
    }

    /// Number of staged uploads waiting for this password.
    pub async fn pending_for(&self, password: &str) -> usize {
        self.purge_expired().await;
        let digest = password_digest(password);
        self.inner
            .pairing
            .lock()
            .await
            .staged
            .get(&digest)
            .map_or(0, VecDeque::len)
    }

    async fn purge_expired(&self) {
        let ttl = self.inner.ttl;
        self.inner
            .sessions
            .write()
            .await
            .retain(|_, s| s.created_at.elapsed() < ttl);

        let mut pairing = self.inner.pairing.lock().await;
        pairing.staged.retain(|_, queue| {
            queue.retain(|f| f.staged_at.elapsed() < ttl);
            !queue.is_empty()
        });
    }

    // ============================================
    // Socket side
    // ============================================

    async fn register_receiver(&self, password: &str) -> Result<Registration, TransferError> {
        let digest = password_digest(password);
        let mut pairing = self.inner.pairing.lock().await;

        if let Some(staged) = pairing.take_staged(&digest, self.inner.ttl) {
            drop(pairing);
            let bytes = encryption::open(password, &staged.sealed)?;
            return Ok(Registration::Ready(Delivery {
                filename: staged.filename,
                bytes: Bytes::from(bytes),
            }));
        }

        let (tx, rx) = oneshot::channel();
        let id = self.inner.next_receiver_id.fetch_add(1, Ordering::Relaxed);
        pairing
            .waiting
            .entry(digest.clone())
            .or_default()
            .push_back(WaitingReceiver { id, tx });
        Ok(Registration::Waiting { id, digest, rx })
    }

    /// Drive a `/send` socket to completion.
    pub async fn serve_sender(&self, mut socket: WebSocket) {
        match self.relay_send(&mut socket).await {
            Ok(filename) => tracing::info!(filename = %filename, "File relayed"),
            Err(e) => {
                tracing::warn!(error = %e, "Send session failed");
                let frame = RelayMessage::error(e.to_string()).to_text();
                let _ = socket.send(Message::Text(frame.into())).await;
                let _ = socket.send(Message::Close(None)).await;
                // The sender may still be writing its file; read it off so the
                // error frame is not lost to a connection reset.
                let _ = tokio::time::timeout(CLOSE_GRACE, wait_for_close(&mut socket)).await;
                return;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    }

    /// Drive a `/receive` socket to completion.
    pub async fn serve_receiver(&self, mut socket: WebSocket) {
        match self.relay_receive(&mut socket).await {
            Ok(filename) => tracing::info!(filename = %filename, "File delivered"),
            Err(TransferError::Closed) => tracing::debug!("Receiver left before a file arrived"),
            Err(e) => {
                tracing::warn!(error = %e, "Receive session failed");
                let frame = RelayMessage::error(e.to_string()).to_text();
                let _ = socket.send(Message::Text(frame.into())).await;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    }

    async fn relay_send(&self, socket: &mut WebSocket) -> Result<String, TransferError> {
        let meta: SendMetadata = decode(&next_text(socket).await?)?;
        if meta.size > self.inner.max_bytes {
            return Err(TransferError::TooLarge {
                size: meta.size,
                limit: self.inner.max_bytes,
            });
        }

        let digest = password_digest(&meta.password);
        let tx = self
            .inner
            .pairing
            .lock()
            .await
            .claim_receiver(&digest)
            .ok_or(TransferError::NoReceiver)?;

        // acknowledge the pairing; the file frame may already be buffered
        send_frame(socket, &RelayMessage::Progress { progress: 0 }).await?;

        let bytes = next_binary(socket).await?;
        let actual = bytes.len() as u64;
        if actual != meta.size {
            return Err(TransferError::SizeMismatch {
                expected: meta.size,
                actual,
            });
        }

        tx.send(Delivery {
            filename: meta.filename.clone(),
            bytes,
        })
        .map_err(|_| TransferError::Closed)?;

        send_frame(socket, &RelayMessage::Progress { progress: 100 }).await?;
        Ok(meta.filename)
    }

    async fn relay_receive(&self, socket: &mut WebSocket) -> Result<String, TransferError> {
        let request: ReceiveRequest = decode(&next_text(socket).await?)?;

        let delivery = match self.register_receiver(&request.password).await? {
            Registration::Ready(delivery) => delivery,
            Registration::Waiting { id, digest, rx } => {
                tokio::select! {
                    delivered = rx => delivered.map_err(|_| TransferError::SenderDisconnected)?,
                    _ = wait_for_close(socket) => {
                        self.inner.pairing.lock().await.cancel(&digest, id);
                        return Err(TransferError::Closed);
                    }
                }
            }
        };

        send_frame(
            socket,
            &RelayMessage::Header {
                filename: delivery.filename.clone(),
                size: delivery.bytes.len() as u64,
            },
        )
        .await?;
        send_frame(socket, &RelayMessage::Progress { progress: 100 }).await?;
        socket
            .send(Message::Binary(delivery.bytes))
            .await
            .map_err(|e| TransferError::Socket(e.to_string()))?;
        send_frame(socket, &RelayMessage::complete(delivery.filename.clone())).await?;
        Ok(delivery.filename)
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &RelayMessage) -> Result<(), TransferError> {
    socket
        .send(Message::Text(frame.to_text().into()))
        .await
        .map_err(|e| TransferError::Socket(e.to_string()))
}

async fn next_text(socket: &mut WebSocket) -> Result<String, TransferError> {
    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_string()),
            Some(Ok(Message::Binary(_))) => {
                return Err(TransferError::Protocol(
                    "expected a JSON text frame".to_string(),
                ));
            }
            Some(Ok(Message::Close(_))) | None => return Err(TransferError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(TransferError::Socket(e.to_string())),
        }
    }
}

async fn next_binary(socket: &mut WebSocket) -> Result<Bytes, TransferError> {
    loop {
        match socket.recv().await {
            Some(Ok(Message::Binary(bytes))) => return Ok(bytes),
            Some(Ok(Message::Text(_))) => {
                return Err(TransferError::Protocol(
                    "expected a binary frame with the file content".to_string(),
                ));
            }
            Some(Ok(Message::Close(_))) | None => return Err(TransferError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(TransferError::Socket(e.to_string())),
        }
    }
}

/// Resolves once the peer hangs up. Anything else it sends is ignored.
async fn wait_for_close(socket: &mut WebSocket) {
    loop {
        match socket.recv().await {
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 1024;

    #[tokio::test]
    async fn staged_upload_reaches_matching_receiver() {
        let hub = TransferHub::new(LIMIT);
        let id = hub.prepare_send("10.0.0.2", 8765, "open sesame").await;
        let session = hub.take_session(id).await.unwrap();
        let outcome = hub
            .stage_upload(session, "notes.txt".into(), Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(outcome, UploadOutcome::Staged);
        assert_eq!(hub.pending_for("open sesame").await, 1);
        assert_eq!(hub.pending_for("other").await, 0);

        match hub.register_receiver("open sesame").await.unwrap() {
            Registration::Ready(delivery) => {
                assert_eq!(delivery.filename, "notes.txt");
                assert_eq!(&delivery.bytes[..], b"hello");
            }
            Registration::Waiting { .. } => panic!("staged file should be ready"),
        }
        assert_eq!(hub.pending_for("open sesame").await, 0);
    }

    #[tokio::test]
    async fn upload_goes_straight_to_waiting_receiver() {
        let hub = TransferHub::new(LIMIT);
        let Registration::Waiting { rx, .. } = hub.register_receiver("pw").await.unwrap() else {
            panic!("nothing staged yet");
        };
        let id = hub.prepare_send("localhost", 8765, "pw").await;
        let session = hub.take_session(id).await.unwrap();
        let outcome = hub
            .stage_upload(session, "a.bin".into(), Bytes::from_static(&[1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(outcome, UploadOutcome::Delivered);
        let delivery = rx.await.unwrap();
        assert_eq!(&delivery.bytes[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn session_is_single_use_and_expires() {
        let hub = TransferHub::new(LIMIT);
        let id = hub.prepare_send("localhost", 8765, "pw").await;
        assert!(hub.take_session(id).await.is_some());
        assert!(hub.take_session(id).await.is_none());
        assert!(hub.take_session(Uuid::new_v4()).await.is_none());

        let short = TransferHub::with_ttl(LIMIT, Duration::ZERO);
        let id = short.prepare_send("localhost", 8765, "pw").await;
        assert!(short.take_session(id).await.is_none());
    }

    #[tokio::test]
    async fn oversized_upload_rejected() {
        let hub = TransferHub::new(4);
        let id = hub.prepare_send("localhost", 8765, "pw").await;
        let session = hub.take_session(id).await.unwrap();
        let err = hub
            .stage_upload(session, "big".into(), Bytes::from_static(b"12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::TooLarge { size: 5, limit: 4 }));
    }

    async fn stage(
        hub: &TransferHub,
        password: &str,
        len: usize,
    ) -> Result<UploadOutcome, TransferError> {
        let id = hub.prepare_send("localhost", 8765, password).await;
        let session = hub.take_session(id).await.unwrap();
        hub.stage_upload(session, "chunk.bin".into(), Bytes::from(vec![7u8; len]))
            .await
    }

    #[tokio::test]
    async fn staging_area_is_capped() {
        let limits = StagingLimits {
            per_password: 12,
            total: 20,
        };
        let hub = TransferHub::with_limits(8, SESSION_TTL, limits);

        assert_eq!(stage(&hub, "a", 8).await.unwrap(), UploadOutcome::Staged);
        let err = stage(&hub, "a", 8).await.unwrap_err();
        assert!(matches!(err, TransferError::StagingFull { limit: 12 }));

        assert_eq!(stage(&hub, "b", 8).await.unwrap(), UploadOutcome::Staged);
        let err = stage(&hub, "c", 8).await.unwrap_err();
        assert!(matches!(err, TransferError::StagingFull { limit: 20 }));
        assert_eq!(hub.pending_for("c").await, 0);

        // a receiver collecting "a" frees room again
        assert!(matches!(
            hub.register_receiver("a").await.unwrap(),
            Registration::Ready(_)
        ));
        assert_eq!(stage(&hub, "c", 8).await.unwrap(), UploadOutcome::Staged);
    }

    #[tokio::test]
    async fn waiting_receiver_bypasses_staging_caps() {
        let limits = StagingLimits {
            per_password: 0,
            total: 0,
        };
        let hub = TransferHub::with_limits(8, SESSION_TTL, limits);
        let Registration::Waiting { rx, .. } = hub.register_receiver("pw").await.unwrap() else {
            panic!("nothing staged yet");
        };
        assert_eq!(stage(&hub, "pw", 8).await.unwrap(), UploadOutcome::Delivered);
        assert_eq!(rx.await.unwrap().bytes.len(), 8);
        assert!(matches!(
            stage(&hub, "pw", 1).await,
            Err(TransferError::StagingFull { limit: 0 })
        ));
    }

    #[test]
    fn default_limits_scale_with_upload_cap() {
        let limits = StagingLimits::for_upload_cap(64);
        assert_eq!(limits.per_password, 128);
        assert_eq!(limits.total, 256);
    }

    #[tokio::test]
    async fn departed_receivers_are_skipped() {
        let hub = TransferHub::new(LIMIT);
        let Registration::Waiting { rx, .. } = hub.register_receiver("pw").await.unwrap() else {
            panic!("expected to wait");
        };
        drop(rx);
        assert!(hub.inner.pairing.lock().await.claim_receiver(&password_digest("pw")).is_none());
    }

    #[test]
    fn session_debug_hides_password() {
        let session = PreparedSession {
            id: Uuid::nil(),
            host: "h".into(),
            port: 1,
            digest: "d".into(),
            password: "topsecret".into(),
            created_at: Instant::now(),
        };
        assert!(!format!("{:?}", session).contains("topsecret"));
    }
}
