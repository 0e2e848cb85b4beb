mod common;

use std::time::Duration;

use axum::{
    Router,
    extract::ws::{Message as RelayFrame, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use cyberlink_api::client::BackendClient;
use cyberlink_api::transport::{
    Endpoint, OutgoingFile, TransferError, receive_file, send_file,
};
use cyberlink_api::transport::peer::RecordingNotifier;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use common::{offline_config, serve, spawn_app};

fn sample_file() -> OutgoingFile {
    OutgoingFile {
        name: "quarterly.pdf".to_string(),
        bytes: (0..4096u32).map(|i| (i % 251) as u8).collect(),
    }
}

#[tokio::test]
async fn live_transfer_reaches_waiting_receiver() {
    let addr = spawn_app(offline_config()).await;
    let endpoint = Endpoint::new("127.0.0.1", addr.port());

    let receiver_endpoint = endpoint.clone();
    let receiver = tokio::spawn(async move {
        let notifier = RecordingNotifier::new();
        let result = receive_file(&receiver_endpoint, "correct horse", &notifier).await;
        (result, notifier.errors())
    });

    // The receiver registers asynchronously; retry until the relay pairs us
    let file = sample_file();
    let mut sent = false;
    for _ in 0..50 {
        let notifier = RecordingNotifier::new();
        match send_file(&endpoint, &file, "correct horse", &notifier).await {
            Ok(()) => {
                assert!(notifier.errors().is_empty());
                sent = true;
                break;
            }
            Err(TransferError::Rejected(_)) => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(other) => panic!("unexpected send failure: {other}"),
        }
    }
    assert!(sent, "receiver never became available");

    let (result, errors) = tokio::time::timeout(Duration::from_secs(5), receiver)
        .await
        .expect("receiver finished")
        .expect("receiver task");
    let received = result.expect("file received");
    assert!(errors.is_empty());
    assert_eq!(received.filename, file.name);
    assert_eq!(received.bytes, file.bytes);
}

#[tokio::test]
async fn staged_upload_is_picked_up_by_later_receiver() {
    let addr = spawn_app(offline_config()).await;
    let client = BackendClient::new(&format!("http://{}", addr)).unwrap();
    let file = sample_file();

    let created = client.initiate_file_send("127.0.0.1", 8765, "s3cret").await;
    let session_id = created.data.expect("session created").session_id;

    let ack = client
        .upload_file(&session_id, &file.name, file.bytes.clone())
        .await;
    assert!(ack.is_ok(), "upload failed: {:?}", ack.error);

    let pending = client.prepare_file_receive(8765, "s3cret").await;
    assert!(pending.data.expect("prepared").success);

    let notifier = RecordingNotifier::new();
    let received = receive_file(&Endpoint::new("127.0.0.1", addr.port()), "s3cret", &notifier)
        .await
        .expect("staged file delivered");
    assert_eq!(received.filename, file.name);
    assert_eq!(received.bytes, file.bytes);
    assert!(notifier.errors().is_empty());

    // Single use: the session id cannot upload twice
    let again = client.upload_file(&session_id, "other.txt", vec![1, 2, 3]).await;
    assert_eq!(again.status, 404);
}

#[tokio::test]
async fn send_without_receiver_reports_exactly_one_error() {
    let addr = spawn_app(offline_config()).await;
    let notifier = RecordingNotifier::new();

    let result = send_file(
        &Endpoint::new("127.0.0.1", addr.port()),
        &sample_file(),
        "nobody-listening",
        &notifier,
    )
    .await;

    assert!(matches!(result, Err(TransferError::Rejected(_))));
    assert_eq!(
        notifier.errors(),
        vec!["No receiver is waiting for this password".to_string()]
    );
}

/// A relay that only answers once both sender frames have arrived.
async fn silent_until_file(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket| async move {
        let Some(Ok(RelayFrame::Text(meta))) = socket.recv().await else {
            return;
        };
        let meta: Value = serde_json::from_str(meta.as_str()).unwrap();
        let Some(Ok(RelayFrame::Binary(bytes))) = socket.recv().await else {
            return;
        };
        let reply = if Some(bytes.len() as u64) == meta["size"].as_u64() {
            json!({ "progress": 100 })
        } else {
            json!({ "error": "size mismatch" })
        };
        let _ = socket.send(RelayFrame::Text(reply.to_string().into())).await;
    })
}

#[tokio::test]
async fn sender_writes_file_without_waiting_for_ack() {
    let addr = serve(Router::new().route("/send", get(silent_until_file))).await;
    let notifier = RecordingNotifier::new();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        send_file(
            &Endpoint::new("127.0.0.1", addr.port()),
            &sample_file(),
            "no ack",
            &notifier,
        ),
    )
    .await
    .expect("sender did not stall");

    assert!(result.is_ok(), "send failed: {:?}", result);
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn receiver_is_told_when_paired_sender_vanishes() {
    let addr = spawn_app(offline_config()).await;
    let endpoint = Endpoint::new("127.0.0.1", addr.port());

    let receiver_endpoint = endpoint.clone();
    let receiver = tokio::spawn(async move {
        let notifier = RecordingNotifier::new();
        let result = receive_file(&receiver_endpoint, "tin can", &notifier).await;
        (result, notifier.errors())
    });

    let metadata = json!({ "filename": "partial.bin", "password": "tin can", "size": 10 });
    let mut paired = false;
    for _ in 0..50 {
        let (mut ws, _) = connect_async(endpoint.url("/send")).await.expect("relay reachable");
        ws.send(Message::text(metadata.to_string())).await.unwrap();
        let reply = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_string(),
            other => panic!("unexpected relay frame: {:?}", other),
        };
        if reply.contains("progress") {
            // paired; hang up before the file frame
            drop(ws);
            paired = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(paired, "receiver never became available");

    let (result, errors) = tokio::time::timeout(Duration::from_secs(5), receiver)
        .await
        .expect("receiver finished")
        .expect("receiver task");
    match result {
        Err(TransferError::Rejected(message)) => assert_eq!(message, "Sender disconnected"),
        other => panic!("expected a sender-disconnected rejection, got {:?}", other),
    }
    assert_eq!(errors, vec!["Sender disconnected".to_string()]);
}
