use createai_probe::{
    Error,
    api::QueryRequest,
    config::{Credentials, ModelConfig, StreamConfig},
    stream::{Keepalive, StreamClient, consume},
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio_tungstenite::tungstenite::{
    Error as WsError, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};

mod common;

use common::{mocks::ScriptedSocket, test_utils::spawn_ws_server};

const SLOW_KEEPALIVE: Keepalive = Keepalive {
    interval: Duration::from_secs(60),
    timeout: Duration::from_secs(60),
};

fn sample_request() -> QueryRequest {
    QueryRequest::new("What is 2+2?", &ModelConfig::default())
        .with_session_id("stream-test")
        .streaming()
}

fn payload() -> String {
    serde_json::to_string(&sample_request()).unwrap()
}

#[tokio::test]
async fn test_fragments_are_concatenated_and_marker_stripped() {
    let mut socket = ScriptedSocket::texts(&["Hel", "lo wor", "ld<EOS>"]);
    let mut out = Vec::new();

    let summary = consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Hello world");
    assert_eq!(summary.fragments, 3);
    assert_eq!(summary.chars, 11);
}

#[tokio::test]
async fn test_payload_is_sent_exactly_once_first() {
    let mut socket = ScriptedSocket::texts(&["4<EOS>"]);
    let mut out = Vec::new();

    consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap();

    assert_eq!(socket.sent.len(), 1);
    match &socket.sent[0] {
        Message::Text(text) => {
            let sent: QueryRequest = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(sent, sample_request());
        }
        other => panic!("expected text payload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_frames_after_marker_are_not_read() {
    let mut socket = ScriptedSocket::texts(&["done<EOS>\n", "trailing"]);
    let mut out = Vec::new();

    consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "done");
}

#[tokio::test]
async fn test_interior_marker_is_content() {
    let mut socket = ScriptedSocket::texts(&["a <EOS> b", " c<EOS>"]);
    let mut out = Vec::new();

    consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "a <EOS> b c");
}

#[tokio::test]
async fn test_abnormal_close_reports_code_and_reason() {
    let mut socket = ScriptedSocket::new(vec![
        Ok(Message::Text("partial".into())),
        Ok(Message::Close(Some(CloseFrame {
            code: CloseCode::Abnormal,
            reason: "timeout".into(),
        }))),
    ]);
    let mut out = Vec::new();

    let err = consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap_err();

    match &err {
        Error::AbnormalClose { code, reason } => {
            assert_eq!(*code, 1006);
            assert_eq!(reason, "timeout");
        }
        other => panic!("expected abnormal close, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("1006"));
    assert!(message.contains("timeout"));

    // One payload, no reconnect attempt
    assert_eq!(socket.sent.len(), 1);
    assert_eq!(String::from_utf8(out).unwrap(), "partial");
}

#[tokio::test]
async fn test_stream_end_without_marker_is_incomplete() {
    let mut socket = ScriptedSocket::texts(&["Hel", "lo"]);
    let mut out = Vec::new();

    let err = consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StreamIncomplete));
    assert_eq!(String::from_utf8(out).unwrap(), "Hello");
}

#[tokio::test]
async fn test_read_error_is_surfaced() {
    let mut socket = ScriptedSocket::new(vec![Err(WsError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "pipe closed",
    )))]);
    let mut out = Vec::new();

    let err = consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::WebSocket(WsError::Io(_))));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_missing_pong_fails_the_connection() {
    let mut socket = ScriptedSocket::texts(&["thinking"]).hold_open();
    let mut out = Vec::new();
    let keepalive = Keepalive {
        interval: Duration::from_millis(20),
        timeout: Duration::from_millis(50),
    };

    let err = consume(&mut socket, &payload(), &mut out, keepalive)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::KeepaliveTimeout { .. }));
    assert_eq!(socket.pings_sent(), 1);
    assert_eq!(String::from_utf8(out).unwrap(), "thinking");
}

#[tokio::test]
async fn test_pong_keeps_connection_alive() {
    let mut socket = ScriptedSocket::new(vec![
        Ok(Message::Text("Hel".into())),
        Ok(Message::Pong(Default::default())),
        Ok(Message::Text("lo<EOS>".into())),
    ]);
    let mut out = Vec::new();

    consume(&mut socket, &payload(), &mut out, SLOW_KEEPALIVE)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Hello");
}

#[tokio::test]
async fn test_client_streams_from_real_server() {
    let (ws_url, captured, server) = spawn_ws_server(vec![
        Message::Text("Hel".into()),
        Message::Text("lo wor".into()),
        Message::Text("ld<EOS>".into()),
    ])
    .await;

    let client = StreamClient::new(&ws_url, &StreamConfig::default(), Credentials::new("tok123"));
    let mut out = Vec::new();
    let summary = client.run(&sample_request(), &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Hello world");
    assert_eq!(summary.fragments, 3);

    server.await.unwrap();
    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.uri, "/?access_token=tok123");
    let payload: QueryRequest = serde_json::from_str(&captured.payload.unwrap()).unwrap();
    assert_eq!(payload.session_id, "stream-test");
    assert!(payload.model_params.stream);
}

#[tokio::test]
async fn test_client_reports_server_close_code() {
    let (ws_url, _captured, server) = spawn_ws_server(vec![
        Message::Text("Hel".into()),
        Message::Close(Some(CloseFrame {
            code: CloseCode::Library(4000),
            reason: "quota exceeded".into(),
        })),
    ])
    .await;

    let client = StreamClient::new(&ws_url, &StreamConfig::default(), Credentials::new("tok123"));
    let mut out = Vec::new();
    let err = client.run(&sample_request(), &mut out).await.unwrap_err();

    assert!(matches!(
        err,
        Error::AbnormalClose { code: 4000, ref reason } if reason == "quota exceeded"
    ));
    server.abort();
}

#[tokio::test]
async fn test_connection_refused_is_reported() {
    // Port 1 is never listening for these tests
    let client = StreamClient::new(
        "ws://127.0.0.1:1/",
        &StreamConfig::default(),
        Credentials::new("tok123"),
    );
    let mut out = Vec::new();

    let err = client.run(&sample_request(), &mut out).await.unwrap_err();
    assert!(matches!(err, Error::Connection(ref msg) if msg.contains("WebSocket connection failed")));
    assert!(out.is_empty());
}
