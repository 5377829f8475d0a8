//! WebSocket relay tests against a live listener

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use rev_relay::GeminiClient;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{EchoModel, FakeSpeech, SpeechOutcome, build_server, gemini_config, spawn_server};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_echo_relay() -> SocketAddr {
    let dir = tempfile::tempdir().unwrap();
    let server = build_server(
        Arc::new(EchoModel),
        Arc::new(FakeSpeech::new(SpeechOutcome::Audio)),
        dir.path().to_path_buf(),
    );
    spawn_server(server).await
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    client
}

/// Send one message and wait for the relay's reply frame
async fn ask(client: &mut Client, text: &str) -> Value {
    client.send(Message::text(text)).await.unwrap();
    loop {
        let frame = client.next().await.unwrap().unwrap();
        if frame.is_text() {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn replies_are_ai_frames_with_growing_history() {
    let addr = start_echo_relay().await;
    let mut client = connect(addr, "/ws").await;

    // The model sees 2N-1 turns on the Nth message: N user turns, N-1 replies
    for n in 1..=4 {
        let reply = ask(&mut client, &format!("message {n}")).await;
        assert_eq!(reply["type"], "ai");
        assert_eq!(reply["text"], format!("turns={} last=message {n}", 2 * n - 1));
    }
}

#[tokio::test]
async fn root_path_accepts_websocket() {
    let addr = start_echo_relay().await;
    let mut client = connect(addr, "/").await;

    let reply = ask(&mut client, "hello").await;
    assert_eq!(reply, json!({"type": "ai", "text": "turns=1 last=hello"}));
}

#[tokio::test]
async fn binary_frames_are_treated_as_text() {
    let addr = start_echo_relay().await;
    let mut client = connect(addr, "/ws").await;

    client
        .send(Message::binary(b"battery range?".to_vec()))
        .await
        .unwrap();
    let frame = client.next().await.unwrap().unwrap();
    let reply: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(reply["text"], "turns=1 last=battery range?");
}

#[tokio::test]
async fn new_connection_starts_with_empty_history() {
    let addr = start_echo_relay().await;

    let mut first = connect(addr, "/ws").await;
    ask(&mut first, "one").await;
    ask(&mut first, "two").await;
    first.close(None).await.unwrap();

    let mut second = connect(addr, "/ws").await;
    let reply = ask(&mut second, "fresh").await;
    assert_eq!(reply["text"], "turns=1 last=fresh");
}

#[tokio::test]
async fn concurrent_connections_are_independent() {
    let addr = start_echo_relay().await;
    let mut a = connect(addr, "/ws").await;
    let mut b = connect(addr, "/ws").await;

    ask(&mut a, "a1").await;
    ask(&mut a, "a2").await;
    let reply_b = ask(&mut b, "b1").await;
    let reply_a = ask(&mut a, "a3").await;

    assert_eq!(reply_b["text"], "turns=1 last=b1");
    assert_eq!(reply_a["text"], "turns=5 last=a3");
}

#[tokio::test]
async fn upstream_error_reply_keeps_connection_open() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("trigger-error"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .with_priority(1)
        .up_to_n_times(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "The RV400 has a 150 km range."}]}}]
        })))
        .mount(&gemini)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let chat = GeminiClient::new(gemini_config(&format!("{}/v1beta", gemini.uri()))).unwrap();
    let server = build_server(
        Arc::new(chat),
        Arc::new(FakeSpeech::new(SpeechOutcome::Audio)),
        dir.path().to_path_buf(),
    );
    let addr = spawn_server(server).await;
    let mut client = connect(addr, "/ws").await;

    let reply = ask(&mut client, "trigger-error").await;
    assert_eq!(reply["type"], "ai");
    assert!(
        reply["text"]
            .as_str()
            .unwrap()
            .contains("Resource has been exhausted")
    );

    let reply = ask(&mut client, "what is the range?").await;
    assert_eq!(reply["text"], "The RV400 has a 150 km range.");

    // Second request carried both earlier turns plus the new message
    let requests = gemini.received_requests().await.unwrap();
    let body: Value = requests[1].body_json().unwrap();
    assert_eq!(body["contents"].as_array().unwrap().len(), 3);
    assert_eq!(body["contents"][1]["role"], "model");
}
