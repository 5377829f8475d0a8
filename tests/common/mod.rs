//! Shared test utilities

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use rev_relay::config::{DEFAULT_SYSTEM_PROMPT, GeminiConfig, TtsConfig};
use rev_relay::{
    ApiServer, ApiServerBuilder, ChatModel, Error, Result, SpeechSynthesizer, SynthesisRequest,
    Turn,
};
use secrecy::SecretString;
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "gemini-test";

/// Replies with how many turns it was sent and the last user message
#[derive(Default)]
pub struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn reply(&self, history: &[Turn]) -> String {
        let last = history.last().map(Turn::text).unwrap_or_default();
        format!("turns={} last={last}", history.len())
    }
}

/// Outcome a [`FakeSpeech`] produces
#[derive(Clone, Copy)]
pub enum SpeechOutcome {
    Audio,
    UpstreamStatus(u16),
}

/// Speech synthesizer that counts calls and never touches the network
pub struct FakeSpeech {
    outcome: SpeechOutcome,
    calls: AtomicUsize,
}

impl FakeSpeech {
    pub fn new(outcome: SpeechOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub const FAKE_MP3: &[u8] = &[0xFF, 0xFB, 0x90, 0x44];

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _request: &SynthesisRequest) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            SpeechOutcome::Audio => Ok(Bytes::from_static(FAKE_MP3)),
            SpeechOutcome::UpstreamStatus(code) => Err(Error::TtsUpstream {
                status: reqwest::StatusCode::from_u16(code).unwrap(),
            }),
        }
    }
}

/// Gemini configuration pointing at `base_url`
pub fn gemini_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: SecretString::from(TEST_API_KEY.to_string()),
        model: TEST_MODEL.to_string(),
        base_url: base_url.trim_end_matches('/').to_string(),
        system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        log_payloads: true,
        timeout: Some(Duration::from_secs(5)),
    }
}

/// TTS configuration pointing at `url`
pub fn tts_config(url: &str) -> TtsConfig {
    TtsConfig {
        url: url.parse().unwrap(),
        user_agent: rev_relay::config::DEFAULT_TTS_USER_AGENT.to_string(),
        timeout: Some(Duration::from_secs(5)),
    }
}

/// Build a server around the given upstreams
pub fn build_server(
    chat: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    static_dir: PathBuf,
) -> ApiServer {
    ApiServerBuilder::new(chat, speech)
        .static_dir(static_dir)
        .build()
}

/// Serve on an ephemeral local port for the rest of the test
pub async fn spawn_server(server: ApiServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener, std::future::pending()));
    addr
}
