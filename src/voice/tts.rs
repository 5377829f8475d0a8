//! Google Translate text-to-speech proxy

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::USER_AGENT;
use url::Url;

use super::{SpeechSynthesizer, SynthesisRequest};
use crate::config::TtsConfig;
use crate::{Error, Result};

/// Fetches MP3 audio from the Translate TTS endpoint
pub struct TranslateTts {
    client: reqwest::Client,
    url: Url,
    user_agent: String,
}

impl TranslateTts {
    /// Create a TTS client from its configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: TtsConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: config.url,
            user_agent: config.user_agent,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for TranslateTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[
                ("ie", "UTF-8"),
                ("q", request.text()),
                ("tl", request.language()),
                ("client", "tw-ob"),
            ])
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                %status,
                reason = status.canonical_reason().unwrap_or_default(),
                "TTS fetch failed"
            );
            return Err(Error::TtsUpstream { status });
        }

        let audio = response.bytes().await?;
        tracing::debug!(
            bytes = audio.len(),
            language = request.language(),
            "synthesized speech"
        );
        Ok(audio)
    }
}
