//! Speech synthesis upstream
//!
//! The `/tts` endpoint only depends on [`SpeechSynthesizer`]; [`TranslateTts`]
//! proxies the Google Translate speech endpoint.

mod tts;

use async_trait::async_trait;
use axum::body::Bytes;

pub use tts::TranslateTts;

use crate::{Error, Result};

/// Language used when a request names none
pub const DEFAULT_LANGUAGE: &str = "en";

/// Validated text-to-speech request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    text: String,
    language: String,
}

impl SynthesisRequest {
    /// Build a request, defaulting a missing or empty language to English
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `text` is empty
    pub fn new(text: impl Into<String>, language: Option<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidInput("missing text".to_string()));
        }

        let language = language
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(Self { text, language })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Turns text into MP3 audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one request in a single upstream call
    ///
    /// # Errors
    ///
    /// Returns `Error::TtsUpstream` on a non-success upstream status and
    /// `Error::Http` when the upstream cannot be reached or read
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes>;
}
