//! Gemini `generateContent` client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use super::ChatModel;
use crate::Result;
use crate::config::GeminiConfig;
use crate::conversation::Turn;

/// Prefix of replies that relay an upstream error message
pub const UPSTREAM_ERROR_PREFIX: &str = "Sorry, Gemini API error: ";

/// Reply when the payload has neither text nor an error
pub const EMPTY_REPLY: &str = "No response text found in Gemini output.";

/// Reply when the upstream could not be reached or answered garbage
pub const UNREACHABLE_REPLY: &str = "Error: Could not reach Gemini API.";

/// Normalized shape of a `generateContent` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiReply {
    /// First candidate's first text part
    Text(String),
    /// Upstream error object message
    UpstreamError(String),
    /// Neither a usable candidate nor an error
    Empty,
}

impl GeminiReply {
    /// Classify a decoded response body
    ///
    /// A usable candidate wins over an error object, matching how the
    /// upstream reports partial failures. Fields are looked up one by one so
    /// an unexpected type elsewhere in the payload never hides the text.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty());

        if let Some(text) = text {
            return Self::Text(text.to_string());
        }

        match payload.get("error") {
            None | Some(Value::Null) => Self::Empty,
            Some(error) => Self::UpstreamError(
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            ),
        }
    }

    /// Text shown to the user for this outcome
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::UpstreamError(message) => format!("{UPSTREAM_ERROR_PREFIX}{message}"),
            Self::Empty => EMPTY_REPLY.to_string(),
        }
    }
}

/// Client for the Gemini generative language API
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    system_prompt: String,
    log_payloads: bool,
}

impl GeminiClient {
    /// Create a client from its configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url, config.model
            ),
            api_key: config.api_key,
            system_prompt: config.system_prompt,
            log_payloads: config.log_payloads,
        })
    }

    /// Send the conversation upstream and return the decoded body
    async fn generate(&self, history: &[Turn]) -> Result<Value> {
        let request = GenerateContentRequest {
            system_instruction: Instruction {
                parts: vec![Part {
                    text: &self.system_prompt,
                }],
            },
            contents: history
                .iter()
                .map(|turn| Content {
                    role: turn.role().as_str(),
                    parts: vec![Part { text: turn.text() }],
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if self.log_payloads {
            tracing::info!(%status, payload = %body, "gemini raw response");
        } else {
            tracing::trace!(%status, payload = %body, "gemini raw response");
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn reply(&self, history: &[Turn]) -> String {
        let payload = match self.generate(history).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "error calling Gemini");
                return UNREACHABLE_REPLY.to_string();
            }
        };

        let reply = GeminiReply::from_payload(&payload);
        match &reply {
            GeminiReply::Text(text) => tracing::debug!(len = text.len(), "gemini reply"),
            GeminiReply::UpstreamError(message) => {
                tracing::error!(error = %message, payload = %payload, "Gemini API error");
            }
            GeminiReply::Empty => tracing::warn!(payload = %payload, "no text in Gemini output"),
        }

        reply.into_text()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Instruction<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Instruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
