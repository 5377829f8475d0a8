//! Text-to-speech proxy endpoint

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use super::ApiState;
use crate::Error;
use crate::voice::SynthesisRequest;

/// Build TTS router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/tts", get(tts)).with_state(state)
}

/// Query string of `GET /tts`
#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    pub text: Option<String>,
    pub lang: Option<String>,
}

/// Synthesize `text` in `lang` and return MP3 audio
///
/// The client splits long replies; this endpoint makes exactly one upstream
/// call per request.
async fn tts(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<TtsQuery>,
) -> Result<Response, TtsError> {
    let request = SynthesisRequest::new(query.text.unwrap_or_default(), query.lang)?;
    let audio = state.speech.synthesize(&request).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        audio,
    )
        .into_response())
}

/// TTS endpoint errors
#[derive(Debug)]
pub enum TtsError {
    MissingText,
    Upstream,
    Internal,
}

impl From<Error> for TtsError {
    fn from(error: Error) -> Self {
        match error {
            Error::InvalidInput(_) => Self::MissingText,
            Error::TtsUpstream { .. } => Self::Upstream,
            other => {
                tracing::error!(error = %other, "/tts error");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingText => (StatusCode::BAD_REQUEST, "Missing text"),
            Self::Upstream => (StatusCode::BAD_GATEWAY, "TTS upstream error"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "TTS error"),
        };

        (status, message).into_response()
    }
}
