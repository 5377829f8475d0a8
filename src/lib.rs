//! Rev relay - chat and speech relay for the Rev assistant
//!
//! This library provides the pieces of the relay server:
//! - Per-connection conversation memory
//! - Gemini chat upstream with response-shape normalization
//! - Translate TTS speech upstream
//! - WebSocket chat, `/tts` proxy and static file serving
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Browser                      │
//! │     WebSocket chat   │   GET /tts   │ assets  │
//! └──────────┬───────────┴──────┬───────┴─────────┘
//!            │                  │
//! ┌──────────▼──────────────────▼─────────────────┐
//! │                  Rev relay                     │
//! │  Conversation per socket  │  TTS proxy         │
//! └──────────┬──────────────────┬─────────────────┘
//!            │                  │
//! ┌──────────▼────────┐  ┌──────▼────────────────┐
//! │  Gemini API       │  │  Translate TTS        │
//! └───────────────────┘  └───────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use conversation::{Conversation, Role, Turn};
pub use error::{Error, Result};
pub use llm::{ChatModel, GeminiClient, GeminiReply};
pub use voice::{SpeechSynthesizer, SynthesisRequest, TranslateTts};
