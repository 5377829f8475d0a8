//! Generative language upstream
//!
//! The relay only depends on [`ChatModel`]; [`GeminiClient`] is the
//! production implementation.

mod gemini;

use async_trait::async_trait;

pub use gemini::{
    EMPTY_REPLY, GeminiClient, GeminiReply, UNREACHABLE_REPLY, UPSTREAM_ERROR_PREFIX,
};

use crate::conversation::Turn;

/// Produces the assistant's next turn for a conversation
///
/// Implementations never fail: every upstream problem degrades to a reply
/// string the user can read.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a reply to `history`, which should end with a user turn
    async fn reply(&self, history: &[Turn]) -> String;
}
