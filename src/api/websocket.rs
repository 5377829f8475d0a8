//! WebSocket handler for the chat relay
//!
//! Every connection owns one [`Conversation`]. Frames are handled strictly
//! one at a time: the next frame is not read until the reply to the current
//! one has been sent, so the conversation always alternates user/model.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Request, State, WebSocketUpgrade,
        ws::{Message, WebSocket, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::ApiState;
use crate::conversation::Conversation;
use crate::llm::ChatModel;

/// Outgoing WebSocket message to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    /// Assistant reply
    Ai { text: String },
}

/// Build WebSocket router
///
/// Clients may connect on `/` (where plain requests get the web UI) or `/ws`.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(ws_or_index))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

/// Upgrade WebSocket requests on `/`, serve `index.html` otherwise
async fn ws_or_index(
    State(state): State<Arc<ApiState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request,
) -> Response {
    if let Ok(ws) = ws {
        return ws.on_upgrade(move |socket| handle_socket(socket, state));
    }

    let index = state.static_dir.join("index.html");
    let Ok(response) = ServeFile::new(index).oneshot(request).await;
    response.into_response()
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let connection_id = uuid::Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let mut conversation = Conversation::new();

    tracing::info!(%connection_id, "client connected");

    while let Some(frame) = receiver.next().await {
        let message = match frame {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            Ok(Message::Ping(data)) => {
                // axum answers pings itself
                tracing::trace!(len = data.len(), "received ping");
                continue;
            }
            Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                tracing::debug!(%connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "WebSocket read failed");
                break;
            }
        };

        tracing::info!(%connection_id, len = message.len(), "user message");

        let reply = exchange(&mut conversation, state.chat.as_ref(), message).await;

        let Some(frame) = encode(&reply) else {
            continue;
        };
        if sender.send(frame).await.is_err() {
            tracing::debug!(%connection_id, "client gone before reply, dropping it");
            break;
        }
    }

    tracing::info!(
        %connection_id,
        turns = conversation.len(),
        "client disconnected, clearing history"
    );
}

/// Encode an outgoing message as a text frame
fn encode(message: &WsOutgoing) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode WebSocket reply");
            None
        }
    }
}

/// Run one user/model exchange against the conversation
async fn exchange(
    conversation: &mut Conversation,
    chat: &dyn ChatModel,
    message: String,
) -> WsOutgoing {
    conversation.push_user(message);
    let reply = chat.reply(conversation.turns()).await;
    conversation.push_model(reply.clone());
    WsOutgoing::Ai { text: reply }
}
