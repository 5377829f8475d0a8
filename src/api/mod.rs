//! HTTP and WebSocket server for the Rev relay

pub mod health;
pub mod tts;
pub mod websocket;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::{DEFAULT_PORT, DEFAULT_STATIC_DIR};
use crate::llm::ChatModel;
use crate::voice::SpeechSynthesizer;

/// Shared state for API handlers
///
/// Holds no per-connection data; each WebSocket owns its own conversation.
#[derive(Clone)]
pub struct ApiState {
    pub chat: Arc<dyn ChatModel>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub static_dir: PathBuf,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    chat: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    port: u16,
    static_dir: PathBuf,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            chat,
            speech,
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }

    /// Set the port to listen on
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the static files directory
    #[must_use]
    pub fn static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                chat: self.chat,
                speech: self.speech,
                static_dir: self.static_dir,
            }),
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build the router with all routes
    ///
    /// Anything not matched by a route is served from the static directory.
    pub fn router(&self) -> Router {
        let static_dir = &self.state.static_dir;
        tracing::debug!(path = %static_dir.display(), "serving static files");

        Router::new()
            .merge(websocket::router(self.state.clone()))
            .merge(tts::router(self.state.clone()))
            .merge(health::router())
            .fallback_service(ServeDir::new(static_dir))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns error if the server fails while running
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "server running at http://{addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
