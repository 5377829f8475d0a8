//! Configuration management for the Rev relay

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::{Error, Result};
use file::RelayConfigFile;

/// Environment variable holding the Gemini credential
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The Translate TTS endpoint rejects requests without a browser user agent
pub const DEFAULT_TTS_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Persona and topic guard for the assistant
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Rev, the official Revolt Motors assistant. \
     Always follow the user's language instructions: if they say 'in Hindi/Telugu/Tamil/…', \
     reply fully in that language. \
     Otherwise reply in the language the question was asked. \
     Only talk about Revolt motorcycles, services, features, or pricing.";

/// Rev relay configuration
#[derive(Debug)]
pub struct Config {
    /// HTTP/WebSocket listener configuration
    pub server: ServerConfig,

    /// Generative language upstream
    pub gemini: GeminiConfig,

    /// Speech synthesis upstream
    pub tts: TtsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: PathBuf,
}

/// Gemini client configuration
#[derive(Debug)]
pub struct GeminiConfig {
    /// API credential, passed as the `key` query parameter
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// Base URL without trailing slash
    pub base_url: String,

    /// System instruction sent with every request
    pub system_prompt: String,

    /// Log raw upstream payloads at info level instead of trace
    pub log_payloads: bool,

    /// Bound on each call; `None` waits for the transport
    pub timeout: Option<Duration>,
}

/// Speech synthesis client configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesis endpoint
    pub url: Url,

    /// `User-Agent` header sent upstream
    pub user_agent: String,

    /// Bound on each call; `None` waits for the transport
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from the process environment and config file
    ///
    /// An explicit `path` must exist and parse; otherwise the standard
    /// locations are searched and failures are only logged.
    ///
    /// # Errors
    ///
    /// Returns error if the Gemini credential is missing or a value is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::load_from(path)?,
            None => file::discover(),
        };

        Self::from_sources(|name| std::env::var(name).ok(), fc)
    }

    /// Build configuration from an environment lookup and a parsed file
    ///
    /// Precedence is env > file > default.
    ///
    /// # Errors
    ///
    /// Returns error if the Gemini credential is missing or a value is invalid
    pub fn from_sources<F>(env: F, fc: RelayConfigFile) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = env(GEMINI_API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{GEMINI_API_KEY_VAR} is not set; add it to the environment or a .env file"
                ))
            })?;

        let server = ServerConfig {
            port: parse_var(&env, "PORT")?
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("REV_STATIC_DIR")
                .map(PathBuf::from)
                .or(fc.server.static_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        };

        let timeout_secs = parse_var(&env, "REV_UPSTREAM_TIMEOUT_SECS")?
            .or(fc.upstream.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let base_url = env("REV_GEMINI_BASE_URL")
            .or(fc.gemini.base_url)
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        validate_url("Gemini base URL", &base_url)?;

        let gemini = GeminiConfig {
            api_key: SecretString::from(api_key),
            model: env("REV_GEMINI_MODEL")
                .or(fc.gemini.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            system_prompt: env("REV_SYSTEM_PROMPT")
                .or(fc.gemini.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            log_payloads: parse_flag(&env, "REV_LOG_PAYLOADS")?
                .or(fc.gemini.log_payloads)
                .unwrap_or(false),
            timeout,
        };

        let tts_url = env("REV_TTS_URL")
            .or(fc.tts.url)
            .unwrap_or_else(|| DEFAULT_TTS_URL.to_string());
        let tts = TtsConfig {
            url: validate_url("TTS URL", &tts_url)?,
            user_agent: env("REV_TTS_USER_AGENT")
                .or(fc.tts.user_agent)
                .unwrap_or_else(|| DEFAULT_TTS_USER_AGENT.to_string()),
            timeout,
        };

        Ok(Self {
            server,
            gemini,
            tts,
        })
    }
}

fn validate_url(what: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::Config(format!("invalid {what} '{raw}': {e}")))
}

fn parse_var<F, T>(env: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {name} '{raw}': {e}")))
        })
        .transpose()
}

fn parse_flag<F>(env: &F, name: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    env(name)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(Error::Config(format!("invalid {name} '{raw}': expected a boolean"))),
        })
        .transpose()
}
