//! TOML configuration file loading
//!
//! Supports `./rev.toml` or `~/.config/rev-relay/config.toml` as a persistent
//! config source. All fields are optional — the file is a partial overlay on
//! top of defaults. The Gemini credential is never read from here.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "rev.toml";

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfigFile {
    /// Listener and static assets
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Generative language upstream
    #[serde(default)]
    pub gemini: GeminiFileConfig,

    /// Speech synthesis upstream
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Settings shared by both upstreams
    #[serde(default)]
    pub upstream: UpstreamFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Directory of static frontend files
    pub static_dir: Option<PathBuf>,
}

/// Gemini configuration
#[derive(Debug, Default, Deserialize)]
pub struct GeminiFileConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// API base URL up to and including the version segment
    pub base_url: Option<String>,

    /// System instruction sent with every request
    pub system_prompt: Option<String>,

    /// Log every raw upstream payload at info level
    pub log_payloads: Option<bool>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    pub url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamFileConfig {
    /// Per-call timeout in seconds, 0 disables it
    pub timeout_secs: Option<u64>,
}

/// Load an explicitly requested config file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_from(path: &Path) -> Result<RelayConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the first config file found in the standard locations
///
/// Returns `RelayConfigFile::default()` if no file exists or it can't be parsed.
pub fn discover() -> RelayConfigFile {
    let Some(path) = candidate_paths().into_iter().find(|p| p.exists()) else {
        return RelayConfigFile::default();
    };

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            RelayConfigFile::default()
        }
    }
}

/// Config file locations in lookup order
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dirs) = directories::BaseDirs::new() {
        paths.push(dirs.config_dir().join("rev-relay").join("config.toml"));
    }
    paths
}
