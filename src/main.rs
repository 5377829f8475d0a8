use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rev_relay::{ApiServerBuilder, Config, GeminiClient, TranslateTts};

/// Rev relay - chat and speech relay for the Rev assistant
#[derive(Parser)]
#[command(name = "rev-relay", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static frontend files (overrides `REV_STATIC_DIR`)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every raw Gemini payload at info level
    #[arg(long)]
    log_payloads: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // .env may carry RUST_LOG, so it is read before the filter is built
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to read .env"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log filter used when `RUST_LOG` is not set
const fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info,rev_relay=info",
        1 => "info,rev_relay=debug",
        2 => "debug",
        _ => "trace",
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Must fail before anything binds
    let mut config = Config::load(cli.config.as_deref())?;
    tracing::info!("Gemini API key loaded");

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.static_dir {
        config.server.static_dir = dir;
    }
    if cli.log_payloads {
        config.gemini.log_payloads = true;
    }
    tracing::debug!(?config, "loaded configuration");

    let Config {
        server,
        gemini,
        tts,
    } = config;

    let chat = Arc::new(GeminiClient::new(gemini)?);
    let speech = Arc::new(TranslateTts::new(tts)?);

    ApiServerBuilder::new(chat, speech)
        .port(server.port)
        .static_dir(server.static_dir)
        .build()
        .run()
        .await?;

    Ok(())
}
