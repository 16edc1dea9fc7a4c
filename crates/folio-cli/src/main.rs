//! Folio - command-line client for the portfolio API.
//!
//! Logs in against the API, keeps the credential between runs, and
//! manages the logged-in user's projects.

mod args;
mod commands;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::Cli;
use folio_core::{
    Config, CredentialBackend, CredentialStore, FileCredentialStore, History,
    KeyringCredentialStore, ReqwestTransport, SessionContext,
};

/// Log file name in the cache directory
const LOG_FILE: &str = "folio.log";

/// Keychain account holding the session credential
const KEYRING_ACCOUNT: &str = "session";

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_credentials(config: &Config) -> Arc<dyn CredentialStore> {
    match config.credential_backend {
        CredentialBackend::File => {
            let cache_dir = config.cache_dir().unwrap_or_else(|e| {
                warn!(error = %e, "No cache directory, using ./cache");
                PathBuf::from("./cache")
            });
            Arc::new(FileCredentialStore::open(cache_dir))
        }
        CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new(KEYRING_ACCOUNT)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let command = Cli::parse().command;

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}. Using default configuration.", e);
        Config::default()
    });

    let log_dir = config.cache_dir().ok().filter(|dir| std::fs::create_dir_all(dir).is_ok());
    let log_guard = init_tracing(log_dir.as_deref());
    info!(api_url = %config.api_url, "Folio starting");

    let credentials = open_credentials(&config);
    let transport = Arc::new(ReqwestTransport::new(&config.api_url, config.request_timeout())?);
    let navigator = Arc::new(History::new(config.route_guard().entry_route()));
    let ctx = SessionContext::new(&config, transport, credentials, navigator);

    if let Err(e) = commands::run(&ctx, &mut config, command).await {
        warn!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    drop(log_guard);
    Ok(())
}
