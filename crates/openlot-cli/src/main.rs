//! Terminal front end for the openlot auction and voting services.
//!
//! Reads on-chain state anonymously and signs mutations with a local
//! Ed25519 identity kept in the session file.
//!
//! ## Environment
//!
//! - `DFX_NETWORK`: `local` or `ic` (default `ic`)
//! - `OPENLOT_HOST`: override the replica host
//! - `CANISTER_ID_OPEN_LOT_BACKEND`, `CANISTER_ID_VOTING_SYSTEM_BACKEND`: service ids
//! - `OPENLOT_CONFIG`: TOML file used instead of the variables above
//! - `OPENLOT_SESSION`: session file (default under the user data directory)
//! - `RUST_LOG`: log filter, logs go to stderr

mod board;
mod commands;
mod present;

use anyhow::Context;
use clap::Parser;
use commands::{Command, Output};
use openlot_client::{ClientConfig, FileStore, LocalCredentialStore, Services};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "openlot", version, about = "Auction and voting client")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "OPENLOT_CONFIG")]
    config: Option<PathBuf>,

    /// Session file holding the local identity
    #[arg(long, env = "OPENLOT_SESSION")]
    session: Option<PathBuf>,

    /// Print results as JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("openlot=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Using {} ({:?})", config.host(), config.network);

    let store = match cli.session {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location()?,
    };
    let credentials = Arc::new(LocalCredentialStore::new(store));
    let services = Services::connect(&config, credentials.clone());

    let ok = commands::run(
        cli.command,
        &services,
        credentials.as_ref(),
        Output { json: cli.json },
    )
    .await?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::from_env()?);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}
