//! # wisebot
//!
//! Terminal front-end for the WiseBot assistant: interactive realtime chat,
//! identity inspection and the document-ingestion admin commands.

#![deny(unsafe_code)]

mod admin;
mod chat;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wisebot_client::identity::{FileIdentityStore, IdentityProvider};
use wisebot_settings::WisebotSettings;

/// WiseBot client.
#[derive(Parser, Debug)]
#[command(name = "wisebot", version, about = "WiseBot realtime chat client")]
struct Cli {
    /// Log level filter (overrides settings; `RUST_LOG` wins over both).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Settings file (defaults to `~/.wisebot/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat. `:clear` empties the log, `:quit` exits.
    Chat {
        /// Realtime base URL, e.g. `ws://localhost:8000`.
        #[arg(long)]
        url: Option<String>,

        /// Connect as this identity instead of the stored one.
        #[arg(long)]
        identity: Option<String>,
    },

    /// Print the installation identity.
    Identity {
        /// Replace the stored identity.
        #[arg(long)]
        set: Option<String>,
    },

    /// Document-ingestion commands.
    Admin {
        /// HTTP base URL, e.g. `http://localhost:8000`.
        #[arg(long)]
        url: Option<String>,

        #[command(subcommand)]
        command: admin::AdminCommand,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Arc<WisebotSettings>> {
    match path {
        Some(path) => wisebot_settings::reload_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(wisebot_settings::get_settings()),
    }
}

fn identity_provider(settings: &WisebotSettings) -> IdentityProvider {
    IdentityProvider::new(FileIdentityStore::new(wisebot_settings::identity_path(
        settings,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_ref())?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    wisebot_core::logging::init_subscriber(level);
    tracing::debug!(version = wisebot_core::constants::VERSION, "starting");

    match cli.command {
        Command::Chat { url, identity } => chat::run(&settings, url, identity).await,
        Command::Identity { set } => {
            let provider = identity_provider(&settings);
            let identity = match set {
                Some(raw) => provider
                    .set_identity(&raw)
                    .context("Failed to store identity")?,
                None => provider
                    .get_or_create_identity()
                    .context("Failed to load identity")?,
            };
            println!("{identity}");
            Ok(())
        }
        Command::Admin { url, command } => admin::run(&settings, url, command).await,
    }
}
