//! `thinkstrip` entry point - the composition root.
//!
//! Order matters: `.env` is loaded before argument parsing so its values act
//! as environment fallbacks, and logging is up before settings are checked.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use thinkstrip_cli::{Cli, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.debug);

    let settings = cli.into_settings();
    settings.validate().context("invalid proxy settings")?;

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });

    thinkstrip_proxy::serve(listener, settings, cancel).await
}
