#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use clap::Parser;
use coi_serve::{cli::Cli, config::Config, server::shutdown_signal, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load and validate configuration first (fail-fast)
    let cli = Cli::parse();
    let config = Config::load(&cli).map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up logging from config
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.level)?)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "coi-serve starting up");

    let server = match Server::bind(&config.server).await {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(error = %err, "could not start server");
            return Err(err.into());
        }
    };

    // Install signal handlers before announcing readiness
    let shutdown = shutdown_signal()?;

    let addr = server.local_addr()?;
    tracing::info!(
        %addr,
        root = %config.server.root.display(),
        "Serving at port {}",
        addr.port()
    );

    server.run_until(shutdown).await?;
    Ok(())
}
