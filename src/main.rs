//! Line chat server - Entry Point
//!
//! Parses flags, binds the listener and serves until Ctrl-C.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use line_chat::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = Config::parse();
    let listen = config.listen;

    let server = match ChatServer::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Could not listen on {}: {}", listen, e);
            return Err(e.into());
        }
    };
    info!("Listening on {} ...", server.local_addr()?);

    server.run_until_ctrl_c().await;
    Ok(())
}
