//! TCP connection handler
//!
//! Drives one accepted socket through registration, the join request and
//! the session loop, then closes it whichever way the session ended.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::Config;
use crate::connection::{Connection, LineWriter};
use crate::error::AppError;
use crate::federator::FederatorHandle;
use crate::registration::negotiate_username;
use crate::session::run_session;

/// Handle a newly accepted TCP connection
pub async fn handle_connection(
    stream: TcpStream,
    federator: FederatorHandle,
    config: &Config,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    info!("Accepted connection from {}", peer_addr);

    let (reader, writer) = stream.into_split();
    let result = serve(reader, writer, &peer_addr, &federator, config).await;

    info!("Routine for {} ended", peer_addr);
    result
}

/// Run the full protocol over an arbitrary byte stream
///
/// Split out from `handle_connection` so the protocol can be driven over
/// in-memory pipes.
pub async fn serve<R, W>(
    mut reader: R,
    writer: W,
    peer: &str,
    federator: &FederatorHandle,
    config: &Config,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let writer = LineWriter::new(writer);

    let name = negotiate_username(&mut reader, &writer, peer, config.max_username_size).await?;
    info!("{} → {}", peer, name);

    let connection = Connection::new(name, writer);
    federator.join(connection.clone()).await?;

    let result = run_session(&mut reader, &connection, federator, config.max_message_size).await;
    connection.close().await;

    let end = result?;
    debug!("Session for '{}' ended: {:?}", connection.name, end);
    Ok(())
}
