//! Username negotiation
//!
//! Prompts a freshly accepted client until it supplies a non-empty name.
//! Write failures are logged and ignored; a failed read counts as an empty
//! submission, unless it means the peer is gone.

use std::io;

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::connection::LineWriter;
use crate::error::AppError;
use crate::framer::read_frame;
use crate::message::{INVALID_USERNAME, USERNAME_PROMPT};

/// Registration state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Waiting for the client to submit a name
    AwaitingName,
    /// A non-empty name was accepted
    Registered(String),
}

impl Registration {
    /// Apply one decoded submission
    ///
    /// Surrounding whitespace is trimmed; an empty result keeps the state
    /// in `AwaitingName`.
    pub fn submit(self, line: &str) -> Self {
        match self {
            Registration::AwaitingName => {
                let name = line.trim();
                if name.is_empty() {
                    Registration::AwaitingName
                } else {
                    Registration::Registered(name.to_string())
                }
            }
            registered => registered,
        }
    }
}

/// Run the handshake and return the chosen name
///
/// Retries are unbounded. Returns `AppError::Disconnected` if the peer
/// closes the socket or resets it before a name arrives.
pub async fn negotiate_username<R>(
    reader: &mut R,
    writer: &LineWriter,
    peer: &str,
    max_username_size: usize,
) -> Result<String, AppError>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Err(e) = writer.send(USERNAME_PROMPT).await {
            warn!("Failed to query for username from {}: {}", peer, e);
        }

        let line = match read_frame(reader, max_username_size).await {
            Ok(Some(line)) => line,
            Ok(None) => return Err(AppError::Disconnected),
            Err(e) if is_disconnect(&e) => {
                debug!("Peer {} went away during registration: {}", peer, e);
                return Err(AppError::Disconnected);
            }
            Err(e) => {
                warn!("Failed to read username from {}: {}", peer, e);
                String::new()
            }
        };

        if let Registration::Registered(name) = Registration::AwaitingName.submit(&line) {
            return Ok(name);
        }

        if let Err(e) = writer.send(INVALID_USERNAME).await {
            warn!("Failed to send retry notice to {}: {}", peer, e);
        }
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}
