//! Per-connection message loop
//!
//! Runs after a successful join. Each read is one line; every non-empty
//! line becomes a chat event, `!quit` ends the session.

use tokio::io::AsyncRead;
use tracing::debug;

use crate::connection::Connection;
use crate::error::AppError;
use crate::federator::FederatorHandle;
use crate::framer::read_frame;
use crate::message::{chat_line, QUIT_COMMAND};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent `!quit`
    Quit,
    /// Read failed or the peer closed its side
    Disconnected,
}

/// Read lines from `reader` until quit or disconnect
///
/// Always reports a leave to the federator before returning. The `← name`
/// notice is only requested when at least one read succeeded.
pub async fn run_session<R>(
    reader: &mut R,
    connection: &Connection,
    federator: &FederatorHandle,
    max_message_size: usize,
) -> Result<SessionEnd, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut read_once = false;

    let end = loop {
        let line = match read_frame(reader, max_message_size).await {
            Ok(Some(line)) => line,
            Ok(None) => break SessionEnd::Disconnected,
            Err(e) => {
                debug!("Read from '{}' failed: {}", connection.name, e);
                break SessionEnd::Disconnected;
            }
        };
        read_once = true;

        if line.is_empty() {
            continue;
        }

        if line == QUIT_COMMAND {
            break SessionEnd::Quit;
        }

        federator.chat(chat_line(&connection.name, &line)).await?;
    };

    federator
        .leave(connection.id, connection.name.clone(), read_once)
        .await?;

    Ok(end)
}
