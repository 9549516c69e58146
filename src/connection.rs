//! Connection definition
//!
//! A registered connection: its identity, display name, and a shared handle
//! to the socket's write side. The read side stays with the session task
//! that owns the socket.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::types::ConnectionId;

/// Boxed write half of a client socket
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared write side of a client socket
///
/// Cloned between the session task (prompts, notices) and the federator
/// (broadcasts). The lock is held for the whole of each `send`, so writes
/// from different tasks never interleave inside a line.
#[derive(Clone)]
pub struct LineWriter {
    inner: Arc<Mutex<BoxedWriter>>,
}

impl LineWriter {
    /// Wrap a socket's write half
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write `text` exactly as given and flush
    pub async fn send(&self, text: &str) -> std::io::Result<()> {
        let mut writer = self.inner.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await
    }

    /// Shut down the write direction
    ///
    /// Errors are ignored: the peer may already be gone.
    pub async fn close(&self) {
        let mut writer = self.inner.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl fmt::Debug for LineWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineWriter").finish_non_exhaustive()
    }
}

/// Registered client connection
///
/// The name is fixed at registration. Clones share the same socket.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Display name chosen at registration
    pub name: String,
    writer: LineWriter,
}

impl Connection {
    /// Create a connection with a fresh ID
    pub fn new(name: impl Into<String>, writer: LineWriter) -> Self {
        Self {
            id: ConnectionId::new(),
            name: name.into(),
            writer,
        }
    }

    /// Write raw text to this connection's socket
    pub async fn send(&self, text: &str) -> std::io::Result<()> {
        self.writer.send(text).await
    }

    /// Shut down this connection's write side
    pub async fn close(&self) {
        self.writer.close().await;
    }
}
