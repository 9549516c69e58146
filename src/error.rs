//! Error types for the chat server
//!
//! Defines connection-level errors and join rejections.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::message::{SERVER_FULL, USERNAME_TAKEN};

/// Application-level errors
///
/// Every variant is terminal for the connection it occurred on and for
/// nothing else.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the listener or a client socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The federator task is gone (internal channel broken)
    #[error("Federator closed")]
    FederatorClosed,

    /// The federator refused to admit the connection
    #[error("Join rejected: {0}")]
    Rejected(#[from] JoinRejection),

    /// Peer closed the socket before finishing registration
    #[error("Client disconnected during registration")]
    Disconnected,
}

/// Reasons the federator refuses a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinRejection {
    /// Another member already uses this display name
    #[error("username is already taken")]
    UsernameTaken,

    /// Membership is at the configured maximum
    #[error("server is full")]
    ServerFull,
}

impl JoinRejection {
    /// Line written to the rejected client before its socket is closed
    pub fn notice(self) -> &'static str {
        match self {
            JoinRejection::UsernameTaken => USERNAME_TAKEN,
            JoinRejection::ServerFull => SERVER_FULL,
        }
    }
}
